/**
 * Minimal harness for the Raygun Rust client.
 *
 * Set RAYGUN_API_KEY to a real key from your Raygun application settings
 * (or pass --silent to only print the payloads), then run:
 *
 *   cargo run -p raygun_demo -- --silent         # print, never send
 *   cargo run -p raygun_demo -- --panic          # recover from a panic
 *   cargo run -p raygun_demo -- --async          # fire-and-forget delivery
 *
 * Log output is controlled with RUST_LOG, e.g. `RUST_LOG=raygun_core=debug`.
 */
use std::collections::BTreeMap;
use std::time::Duration;

use raygun::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let silent = args.iter().any(|a| a == "--silent");
    let test_panic = args.iter().any(|a| a == "--panic");
    let asynchronous = args.iter().any(|a| a == "--async");

    let api_key = std::env::var("RAYGUN_API_KEY").unwrap_or_else(|_| "PASTE_YOUR_API_KEY_HERE".into());

    let mut client = match Client::new("raygun-demo", &api_key) {
        Ok(client) => client,
        Err(err) => {
            eprintln!("[demo] {err}");
            return;
        }
    };

    client
        .silent(silent)
        .asynchronous(asynchronous)
        .log_verbose(true)
        .version(env!("CARGO_PKG_VERSION"))
        .tags(["demo"])
        .user("demo-user")
        .custom_data(&demo_data());

    /*
     * Report a synthesized error.
     */
    match client.create_error("Hello from the Raygun Rust client!") {
        Ok(()) => println!("[demo] Sent a synthesized error"),
        Err(err) => println!("[demo] Delivery failed: {err}"),
    }

    /*
     * Report a real error (file not found).
     */
    if let Err(e) = std::fs::read_to_string("/nonexistent/path.txt") {
        match client.send_error(&e) {
            Ok(()) => println!("[demo] Sent an io::Error: {e}"),
            Err(err) => println!("[demo] Delivery failed: {err}"),
        }
    }

    /*
     * Recover from a panic if requested. The process keeps running.
     */
    if test_panic {
        println!("[demo] Triggering a panic...");
        let outcome = client.handle_error(|| -> u32 { panic!("Test panic from the Raygun demo") });
        if let Err(recovered) = outcome {
            println!("[demo] Recovered: {} (delivery: {:?})", recovered.message, recovered.delivery);
        }
    }

    /*
     * Asynchronous submissions run on detached threads; give them a moment
     * before the process exits.
     */
    if asynchronous && !silent {
        std::thread::sleep(Duration::from_secs(2));
    }

    println!("[demo] Done.");
}

fn demo_data() -> BTreeMap<&'static str, &'static str> {
    BTreeMap::from([("source", "demo"), ("mode", "basic")])
}
