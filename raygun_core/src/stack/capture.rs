/**
 * Captures the calling thread's stack.
 *
 * The `backtrace` crate gives us resolved symbols; we render them into
 * the same textual dump format `parse` understands and feed that back
 * through the parser, so captured and externally supplied traces take
 * exactly the same path:
 *
 * ```text
 * thread 'main' [running]:
 * my_app::handlers.process()
 * \t/home/me/my_app/src/handlers.rs:42
 * ```
 *
 * Only the current thread is captured, never the whole process.
 */
use std::fmt::Write as _;

use backtrace::Backtrace;

use super::parse::parse;
use crate::protocol::types::StackFrame;

/// Number of entries `capture_current` callers typically discard to hide
/// their own helper frames (render, capture, and the wrapper around it).
pub const DEFAULT_SKIP_FRAMES: usize = 3;

/// Qualified-name prefixes of frames that belong to this library or to
/// the Rust panic/runtime machinery rather than to user code.
const INTERNAL_PREFIXES: &[&str] = &[
    "raygun_core::",
    "<raygun_core::",
    "raygun_panic::",
    "<raygun_panic::",
    "backtrace::",
    "<backtrace::",
    "std::",
    "<std::",
    "core::",
    "<core::",
    "alloc::",
    "<alloc::",
    "panic_unwind::",
    "rust_begin_unwind",
    "rust_panic",
    "__rust",
];

/**
 * Renders the current thread's stack as a raw textual dump.
 *
 * Frames of the `backtrace` crate itself are left out, so the first
 * frame is this function.
 */
pub fn render_current() -> String {
    render(&Backtrace::new())
}

/**
 * Captures the current thread's stack and discards the first
 * `skip_frames` entries.
 */
pub fn capture_current(skip_frames: usize) -> Vec<StackFrame> {
    parse(&render_current())
        .into_iter()
        .skip(skip_frames)
        .collect()
}

/**
 * Captures the current stack with every leading library and runtime
 * frame removed, so user code is the first frame shown.
 *
 * Frame counts shift with inlining, so the leading frames are matched by
 * module path instead of being skipped by number. When nothing but
 * internal frames is left the unfiltered stack is returned.
 */
pub fn capture_user_stack() -> Vec<StackFrame> {
    trim_internal_frames(capture_current(0))
}

/// Removes the leading frames for which `is_internal_frame` holds.
pub fn trim_internal_frames(frames: Vec<StackFrame>) -> Vec<StackFrame> {
    match frames.iter().position(|frame| !is_internal_frame(frame)) {
        Some(first_user_frame) => frames.into_iter().skip(first_user_frame).collect(),
        None => frames,
    }
}

/// Whether `frame` belongs to this library or the Rust runtime.
pub fn is_internal_frame(frame: &StackFrame) -> bool {
    let qualified = if frame.package_name.is_empty() {
        frame.method_name.clone()
    } else {
        format!("{}::{}", frame.package_name, frame.method_name)
    };

    INTERNAL_PREFIXES
        .iter()
        .any(|prefix| qualified.starts_with(prefix))
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render(backtrace: &Backtrace) -> String {
    let thread = std::thread::current();
    let mut dump = format!("thread '{}' [running]:\n", thread.name().unwrap_or("<unnamed>"));

    for frame in backtrace.frames() {
        for symbol in frame.symbols() {
            /*
             * `{:#}` drops the trailing hash of legacy-mangled names.
             */
            let name = symbol.name().map(|name| format!("{name:#}"));
            let file = symbol
                .filename()
                .map(|path| path.display().to_string().replace('\\', "/"));

            if name.is_none() && file.is_none() {
                continue;
            }

            let name = name.unwrap_or_else(|| "<unknown>".to_string());
            if name.starts_with("backtrace::") || name.starts_with("<backtrace::") {
                continue;
            }

            let _ = writeln!(dump, "{}", symbol_line(&name));
            let _ = writeln!(dump, "{}", location_line(file.as_deref(), symbol.lineno()));
        }
    }

    dump
}

/// An empty or missing path renders as `<unknown>` so the line never
/// reads as blank and the symbol/location pairing stays aligned.
fn location_line(file: Option<&str>, line: Option<u32>) -> String {
    let file = file.filter(|file| !file.is_empty()).unwrap_or("<unknown>");
    match line {
        Some(line) => format!("\t{file}:{line}"),
        None => format!("\t{file}"),
    }
}

/**
 * `my_app::handlers::process` renders as `my_app::handlers.process()`:
 * the module path becomes the package and the last path segment the
 * method. Segments inside generic brackets are not split, and a
 * trailing turbofish (`do_call::<F, R>`) stays with the function.
 */
fn symbol_line(name: &str) -> String {
    match split_last_segment(name) {
        Some((module, function)) => format!("{module}.{function}()"),
        None => format!("{name}()"),
    }
}

fn split_last_segment(name: &str) -> Option<(&str, &str)> {
    let bytes = name.as_bytes();
    let mut depth = 0usize;
    let mut split = None;

    for (index, byte) in bytes.iter().enumerate() {
        match byte {
            b'<' => depth += 1,
            // `->` in `fn() -> T` is not a closing bracket
            b'>' if index > 0 && bytes[index - 1] == b'-' => {}
            b'>' => depth = depth.saturating_sub(1),
            b':' if depth == 0
                && bytes.get(index + 1) == Some(&b':')
                && bytes.get(index + 2) != Some(&b'<') =>
            {
                split = Some(index)
            }
            _ => {}
        }
    }

    split.map(|index| (&name[..index], &name[index + 2..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_line_splits_module_path() {
        assert_eq!(
            symbol_line("my_app::handlers::process"),
            "my_app::handlers.process()"
        );
        assert_eq!(symbol_line("main"), "main()");
    }

    #[test]
    fn test_symbol_line_ignores_separators_inside_generics() {
        assert_eq!(
            symbol_line("core::ptr::drop_in_place<alloc::vec::Vec<u8>>"),
            "core::ptr.drop_in_place<alloc::vec::Vec<u8>>()"
        );
        assert_eq!(
            symbol_line("<my_app::Foo as core::fmt::Display>::fmt"),
            "<my_app::Foo as core::fmt::Display>.fmt()"
        );
    }

    #[test]
    fn test_symbol_line_keeps_turbofish_with_function() {
        assert_eq!(
            symbol_line(
                "std::panicking::catch_unwind::do_call::<core::panic::unwind_safe::AssertUnwindSafe<F>, R>"
            ),
            "std::panicking::catch_unwind.do_call::<core::panic::unwind_safe::AssertUnwindSafe<F>, R>()"
        );
    }

    #[test]
    fn test_symbol_line_ignores_fn_pointer_arrows() {
        let name = "test::__rust_begin_short_backtrace::<core::result::Result<(), alloc::string::String>, fn() -> core::result::Result<(), alloc::string::String>>";

        assert_eq!(
            symbol_line(name),
            "test.__rust_begin_short_backtrace::<core::result::Result<(), alloc::string::String>, fn() -> core::result::Result<(), alloc::string::String>>()"
        );
        assert_eq!(
            symbol_line("my_app::run::<fn() -> u8>::{closure#0}"),
            "my_app::run::<fn() -> u8>.{closure#0}()"
        );
    }

    #[test]
    fn test_location_line_never_blank() {
        assert_eq!(location_line(Some(""), None), "\t<unknown>");
        assert_eq!(location_line(None, Some(7)), "\t<unknown>:7");
        assert_eq!(location_line(Some("/src/main.rs"), Some(3)), "\t/src/main.rs:3");
    }

    #[test]
    fn test_empty_location_keeps_pairs_aligned() {
        let dump = format!(
            "thread 'main' [running]:\n{}\n{}\n{}\n{}\n",
            symbol_line("my_app::ffi::callback"),
            location_line(Some(""), None),
            symbol_line("my_app::main"),
            location_line(Some("/app/src/main.rs"), Some(9)),
        );

        assert_eq!(
            parse(&dump),
            vec![
                StackFrame::new(0, "my_app::ffi", "<unknown>", "callback()"),
                StackFrame::new(9, "my_app", "main.rs", "main()"),
            ]
        );
    }

    #[test]
    fn test_rendered_symbol_round_trips_through_parser() {
        let dump = format!(
            "thread 'main' [running]:\n{}\n\t/home/me/app/src/handlers.rs:42\n",
            symbol_line("my_app::handlers::process")
        );

        assert_eq!(
            parse(&dump),
            vec![StackFrame::new(42, "my_app::handlers", "handlers.rs", "process()")]
        );
    }

    #[test]
    fn test_render_current_has_header_and_pairs() {
        let dump = render_current();
        let mut lines = dump.lines();

        assert!(lines.next().is_some_and(|header| header.starts_with("thread '")));
        assert!(!dump
            .lines()
            .any(|line| line.starts_with("backtrace::") || line.starts_with("<backtrace::")));
        assert_eq!((dump.lines().count() - 1) % 2, 0);
    }

    #[test]
    fn test_capture_current_skips_frames() {
        let all = capture_current(0);
        let skipped = capture_current(DEFAULT_SKIP_FRAMES);

        /*
         * Frame sets depend on debug info and inlining; only the count
         * relationship is stable.
         */
        assert_eq!(skipped.len(), all.len().saturating_sub(DEFAULT_SKIP_FRAMES));
    }

    #[test]
    fn test_trim_internal_frames_keeps_user_code_first() {
        let frames = vec![
            StackFrame::new(10, "raygun_core::stack::capture", "capture.rs", "render_current()"),
            StackFrame::new(20, "std::panicking", "panicking.rs", "begin_panic_handler()"),
            StackFrame::new(0, "", "<unknown>", "rust_begin_unwind()"),
            StackFrame::new(30, "core::panicking", "panicking.rs", "panic_fmt()"),
            StackFrame::new(5, "my_app", "main.rs", "run()"),
            StackFrame::new(9, "std::rt", "rt.rs", "lang_start()"),
        ];

        let trimmed = trim_internal_frames(frames);

        assert_eq!(trimmed.len(), 2);
        assert_eq!(trimmed[0].package_name, "my_app");
        assert_eq!(trimmed[1].package_name, "std::rt");
    }

    #[test]
    fn test_trim_internal_frames_keeps_everything_when_all_internal() {
        let frames = vec![StackFrame::new(1, "std::rt", "rt.rs", "lang_start()")];
        assert_eq!(trim_internal_frames(frames.clone()), frames);
    }

    #[test]
    fn test_is_internal_frame() {
        assert!(is_internal_frame(&StackFrame::new(0, "raygun_panic", "lib.rs", "install()")));
        assert!(is_internal_frame(&StackFrame::new(0, "", "x", "__rustc::rust_begin_unwind()")));
        assert!(is_internal_frame(&StackFrame::new(
            0,
            "<alloc::boxed::Box<F,A> as core::ops::function::Fn<Args>>",
            "boxed.rs",
            "call()",
        )));
        assert!(!is_internal_frame(&StackFrame::new(0, "my_app::db", "db.rs", "query()")));
    }
}
