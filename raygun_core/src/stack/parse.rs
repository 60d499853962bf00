/**
 * Parses raw textual stack dumps into `StackFrame`s.
 *
 * Expected layout (tolerated, not assumed clean):
 *
 * ```text
 *  1: goroutine 1 [running]:                       <-- header, ignored
 *  2: path/to/package.functionName(args)
 *  3: \t[drive:]path/to/file.ext:lineNumber +0xdeadbeef   <-- offset optional
 *  ... repeat 2 + 3 for each frame
 * ```
 *
 * Blank lines may appear anywhere; they are skipped without consuming a
 * slot, so symbol/location pairing is computed over non-blank lines only.
 */
use crate::protocol::types::StackFrame;

/**
 * Parses `trace` into frames, preserving the dump's order (innermost
 * call first).
 *
 * Never fails: unparsable line numbers become `0`, a symbol without a
 * package qualifier yields an empty `package_name`, and a trailing symbol
 * line without its location line is dropped.
 */
pub fn parse(trace: &str) -> Vec<StackFrame> {
    let mut frames = Vec::new();
    let mut pending: Option<(String, String)> = None;

    for line in trace.lines().skip(1) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match pending.take() {
            None => pending = Some(split_symbol(line)),
            Some((package_name, method_name)) => {
                let (file_name, line_number) = split_location(line);
                frames.push(StackFrame {
                    line_number,
                    package_name,
                    file_name,
                    method_name,
                });
            }
        }
    }

    frames
}

/**
 * Splits a symbol line into `(package_name, method_name)`.
 *
 * `github.com/foo/bar.(*T).Run(0x1)` becomes
 * `("github.com/foo/bar", "(*T).Run(0x1)")`; a line without any `.`
 * after the last `/` is all method name.
 */
fn split_symbol(line: &str) -> (String, String) {
    let (module_path, rest) = split_at_last_slash(line);

    match rest.split_once('.') {
        Some((package, method)) if module_path.is_empty() => {
            (package.to_string(), method.to_string())
        }
        Some((package, method)) => (format!("{module_path}/{package}"), method.to_string()),
        None => (String::new(), rest.to_string()),
    }
}

/**
 * Splits a location line into `(file_name, line_number)`, dropping the
 * directory and any ` +0xOFFSET` suffix.
 */
fn split_location(line: &str) -> (String, u32) {
    let (_, file_and_line) = split_at_last_slash(line);
    let file_and_line = strip_offset_suffix(file_and_line);

    let mut parts = file_and_line.split(':');
    let file_name = parts.next().unwrap_or_default().to_string();
    let line_number = parts
        .next()
        .and_then(|number| number.parse::<u32>().ok())
        .unwrap_or(0);

    (file_name, line_number)
}

fn split_at_last_slash(line: &str) -> (&str, &str) {
    line.rsplit_once('/').unwrap_or(("", line))
}

/// Cuts off everything after the last space, if there is one.
fn strip_offset_suffix(line: &str) -> &str {
    match line.rsplit_once(' ') {
        Some((head, _)) => head,
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TRACE: &str = "goroutine 1 [running]:
main.func·001()
\t/home/user/worker_test.go:13 +0x3f
github.com/smartystreets/goconvey/convey.(*action).Invoke(0x208304420)
\t/home/user/go/src/github.com/smartystreets/goconvey/convey/registration.go:44 +0x2d
github.com/smartystreets/goconvey/convey.(*context).conveyInner(0x2082e4f00, 0x0, 0x0)
\t/home/user/go/src/github.com/smartystreets/goconvey/convey/context.go:201 +0x1a4
testing.tRunner(0x208300120, 0x2d8f00)
\t/usr/local/go/src/testing/testing.go:447 +0xbf
runtime.goexit()
\t/usr/local/go/src/runtime/asm_amd64.s:2232 +0x1
";

    #[test]
    fn test_split_at_last_slash() {
        assert_eq!(split_at_last_slash("foo/bar/baz"), ("foo/bar", "baz"));
        assert_eq!(split_at_last_slash("baz"), ("", "baz"));
    }

    #[test]
    fn test_strip_offset_suffix() {
        assert_eq!(strip_offset_suffix("foo:bar baz"), "foo:bar");
        assert_eq!(strip_offset_suffix("foo:bar"), "foo:bar");
    }

    #[test]
    fn test_parse_full_trace() {
        let frames = parse(TRACE);

        assert_eq!(frames.len(), 5);
        assert_eq!(
            frames[0],
            StackFrame::new(13, "main", "worker_test.go", "func·001()")
        );
        assert_eq!(
            frames[1],
            StackFrame::new(
                44,
                "github.com/smartystreets/goconvey/convey",
                "registration.go",
                "(*action).Invoke(0x208304420)",
            )
        );
        assert_eq!(frames[4].method_name, "goexit()");
        assert_eq!(frames[4].file_name, "asm_amd64.s");
    }

    #[test]
    fn test_parse_single_frame_example() {
        let frames = parse("goroutine 1 [running]:\nmain.foo()\n\t/home/u/main.go:42 +0x1\n");

        assert_eq!(frames, vec![StackFrame::new(42, "main", "main.go", "foo()")]);
    }

    #[test]
    fn test_parse_symbol_without_package() {
        let trace = "goroutine 1 [running]:\npanic(0x662440, 0x716bf0)\n\tC:/Go/src/runtime/panic.go:522 +0x1b\n";
        let frames = parse(trace);

        assert_eq!(
            frames,
            vec![StackFrame::new(522, "", "panic.go", "panic(0x662440, 0x716bf0)")]
        );
    }

    #[test]
    fn test_parse_location_without_memory_offset() {
        let trace = "goroutine 1 [running]:\nmain.func·001()\n\t/home/user/worker_test.go:13\n";
        let frames = parse(trace);

        assert_eq!(
            frames,
            vec![StackFrame::new(13, "main", "worker_test.go", "func·001()")]
        );
    }

    #[test]
    fn test_parse_location_without_line_number() {
        let trace = "goroutine 1 [running]:\nmain.foo()\n\t/home/u/main.go +0x1\n";
        let frames = parse(trace);

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].file_name, "main.go");
        assert_eq!(frames[0].line_number, 0);
    }

    #[test]
    fn test_parse_unparsable_line_number_defaults_to_zero() {
        let frames = parse("header\nmain.foo()\n\t/a/main.go:abc\n");
        assert_eq!(frames[0].line_number, 0);
    }

    #[test]
    fn test_parse_skips_blank_lines_without_breaking_pairs() {
        let trace = "goroutine 1 [running]:\n\nmain.foo()\n\n\t/a/main.go:1\n   \nmain.bar()\n\t/a/main.go:2\n\n\n";
        let frames = parse(trace);

        assert_eq!(
            frames,
            vec![
                StackFrame::new(1, "main", "main.go", "foo()"),
                StackFrame::new(2, "main", "main.go", "bar()"),
            ]
        );
    }

    #[test]
    fn test_parse_nested_method_keeps_remaining_dots() {
        let frames = parse("header\nexample.com/pkg.Type.method.func1()\n\t/src/pkg/file.go:7\n");

        assert_eq!(frames[0].package_name, "example.com/pkg");
        assert_eq!(frames[0].method_name, "Type.method.func1()");
    }

    #[test]
    fn test_parse_header_only_or_empty() {
        assert!(parse("").is_empty());
        assert!(parse("goroutine 1 [running]:\n").is_empty());
    }

    #[test]
    fn test_parse_drops_dangling_symbol_line() {
        let frames = parse("header\nmain.foo()\n\t/a/main.go:1\nmain.bar()\n");
        assert_eq!(frames.len(), 1);
    }

    proptest! {
        #[test]
        fn prop_parse_yields_one_frame_per_pair(
            frames in proptest::collection::vec(
                ("[a-z]{1,8}", "[a-z]{1,8}", "[a-z]{1,8}", 0u32..100_000, any::<bool>()),
                0..20,
            )
        ) {
            let mut trace = String::from("goroutine 7 [running]:\n");
            for (package, method, file, line, blank) in &frames {
                trace.push_str(&format!("{package}.{method}()\n"));
                if *blank {
                    trace.push('\n');
                }
                trace.push_str(&format!("\t/src/{file}.go:{line} +0x1f\n"));
            }

            let parsed = parse(&trace);

            prop_assert_eq!(parsed.len(), frames.len());
            for (frame, (package, method, file, line, _)) in parsed.iter().zip(&frames) {
                prop_assert_eq!(&frame.package_name, package);
                prop_assert_eq!(&frame.method_name, &format!("{method}()"));
                prop_assert_eq!(&frame.file_name, &format!("{file}.go"));
                prop_assert_eq!(frame.line_number, *line);
            }
        }
    }
}
