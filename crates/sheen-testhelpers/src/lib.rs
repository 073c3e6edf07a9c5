//! Test utilities shared by the sheen crates.
//!
//! Error positions are asserted with annotated sources: a line made of
//! carets and a name marks the span of an expected error on the source line
//! above it.
//!
//! ```text
//! a { color: }
//!            ^ MissingValue
//! ```

use std::ops::Range;
use std::sync::Once;

use similar::{ChangeTag, TextDiff};

/// Install a `tracing` subscriber that honours `RUST_LOG`, once per process.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// An error reported by the code under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActualError {
    pub span: Range<usize>,
    pub kind: String,
}

/// An error expected by an annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ExpectedError {
    span: Range<usize>,
    kind: String,
}

/// Parse an annotation line: leading spaces, a caret run, a space, a name.
fn annotation(line: &str) -> Option<(Range<usize>, &str)> {
    let body = line.trim_end_matches(['\n', '\r']);
    let start = body.find('^')?;
    if !body[..start].chars().all(|c| c == ' ') {
        return None;
    }
    let carets = body[start..].chars().take_while(|&c| c == '^').count();
    let name = body[start + carets..].strip_prefix(' ')?.trim();
    if name.is_empty() || name.contains(' ') {
        return None;
    }
    Some((start..start + carets, name))
}

/// The source with every annotation line removed.
pub fn source_without_annotations(annotated: &str) -> String {
    annotated
        .split_inclusive('\n')
        .filter(|line| annotation(line).is_none())
        .collect()
}

fn expected_errors(annotated: &str) -> Vec<ExpectedError> {
    let mut expected = Vec::new();
    let mut offset = 0;
    let mut line_start = 0;
    for line in annotated.split_inclusive('\n') {
        match annotation(line) {
            Some((columns, name)) => expected.push(ExpectedError {
                span: line_start + columns.start..line_start + columns.end,
                kind: name.to_string(),
            }),
            None => {
                line_start = offset;
                offset += line.len();
            }
        }
    }
    expected
}

/// Assert that `actual` contains exactly the errors annotated in
/// `annotated`, by start offset and kind.
///
/// Only the start of each span is compared: a single caret marks where an
/// error points, a longer run marks the text it covers.
pub fn assert_annotated_errors(annotated: &str, actual: Vec<ActualError>) {
    let mut expected: Vec<(usize, String)> = expected_errors(annotated)
        .into_iter()
        .map(|e| (e.span.start, e.kind))
        .collect();
    let mut actual: Vec<(usize, String)> =
        actual.into_iter().map(|e| (e.span.start, e.kind)).collect();
    expected.sort();
    actual.sort();
    if expected != actual {
        let source = source_without_annotations(annotated);
        panic!(
            "errors do not match\nsource:\n{source}\nexpected: {expected:?}\nactual:   {actual:?}"
        );
    }
}

/// Assert that regenerated text equals the original byte for byte,
/// printing a line diff when it does not.
#[track_caller]
pub fn assert_round_trip(original: &str, regenerated: &str) {
    if original == regenerated {
        return;
    }
    let mut report = String::new();
    let diff = TextDiff::from_lines(original, regenerated);
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => "-",
            ChangeTag::Insert => "+",
            ChangeTag::Equal => " ",
        };
        report.push_str(&format!("{sign}{change}"));
    }
    panic!("round trip changed the text (- original, + regenerated):\n{report}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotations_are_removed() {
        let annotated = "\na { color: }\n           ^ MissingValue\n";
        assert_eq!(source_without_annotations(annotated), "\na { color: }\n");
    }

    #[test]
    fn test_annotation_offsets() {
        let annotated = "\na b\n  ^ UnknownWord\n}\n^ UnexpectedClose\n";
        assert_annotated_errors(
            annotated,
            vec![
                ActualError {
                    span: 5..7,
                    kind: "UnexpectedClose".into(),
                },
                ActualError {
                    span: 3..4,
                    kind: "UnknownWord".into(),
                },
            ],
        );
    }

    #[test]
    #[should_panic(expected = "round trip changed the text")]
    fn test_round_trip_mismatch_panics() {
        assert_round_trip("a {}\n", "a{}\n");
    }
}
