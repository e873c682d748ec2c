//! Ariadne-based rendering of type errors.
//!
//! Type queries do not know where in the source they were asked from, so the
//! caller passes the span of the offending expression. Output is colorless so
//! it can be snapshotted.

use std::ops::Range;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use tsol_common::Span;

use crate::error::TypeError;

// ── Help Text ──────────────────────────────────────────────────────────

fn help(error: &TypeError) -> Option<String> {
    match error {
        TypeError::Operator { .. } => {
            Some("convert one operand explicitly so both sides share a type".to_string())
        }
        TypeError::Literal { .. } => {
            Some("use an explicit conversion or a wider target type".to_string())
        }
        TypeError::Precision { bits } => Some(format!(
            "split the constant so intermediate values stay within {} bits",
            bits
        )),
        TypeError::Interface { .. } => None,
        TypeError::Encoding { .. } => Some("pass the value as a TvmCell instead".to_string()),
    }
}

fn label(error: &TypeError) -> &'static str {
    match error {
        TypeError::Operator { .. } => "operator not applicable here",
        TypeError::Literal { .. } => "literal does not fit",
        TypeError::Precision { .. } => "constant too large",
        TypeError::Interface { .. } => "not allowed in an external signature",
        TypeError::Encoding { .. } => "cannot be encoded",
    }
}

// ── Rendering ──────────────────────────────────────────────────────────

/// Clamp `span` into `source` and make it at least one byte wide when the
/// source allows it.
fn clamp(span: Span, source_len: usize) -> Range<usize> {
    let start = (span.start as usize).min(source_len);
    let end = (span.end as usize).min(source_len).max(start);
    if start == end {
        start..(end + 1).min(source_len)
    } else {
        start..end
    }
}

/// Render `error` against `source`, pointing at `span`.
pub fn render_type_error(error: &TypeError, source: &str, span: Span) -> String {
    let config = Config::default().with_color(false);
    let range = clamp(span, source.len());

    let mut builder = Report::build(ReportKind::Error, range.clone())
        .with_code(error.code())
        .with_message(error.to_string())
        .with_config(config)
        .with_label(
            Label::new(range)
                .with_message(label(error))
                .with_color(Color::Red),
        );
    if let Some(help) = help(error) {
        builder.set_help(help);
    }
    let report = builder.finish();

    let mut buf = Vec::new();
    if report.write(Source::from(source), &mut buf).is_err() {
        return format!("error[{}]: {}", error.code(), error);
    }
    String::from_utf8_lossy(&buf).into_owned()
}
