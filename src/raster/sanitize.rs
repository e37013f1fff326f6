//! Strip anything from an exported SVG that would taint or leak when rasterized.
//!
//! `<style>`, `<script>` and `<foreignObject>` elements are removed with everything inside them,
//! along with any attribute whose decoded value references an `http://` or `https://` resource.
//! The document is parsed with `roxmltree` and the output is the input text with those spans cut
//! out, so everything else passes through byte for byte.

use std::ops::Range;

use crate::foundation::error::{FxError, FxResult};

/// Elements removed with their whole subtree, matched on local name.
const BLOCKED_ELEMENTS: &[&str] = &["style", "script", "foreignObject"];

/// What the sanitizer removed, for logging.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SanitizeReport {
    pub removed_elements: usize,
    pub removed_attributes: usize,
}

/// Sanitized SVG text plus a removal report.
///
/// Malformed XML is an error: nothing downstream could render it either.
pub fn sanitize_svg(input: &str) -> FxResult<(String, SanitizeReport)> {
    let (cuts, report) = plan_cuts(input)?;
    if cuts.is_empty() {
        return Ok((input.to_owned(), report));
    }
    let out = splice(input, cuts);

    // Content expanded from DTD entities has no span of its own in the body, so the result has
    // to come back clean by itself.
    let (left, _) = plan_cuts(&out)?;
    if !left.is_empty() {
        return Err(FxError::validation(
            "svg still carries blocked content after sanitizing",
        ));
    }
    Ok((out, report))
}

/// Sanitized text only.
pub fn sanitize(input: &str) -> FxResult<String> {
    sanitize_svg(input).map(|(out, _)| out)
}

fn parse(input: &str) -> FxResult<roxmltree::Document<'_>> {
    let opts = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    roxmltree::Document::parse_with_options(input, opts)
        .map_err(|e| FxError::validation(format!("malformed svg: {e}")))
}

// Byte spans to remove, in document order.
fn plan_cuts(input: &str) -> FxResult<(Vec<Range<usize>>, SanitizeReport)> {
    let doc = parse(input)?;
    let mut cuts = Vec::new();
    let mut report = SanitizeReport::default();
    let mut removed_until = 0usize;

    for node in doc.descendants().filter(|n| n.is_element()) {
        let span = node.range();
        if span.start < removed_until {
            continue;
        }
        let name = node.tag_name().name();
        if BLOCKED_ELEMENTS.iter().any(|b| b.eq_ignore_ascii_case(name)) {
            report.removed_elements += 1;
            removed_until = span.end;
            cuts.push(span);
            continue;
        }
        // Namespace declarations are not attributes here, so `xmlns` URIs survive.
        for attr in node.attributes() {
            if is_remote_reference(attr.value()) {
                report.removed_attributes += 1;
                cuts.push(with_leading_space(input, attr.range()));
            }
        }
    }
    Ok((cuts, report))
}

fn is_remote_reference(value: &str) -> bool {
    let v = value.to_ascii_lowercase();
    v.contains("http://") || v.contains("https://")
}

fn with_leading_space(input: &str, span: Range<usize>) -> Range<usize> {
    let bytes = input.as_bytes();
    let mut start = span.start;
    while start > 0 && bytes.get(start - 1).is_some_and(u8::is_ascii_whitespace) {
        start -= 1;
    }
    start..span.end
}

fn splice(input: &str, mut cuts: Vec<Range<usize>>) -> String {
    cuts.sort_by_key(|c| c.start);
    let mut out = String::with_capacity(input.len());
    let mut at = 0usize;
    for cut in cuts {
        if cut.start > at {
            out.push_str(input.get(at..cut.start).unwrap_or_default());
        }
        at = at.max(cut.end);
    }
    out.push_str(input.get(at..).unwrap_or_default());
    out
}

#[cfg(test)]
#[path = "../../tests/unit/raster/sanitize.rs"]
mod tests;
