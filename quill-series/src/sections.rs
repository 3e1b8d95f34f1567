//! Section parser for series documents.
//!
//! A well-formed document carries these heading lines, in this order:
//!
//! ```text
//! ### Check-in
//! ## Goals
//! ### Actions
//! ### Tags
//! ```
//!
//! A section body is the trimmed text between its heading line and the next
//! heading line. Anything before `### Check-in` and after `### Tags` is ignored.

use quill_core::types::ChainedFields;
use thiserror::Error;

pub const CHECK_IN: &str = "### Check-in";
pub const GOALS: &str = "## Goals";
pub const ACTIONS: &str = "### Actions";
pub const TAGS: &str = "### Tags";

/// Headings in required document order.
pub const HEADINGS: [&str; 4] = [CHECK_IN, GOALS, ACTIONS, TAGS];

/// An expected heading was not found after the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected heading '{0}' not found in order")]
pub struct MissingHeading(pub &'static str);

/// Byte span of a line: `(start, end_including_newline)`.
fn line_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = 0;
    for line in text.split_inclusive('\n') {
        spans.push((start, start + line.len()));
        start += line.len();
    }
    spans
}

/// Parse the chained fields out of a document body.
pub fn parse_sections(text: &str) -> Result<ChainedFields, MissingHeading> {
    let spans = line_spans(text);

    // (heading line start, body start) per heading, found strictly in order.
    let mut found: Vec<(usize, usize)> = Vec::with_capacity(HEADINGS.len());
    let mut next_line = 0;
    for heading in HEADINGS {
        let idx = (next_line..spans.len())
            .find(|&i| {
                let (s, e) = spans[i];
                text[s..e].trim() == heading
            })
            .ok_or(MissingHeading(heading))?;
        found.push((spans[idx].0, spans[idx].1));
        next_line = idx + 1;
    }

    let body = |i: usize| text[found[i].1..found[i + 1].0].trim().to_string();
    Ok(ChainedFields {
        last_we_spoke: body(0),
        goals: body(1),
        proposed_actions: body(2),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_trimmed_bodies() {
        let doc = "### Check-in\nTalked about X\n\n## Goals\nShip feature Y\n\n### Actions\n- call back\n- send deck\n\n### Tags\n#work\n";
        let fields = parse_sections(doc).unwrap();
        assert_eq!(fields.last_we_spoke, "Talked about X");
        assert_eq!(fields.goals, "Ship feature Y");
        assert_eq!(fields.proposed_actions, "- call back\n- send deck");
    }

    #[test]
    fn preamble_and_crlf_are_tolerated() {
        let doc = "# alice <Monday>\r\n\r\n### Check-in\r\nLunch\r\n## Goals\r\nRun a marathon\r\n### Actions\r\n### Tags\r\n";
        let fields = parse_sections(doc).unwrap();
        assert_eq!(fields.last_we_spoke, "Lunch");
        assert_eq!(fields.goals, "Run a marathon");
        assert_eq!(fields.proposed_actions, "");
    }

    #[test]
    fn missing_goals_is_reported_by_name() {
        let doc = "### Check-in\nTalked about X\n\n### Actions\n-\n\n### Tags\n";
        assert_eq!(parse_sections(doc), Err(MissingHeading(GOALS)));
    }

    #[test]
    fn out_of_order_headings_are_malformed() {
        let doc = "## Goals\nG\n### Check-in\nC\n### Actions\nA\n### Tags\n";
        assert_eq!(parse_sections(doc), Err(MissingHeading(GOALS)));
    }

    #[test]
    fn heading_text_inside_a_line_does_not_count() {
        let doc = "### Check-in\nsee ## Goals below\n## Goals\nG\n### Actions\nA\n### Tags\n";
        let fields = parse_sections(doc).unwrap();
        assert_eq!(fields.last_we_spoke, "see ## Goals below");
        assert_eq!(fields.goals, "G");
    }

    #[test]
    fn empty_document_misses_first_heading() {
        assert_eq!(parse_sections(""), Err(MissingHeading(CHECK_IN)));
    }
}
