//! Splitting a model reply into headed sections.
//!
//! A heading is a line matching one of [`SECTION_HEADINGS`] or any line
//! ending in `:`, after markdown decoration (`#`, `**`, bullets, `1.`) is
//! stripped. Text before the first heading becomes an untitled section.

use serde::Serialize;

use crate::prompt::SECTION_HEADINGS;

/// One headed block of an insight reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightSection {
    /// Section heading, `None` for a preamble before the first heading.
    pub heading: Option<String>,
    /// Section text with surrounding blank lines removed.
    pub body: String,
}

/// Splits `text` into sections.
#[must_use]
pub fn split_sections(text: &str) -> Vec<InsightSection> {
    let mut sections = Vec::new();
    let mut heading: Option<String> = None;
    let mut body: Vec<&str> = Vec::new();

    for line in text.lines() {
        if let Some(next) = parse_heading(line) {
            push_section(&mut sections, heading.take(), &body);
            body.clear();
            heading = Some(next);
        } else {
            body.push(line);
        }
    }
    push_section(&mut sections, heading, &body);

    sections
}

fn push_section(sections: &mut Vec<InsightSection>, heading: Option<String>, body: &[&str]) {
    let body = body.join("\n").trim().to_string();
    if heading.is_none() && body.is_empty() {
        return;
    }
    sections.push(InsightSection { heading, body });
}

/// Returns the heading text if `line` is a heading line.
fn parse_heading(line: &str) -> Option<String> {
    let cleaned = strip_decoration(line);
    if cleaned.is_empty() {
        return None;
    }

    if let Some(known) = SECTION_HEADINGS
        .iter()
        .find(|h| h.eq_ignore_ascii_case(cleaned.trim_end_matches(':').trim_end()))
    {
        return Some((*known).to_string());
    }

    let stripped = cleaned.strip_suffix(':')?.trim_end();
    if stripped.is_empty() {
        None
    } else {
        Some(stripped.to_string())
    }
}

/// Removes markdown heading, emphasis, bullet and numbering decoration.
fn strip_decoration(line: &str) -> &str {
    let s = line
        .trim()
        .trim_start_matches(['#', '-', '*', '_', ' '])
        .trim_end_matches(['*', '_', ' ']);

    let without_number = s
        .find(|c: char| !c.is_ascii_digit())
        .filter(|&i| i > 0)
        .and_then(|i| s[i..].strip_prefix(['.', ')']))
        .unwrap_or(s);

    without_number.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_fixed_headings() {
        let text = "Overall store density\nDense.\n\nCluster highlights\nCluster 1.\nCluster 2.";
        let sections = split_sections(text);
        assert_eq!(
            sections,
            vec![
                InsightSection {
                    heading: Some("Overall store density".to_string()),
                    body: "Dense.".to_string(),
                },
                InsightSection {
                    heading: Some("Cluster highlights".to_string()),
                    body: "Cluster 1.\nCluster 2.".to_string(),
                },
            ]
        );
    }

    #[test]
    fn markdown_decorated_headings_are_recognized() {
        let text = "## 1. Overall Store Density:\nHigh.\n**Store type and size breakdown**\nMostly bakeries.";
        let sections = split_sections(text);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].heading.as_deref(), Some("Overall store density"));
        assert_eq!(sections[1].heading.as_deref(), Some("Store type and size breakdown"));
        assert_eq!(sections[1].body, "Mostly bakeries.");
    }

    #[test]
    fn any_colon_line_is_a_heading() {
        let sections = split_sections("**Risks:**\nRent is high.");
        assert_eq!(sections[0].heading.as_deref(), Some("Risks"));
        assert_eq!(sections[0].body, "Rent is high.");
    }

    #[test]
    fn inline_colon_is_not_a_heading() {
        let sections = split_sections("Note: rent is high.");
        assert_eq!(sections.len(), 1);
        assert!(sections[0].heading.is_none());
        assert_eq!(sections[0].body, "Note: rent is high.");
    }

    #[test]
    fn preamble_becomes_untitled_section() {
        let sections = split_sections("Here is the analysis.\n\nCluster highlights:\nOne cluster.");
        assert_eq!(sections.len(), 2);
        assert!(sections[0].heading.is_none());
        assert_eq!(sections[0].body, "Here is the analysis.");
        assert_eq!(sections[1].heading.as_deref(), Some("Cluster highlights"));
    }

    #[test]
    fn empty_text_has_no_sections() {
        assert!(split_sections("").is_empty());
        assert!(split_sections("\n  \n").is_empty());
    }

    #[test]
    fn heading_without_body_is_kept() {
        let sections = split_sections("Suggestions for market opportunities:");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].body, "");
    }

    #[test]
    fn numbering_is_stripped() {
        assert_eq!(strip_decoration("3) Cluster highlights"), "Cluster highlights");
        assert_eq!(strip_decoration("12. Foo:"), "Foo:");
        assert_eq!(strip_decoration("2024 was busy"), "2024 was busy");
    }
}
