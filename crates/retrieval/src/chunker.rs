//! Markdown-aware chunk segmentation.
//!
//! Documents are split into titled passages along `## ` headings. Sections
//! that exceed the hard size cap are further split by size, preferring
//! paragraph breaks, then sentence breaks, before hard-cutting.

use serde::{Deserialize, Serialize};

/// Preferred chunk size in characters when splitting by size.
pub const TARGET_CHUNK_SIZE: usize = 1000;
/// A chosen break point must leave at least this many characters.
pub const MIN_CHUNK_SIZE: usize = 800;
/// Sections longer than this get split by size.
pub const MAX_CHUNK_SIZE: usize = 1200;

/// A titled passage of a source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    /// Document identifier (file stem for filesystem sources)
    pub doc_id: String,

    /// Section title; size-split pieces after the first carry " (Part N)"
    pub section_title: String,

    /// The passage text, trimmed
    pub text: String,
}

impl Chunk {
    pub fn new(
        doc_id: impl Into<String>,
        section_title: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            doc_id: doc_id.into(),
            section_title: section_title.into(),
            text: text.into(),
        }
    }
}

/// Split a single document into chunks.
///
/// `## ` headings at line start delimit sections. Content before the first
/// heading is titled "Introduction". A document with no headings is split
/// by size under the title "Content". An empty document yields no chunks.
pub fn chunk_document(doc_id: &str, content: &str) -> Vec<Chunk> {
    let headings = find_headings(content);
    if headings.is_empty() {
        return split_by_size(doc_id, content, "Content");
    }

    let mut chunks = Vec::new();
    let mut last_end = 0usize;
    let mut last_title: Option<&str> = None;

    for heading in &headings {
        if last_end < heading.line_start {
            let section = content[last_end..heading.line_start].trim();
            if !section.is_empty() {
                push_section(
                    &mut chunks,
                    doc_id,
                    last_title.unwrap_or("Introduction"),
                    section,
                );
            }
        }
        last_title = Some(&heading.title);
        last_end = heading.content_end;
    }

    if last_end < content.len() {
        let section = content[last_end..].trim();
        if !section.is_empty() {
            push_section(&mut chunks, doc_id, last_title.unwrap_or("Content"), section);
        }
    }

    // All sections were empty (e.g. a file that is only headings)
    if chunks.is_empty() {
        return split_by_size(doc_id, content, "Content");
    }

    chunks
}

/// Chunk every document in a corpus, preserving corpus order.
pub fn chunk_all<'a, I>(documents: I) -> Vec<Chunk>
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    let mut all = Vec::new();
    for (doc_id, content) in documents {
        all.extend(chunk_document(doc_id, content));
    }
    all
}

struct Heading {
    /// Byte offset of the start of the heading line
    line_start: usize,
    /// Byte offset just past the heading text (excluding the newline)
    content_end: usize,
    title: String,
}

fn find_headings(content: &str) -> Vec<Heading> {
    let mut headings = Vec::new();
    let mut offset = 0usize;
    for line in content.split_inclusive('\n') {
        let text = line.trim_end_matches(['\n', '\r']);
        if let Some(title) = text.strip_prefix("## ") {
            if !title.is_empty() {
                headings.push(Heading {
                    line_start: offset,
                    content_end: offset + text.len(),
                    title: title.to_string(),
                });
            }
        }
        offset += line.len();
    }
    headings
}

fn push_section(chunks: &mut Vec<Chunk>, doc_id: &str, title: &str, section: &str) {
    if section.len() > MAX_CHUNK_SIZE {
        chunks.extend(split_by_size(doc_id, section, title));
    } else {
        chunks.push(Chunk::new(doc_id, title, section));
    }
}

/// Split `text` into pieces of roughly `TARGET_CHUNK_SIZE` characters.
///
/// Break points prefer the last paragraph break within the window, then the
/// last sentence break, as long as the piece stays above `MIN_CHUNK_SIZE`.
/// The first non-empty piece keeps the base title; later pieces are titled
/// "<base> (Part N)".
fn split_by_size(doc_id: &str, text: &str, base_title: &str) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut piece_count = 0usize;

    while start < text.len() {
        let mut end = floor_char_boundary(text, (start + TARGET_CHUNK_SIZE).min(text.len()));

        if end < text.len() {
            if let Some(para) = text[..end].rfind("\n\n").filter(|&p| p > start + MIN_CHUNK_SIZE) {
                end = para + 2;
            } else {
                let window = &text[..end];
                let sentence = [". ", ".\n", "! "]
                    .iter()
                    .filter_map(|sep| window.rfind(sep))
                    .max();
                if let Some(s) = sentence.filter(|&s| s > start + MIN_CHUNK_SIZE) {
                    end = s + 2;
                }
            }
        }

        let piece = text[start..end].trim();
        if !piece.is_empty() {
            piece_count += 1;
            let title = if chunks.is_empty() {
                base_title.to_string()
            } else {
                format!("{base_title} (Part {piece_count})")
            };
            chunks.push(Chunk::new(doc_id, title, piece));
        }
        start = end;
    }

    chunks
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_headings() {
        let content = "## Webhooks\nConfigure webhooks in settings.\n## API Keys\nRotate keys monthly.\n";
        let chunks = chunk_document("api_guide", content);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].section_title, "Webhooks");
        assert_eq!(chunks[0].text, "Configure webhooks in settings.");
        assert_eq!(chunks[1].section_title, "API Keys");
        assert_eq!(chunks[1].text, "Rotate keys monthly.");
        assert_eq!(chunks[1].doc_id, "api_guide");
    }

    #[test]
    fn content_before_first_heading_is_introduction() {
        let content = "Welcome to the guide.\n## Setup\nInstall the CLI.\n";
        let chunks = chunk_document("guide", content);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].section_title, "Introduction");
        assert_eq!(chunks[0].text, "Welcome to the guide.");
        assert_eq!(chunks[1].section_title, "Setup");
    }

    #[test]
    fn no_headings_titled_content() {
        let chunks = chunk_document("notes", "Just some plain text notes.");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].section_title, "Content");
        assert_eq!(chunks[0].text, "Just some plain text notes.");
    }

    #[test]
    fn empty_document_yields_no_chunks() {
        assert!(chunk_document("empty", "").is_empty());
        assert!(chunk_document("blank", "   \n  ").is_empty());
    }

    #[test]
    fn oversized_section_splits_at_paragraph_break() {
        let body = format!("{}\n\n{}", "a".repeat(900), "b".repeat(500));
        let content = format!("## Big\n{body}\n");
        let chunks = chunk_document("doc", &content);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].section_title, "Big");
        assert_eq!(chunks[0].text, "a".repeat(900));
        assert_eq!(chunks[1].section_title, "Big (Part 2)");
        assert_eq!(chunks[1].text, "b".repeat(500));
    }

    #[test]
    fn oversized_section_splits_at_sentence_break() {
        let text = format!("{}. {}", "a".repeat(850), "b".repeat(600));
        let chunks = chunk_document("doc", &text);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].text.ends_with('.'));
        assert_eq!(chunks[1].text, "b".repeat(600));
    }

    #[test]
    fn hard_cut_when_no_break_found() {
        let text = "x".repeat(1500);
        let chunks = chunk_document("doc", &text);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text.len(), TARGET_CHUNK_SIZE);
        assert_eq!(chunks[1].text.len(), 500);
        assert_eq!(chunks[1].section_title, "Content (Part 2)");
    }

    #[test]
    fn trailing_section_keeps_last_title() {
        let content = "## Only\nshort\n";
        let chunks = chunk_document("doc", content);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].section_title, "Only");
        assert_eq!(chunks[0].text, "short");
    }

    #[test]
    fn multi_section_document_reconstructs_within_bounds() {
        let long = format!("{}\n\n{}", "a".repeat(900), "b".repeat(500));
        let content = format!(
            "Intro paragraph.\n## First\nShort section body.\n## Second\n{long}\n## Third\nClosing notes.\n"
        );
        let chunks = chunk_document("handbook", &content);

        assert_eq!(chunks.len(), 5);
        assert!(chunks.iter().all(|c| !c.section_title.is_empty()));
        assert!(chunks.iter().all(|c| c.text.len() <= MAX_CHUNK_SIZE));
        assert_eq!(chunks[2].section_title, "Second");
        assert_eq!(chunks[3].section_title, "Second (Part 2)");

        // Concatenated chunk text reconstructs the source bodies modulo
        // whitespace; headings live in the titles, not the text.
        let strip = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
        let rebuilt: String = chunks.iter().map(|c| strip(&c.text)).collect();
        let bodies: String = content
            .lines()
            .filter(|line| !line.starts_with("## "))
            .map(strip)
            .collect();
        assert_eq!(rebuilt, bodies);
    }

    #[test]
    fn chunk_all_preserves_corpus_order() {
        let docs = std::collections::BTreeMap::from([
            ("alpha".to_string(), "## A\nfirst\n".to_string()),
            ("beta".to_string(), "## B\nsecond\n".to_string()),
        ]);
        let chunks = chunk_all(&docs);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].doc_id, "alpha");
        assert_eq!(chunks[1].doc_id, "beta");
    }
}
