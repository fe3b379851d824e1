//! Sentence-aware chunking.
//!
//! Text is split on Unicode sentence boundaries and consecutive sentences
//! are packed into segments of at most `max_segment_size` characters. A
//! sentence is only cut when it alone exceeds the limit; the cut prefers the
//! last whitespace inside the window and falls back to a character boundary.
//!
//! Segments never span pages. Every segment is trimmed and whitespace-only
//! segments are dropped, so concatenating the output reproduces the input
//! modulo whitespace.

use docrouter_core::document::{DocumentId, ExtractedDocument, Segment, SegmentMetadata};
use docrouter_core::error::ChunkingError;
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

/// Chunk one page of text.
///
/// Ordinals start at `first_ordinal` so a multi-page document gets one
/// continuous `0..n` sequence.
pub fn chunk_text(
    text: &str,
    page_label: Option<&str>,
    doc_id: &DocumentId,
    max_segment_size: usize,
    first_ordinal: usize,
) -> Result<Vec<Segment>, ChunkingError> {
    if max_segment_size == 0 {
        return Err(ChunkingError::InvalidSize);
    }
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut packer = Packer {
        max: max_segment_size,
        current: String::new(),
        current_len: 0,
        segments: Vec::new(),
        page_label,
        doc_id,
        next_ordinal: first_ordinal,
    };

    for sentence in text.split_sentence_bounds() {
        if sentence.chars().count() > max_segment_size {
            for piece in hard_split(sentence, max_segment_size) {
                packer.push(piece);
            }
        } else {
            packer.push(sentence);
        }
    }
    packer.flush();

    Ok(packer.segments)
}

/// Chunk every page of a document, keeping ordinals continuous.
pub fn chunk_document(
    document: &ExtractedDocument,
    doc_id: &DocumentId,
    max_segment_size: usize,
) -> Result<Vec<Segment>, ChunkingError> {
    if max_segment_size == 0 {
        return Err(ChunkingError::InvalidSize);
    }

    let mut segments = Vec::new();
    for page in &document.pages {
        let page_segments = chunk_text(
            &page.text,
            page.label.as_deref(),
            doc_id,
            max_segment_size,
            segments.len(),
        )?;
        segments.extend(page_segments);
    }

    debug!(
        doc_id = %doc_id,
        pages = document.pages.len(),
        segments = segments.len(),
        max_segment_size,
        "Chunked document"
    );

    Ok(segments)
}

/// Accumulates sentences until the next one would overflow the limit.
struct Packer<'a> {
    max: usize,
    current: String,
    current_len: usize,
    segments: Vec<Segment>,
    page_label: Option<&'a str>,
    doc_id: &'a DocumentId,
    next_ordinal: usize,
}

impl Packer<'_> {
    fn push(&mut self, piece: &str) {
        let piece_len = piece.chars().count();
        if self.current_len + piece_len > self.max {
            self.flush();
        }
        self.current.push_str(piece);
        self.current_len += piece_len;
    }

    fn flush(&mut self) {
        let text = self.current.trim();
        if !text.is_empty() {
            self.segments.push(Segment {
                text: text.to_string(),
                metadata: SegmentMetadata {
                    page_label: self.page_label.map(str::to_string),
                    ordinal: self.next_ordinal,
                    doc_id: self.doc_id.clone(),
                },
            });
            self.next_ordinal += 1;
        }
        self.current.clear();
        self.current_len = 0;
    }
}

/// Cut an oversized sentence into pieces of at most `max` characters.
fn hard_split(sentence: &str, max: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut rest = sentence;

    while !rest.is_empty() {
        let Some((window_end, _)) = rest.char_indices().nth(max) else {
            pieces.push(rest);
            break;
        };

        let window = &rest[..window_end];
        let cut = match window.rfind(char::is_whitespace) {
            Some(pos) if pos > 0 => {
                let ws_len = window[pos..].chars().next().map_or(1, char::len_utf8);
                pos + ws_len
            }
            _ => window_end,
        };

        pieces.push(&rest[..cut]);
        rest = &rest[cut..];
    }

    pieces
}
