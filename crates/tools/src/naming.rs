//! Deterministic tool names derived from document ids.
//!
//! Function names sent to the reasoning oracle must match
//! `[A-Za-z0-9_-]{1,64}`. A document id that already fits is used verbatim;
//! anything else is sanitized and suffixed with a short SHA-256 digest of
//! the raw id so two different ids never map to the same name. Verbatim
//! names never end in `_<8 hex>`: an id that does is digested as well.

use docrouter_core::document::DocumentId;
use sha2::{Digest, Sha256};

pub const VECTOR_PREFIX: &str = "vector_tool_";
pub const SUMMARY_PREFIX: &str = "summary_tool_";

const MAX_NAME_LEN: usize = 64;
const HASH_LEN: usize = 8;

pub fn vector_tool_name(doc_id: &DocumentId) -> String {
    tool_name(VECTOR_PREFIX, doc_id)
}

pub fn summary_tool_name(doc_id: &DocumentId) -> String {
    tool_name(SUMMARY_PREFIX, doc_id)
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn tool_name(prefix: &str, doc_id: &DocumentId) -> String {
    let raw = doc_id.as_str();
    let budget = MAX_NAME_LEN - prefix.len();

    if raw.chars().all(is_name_char) && raw.len() <= budget && !has_digest_suffix(raw) {
        return format!("{prefix}{raw}");
    }

    let sanitized: String = raw
        .chars()
        .map(|c| if is_name_char(c) { c } else { '_' })
        .collect();
    let digest = short_digest(raw);
    let keep = budget - HASH_LEN - 1;
    let slug: String = sanitized.chars().take(keep).collect();

    format!("{prefix}{slug}_{digest}")
}

/// Whether `raw` ends like a digested name: `_` then `HASH_LEN` lowercase hex.
fn has_digest_suffix(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    if bytes.len() <= HASH_LEN {
        return false;
    }
    let (head, tail) = bytes.split_at(bytes.len() - HASH_LEN);
    head.last() == Some(&b'_')
        && tail
            .iter()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(b))
}

fn short_digest(raw: &str) -> String {
    Sha256::digest(raw.as_bytes())
        .iter()
        .take(HASH_LEN / 2)
        .map(|b| format!("{b:02x}"))
        .collect()
}
