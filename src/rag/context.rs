//! Context assembly and prompt construction.

use super::metadata;
use crate::models::Fragment;
use crate::utils::truncate_chars;

const TRUNCATION_NOTICE: &str = "Note: the text was truncated due to length. ";

/// Join fragment contents in store order, one per line.
pub fn query_context(fragments: &[Fragment]) -> String {
    fragments
        .iter()
        .map(|f| f.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn answer_prompt(context: &str, query: &str) -> String {
    format!(
        "Answer the question based only on the following context:\n\n{context}\n\nQuestion: {query}\n\nAnswer:"
    )
}

/// Sort fragments into reading order by `(page, chunk)`.
///
/// The sort is stable, so fragments with equal keys keep their store order.
pub fn order_fragments(fragments: &mut [Fragment]) {
    fragments.sort_by(|a, b| {
        let (page_a, chunk_a) = metadata::ordering_key(a);
        let (page_b, chunk_b) = metadata::ordering_key(b);
        page_a.total_cmp(&page_b).then(chunk_a.total_cmp(&chunk_b))
    });
}

/// A whole document reassembled from its fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledDocument {
    pub text: String,
    pub truncated: bool,
}

/// Join already-ordered fragments with blank lines and cut the result to
/// `max_chars` characters.
pub fn assemble_document(fragments: &[Fragment], max_chars: usize) -> AssembledDocument {
    let mut text = fragments
        .iter()
        .map(metadata::document_text)
        .collect::<Vec<_>>()
        .join("\n\n");

    let (kept, truncated) = truncate_chars(&text, max_chars);
    let kept_bytes = kept.len();
    text.truncate(kept_bytes);

    AssembledDocument { text, truncated }
}

pub fn summary_prompt(document: &AssembledDocument) -> String {
    let prompt = format!(
        "Summarize the following official document in 5 key points (bullet points):\n\n{}",
        document.text
    );
    if document.truncated {
        format!("{TRUNCATION_NOTICE}{prompt}")
    } else {
        prompt
    }
}
