use crate::models::{ContextSource, Member};

/// Upper bound on the combined context injected into a prompt, counted
/// in characters rather than bytes.
pub const MAX_CONTEXT_CHARS: usize = 100_000;

/// Combine a member's sources into one prompt block.
///
/// Sources keep their creation order. Each becomes a labelled section,
/// sections are separated by blank lines, and the whole block is capped
/// at [`MAX_CONTEXT_CHARS`] with an explicit truncation marker.
pub fn combine_context_sources(sources: &[ContextSource]) -> String {
    let combined = sources
        .iter()
        .map(|source| {
            format!(
                "--- {}: {} ---\n{}",
                source.kind.label(),
                source.title,
                source.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    truncate_chars(&combined, MAX_CONTEXT_CHARS)
}

/// The context block for one member turn. Stored sources win wholesale;
/// the member's free-text context only applies when no sources exist.
pub fn context_block_for(member: &Member, sources: &[ContextSource]) -> String {
    if sources.is_empty() {
        member.context.clone().unwrap_or_default()
    } else {
        combine_context_sources(sources)
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    let total = text.chars().count();
    if total <= max_chars {
        return text.to_string();
    }

    let kept: String = text.chars().take(max_chars).collect();
    let omitted = total - max_chars;
    format!(
        "{}\n\n[Content truncated - {} characters omitted]",
        kept, omitted
    )
}
