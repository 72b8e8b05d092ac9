use std::sync::LazyLock;

use regex::Regex;

use crate::models::Member;

// ASCII classes on purpose: an accented or CJK handle is not a token.
static MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([0-9A-Za-z_]+)(?:\s|$)").unwrap());

/// Lowercased `@` tokens in order of appearance.
///
/// A token only counts when the run of word characters after the `@` is
/// followed by whitespace or the end of the message, so handles glued to
/// punctuation (`@alice,`) or to another `@` are ignored.
pub fn mention_tokens(content: &str) -> Vec<String> {
    MENTION_RE
        .captures_iter(content)
        .map(|caps| caps[1].to_lowercase())
        .collect()
}

/// Resolve which members a message addresses.
///
/// An explicit target id wins outright: the result is that member if it
/// is in the room, otherwise nobody. Without one, each token selects
/// every member whose lowercased name contains it; no tokens or no
/// matches means everyone. The result always keeps the stored member
/// order.
pub fn resolve_targets<'a>(
    content: &str,
    members: &'a [Member],
    explicit_target: Option<i64>,
) -> Vec<&'a Member> {
    if let Some(target_id) = explicit_target {
        return members.iter().filter(|m| m.id == target_id).collect();
    }

    let tokens = mention_tokens(content);
    if tokens.is_empty() {
        return members.iter().collect();
    }

    let matched: Vec<&Member> = members
        .iter()
        .filter(|m| {
            let name = m.name.to_lowercase();
            tokens.iter().any(|token| name.contains(token))
        })
        .collect();

    if matched.is_empty() {
        members.iter().collect()
    } else {
        matched
    }
}
