use crate::models::{Member, MessageRole, MessageWithSender};

/// A successful answer given earlier in the current round.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerAnswer {
    pub name: String,
    pub content: String,
}

/// Render the transcript slice that goes into a system prompt.
///
/// User rows become `User: ...`, assistant rows use the sender's name
/// with `Agent` standing in for deleted members.
pub fn format_conversation_history(messages: &[MessageWithSender]) -> String {
    if messages.is_empty() {
        return "No previous messages.".to_string();
    }

    messages
        .iter()
        .map(|message| match message.role {
            MessageRole::User => format!("User: {}", message.content),
            MessageRole::Assistant => format!(
                "{}: {}",
                message.member_name.as_deref().unwrap_or("Agent"),
                message.content
            ),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Extend the base history with answers given earlier in this round, so
/// later members can react to them.
pub fn history_with_round_responses(history: &str, responses: &[PeerAnswer]) -> String {
    if responses.is_empty() {
        return history.to_string();
    }

    let block = responses
        .iter()
        .map(|answer| format!("{}: {}", answer.name, answer.content))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "{}\n\n--- Responses from other agents in this round ---\n{}",
        history, block
    )
}

/// Assemble the full system prompt for one member turn.
pub fn build_system_prompt(member: &Member, context_block: &str, history: &str) -> String {
    let mut prompt = format!(
        "You are \"{}\", an AI coding agent in Roundtable.\n\nYou are working on a codebase located at: {}\n\n",
        member.name, member.repo_path
    );

    if !context_block.is_empty() {
        prompt.push_str(&format!("Additional context:\n{}\n", context_block));
    }

    prompt.push_str(&format!(
        "\nYou are participating in a group chat with other AI agents and a user. Be concise, collaborative, and focus on actionable insights about your codebase.\n\nPrevious conversation:\n{}",
        history
    ));

    prompt
}
