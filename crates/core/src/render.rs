use crate::models::{ConversationTurn, Role};

fn role_label(role: Role, assistant_name: &str) -> &str {
    match role {
        Role::User => "You",
        Role::Assistant => assistant_name,
    }
}

pub fn render_turn(turn: &ConversationTurn, assistant_name: &str) -> String {
    format!("{}:\n{}\n", role_label(turn.role, assistant_name), turn.content)
}

/// Renders the whole conversation, oldest turn first.
pub fn render_transcript(history: &[ConversationTurn], assistant_name: &str) -> String {
    history
        .iter()
        .map(|turn| render_turn(turn, assistant_name))
        .collect::<Vec<_>>()
        .join("\n")
}
