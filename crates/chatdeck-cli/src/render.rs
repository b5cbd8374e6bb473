//! Terminal rendering of views and tabs, coloured by role.

use chatdeck_application::{ChatView, TabSnapshot};
use chatdeck_core::reasoning::split_reasoning;
use chatdeck_core::{ChatStatus, Message, MessageRole};
use colored::{ColoredString, Colorize};

fn paint(role: MessageRole, text: &str) -> ColoredString {
    match role {
        MessageRole::User => text.green(),
        MessageRole::Assistant => text.bright_blue(),
        MessageRole::System => text.bright_black(),
    }
}

pub fn message_line(index: usize, message: &Message) -> String {
    let who = match message.role {
        MessageRole::User => "you",
        MessageRole::Assistant => "assistant",
        MessageRole::System => "system",
    };
    let label = paint(message.role, &format!("[{index}] {who}:")).bold();
    if message.pending {
        return format!("{label} {}", "...".bright_black());
    }
    let (reasoning, visible) = split_reasoning(&message.content);
    let mut line = format!("{label} {}", paint(message.role, visible));
    if reasoning.is_some() {
        line.push_str(&format!("  {}", "(reasoning hidden)".bright_black()));
    }
    if message.edited {
        line.push_str(&format!("  {}", "(edited)".bright_black()));
    }
    line
}

pub fn history(view: &ChatView) -> String {
    view.history
        .iter()
        .enumerate()
        .map(|(index, message)| message_line(index, message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One-line status suffix, empty when idle.
pub fn status(view: &ChatView) -> String {
    match (view.status, view.error.as_deref()) {
        (ChatStatus::Error, Some(detail)) => format!("error: {detail}").red().to_string(),
        (ChatStatus::Error, None) => "error".red().to_string(),
        (ChatStatus::Loading, _) => "loading...".yellow().to_string(),
        (ChatStatus::Sending, _) => "sending...".yellow().to_string(),
        (ChatStatus::Idle, _) => String::new(),
    }
}

pub fn tabs(snapshot: &TabSnapshot) -> String {
    snapshot
        .tabs
        .iter()
        .enumerate()
        .map(|(index, tab)| {
            let active = tab.id == snapshot.active_id;
            let marker = if active { '*' } else { ' ' };
            let line = if tab.is_sentinel() {
                format!("{marker} {index}: {}", tab.label)
            } else {
                format!("{marker} {index}: {} ({})", tab.label, tab.id)
            };
            if active {
                line.bright_green().to_string()
            } else {
                line
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
