//! Interactive tabbed chat.
//!
//! Plain lines are sent from the active tab; `/` commands drive the tab
//! registry. Input goes through a line editor with history and slash-command
//! completion.

use super::open_session;
use crate::bootstrap::App;
use crate::render;
use anyhow::Result;
use chatdeck_application::{ChatEvent, ChatStateCoordinator, SendOutcome};
use chatdeck_core::reasoning::splice_reasoning;
use chatdeck_core::{ChatError, MessageRole, SENTINEL_NEW_CHAT, SessionGateway};
use chatdeck_infrastructure::ChatdeckPaths;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Editor, Helper};
use std::borrow::Cow::{self, Borrowed, Owned};
use tokio::sync::broadcast;

const COMMANDS: [&str; 12] = [
    "/new", "/tabs", "/sessions", "/open", "/switch", "/close", "/rename", "/edit", "/clear",
    "/help", "/quit", "/exit",
];

const HELP: &str = "\
/new                  switch to New Chat
/tabs                 list open tabs
/sessions             list saved sessions
/open <thread>        open a saved session in a tab
/switch <n|thread>    switch to a tab by position or id
/close [n|thread]     close a tab (default: active)
/rename <name>        rename the active session
/edit <n> <text>      replace message n of the active session
/clear                close every tab and start over
/help                 show this help
/quit                 leave";

/// Slash commands matching what has been typed so far.
fn command_candidates(typed: &str) -> Vec<&'static str> {
    if !typed.starts_with('/') || typed.contains(char::is_whitespace) {
        return Vec::new();
    }
    COMMANDS
        .iter()
        .copied()
        .filter(|cmd| cmd.starts_with(typed))
        .collect()
}

fn command_hint(typed: &str) -> Option<String> {
    command_candidates(typed)
        .into_iter()
        .find(|cmd| cmd.len() > typed.len())
        .map(|cmd| cmd[typed.len()..].to_string())
}

struct ReplHelper;

impl Helper for ReplHelper {}

impl Completer for ReplHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let candidates = command_candidates(&line[..pos])
            .into_iter()
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Hinter for ReplHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<String> {
        command_hint(&line[..pos])
    }
}

impl Highlighter for ReplHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Owned(hint.bright_black().to_string())
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Validator for ReplHelper {}

#[derive(Debug, Clone, PartialEq)]
enum ReplCommand {
    Say(String),
    New,
    Tabs,
    Sessions,
    Open(String),
    Switch(String),
    Close(Option<String>),
    Rename(String),
    Edit { index: i64, text: String },
    Clear,
    Help,
    Quit,
    Usage(&'static str),
    Unknown(String),
    Empty,
}

fn parse(line: &str) -> ReplCommand {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return if line.is_empty() {
            ReplCommand::Empty
        } else {
            ReplCommand::Say(line.to_string())
        };
    };
    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    match name {
        "new" => ReplCommand::New,
        "tabs" => ReplCommand::Tabs,
        "sessions" => ReplCommand::Sessions,
        "open" if !arg.is_empty() => ReplCommand::Open(arg.to_string()),
        "open" => ReplCommand::Usage("/open <thread>"),
        "switch" if !arg.is_empty() => ReplCommand::Switch(arg.to_string()),
        "switch" => ReplCommand::Usage("/switch <n|thread>"),
        "close" => ReplCommand::Close((!arg.is_empty()).then(|| arg.to_string())),
        "rename" => ReplCommand::Rename(arg.to_string()),
        "edit" => match arg.split_once(char::is_whitespace) {
            Some((index, text)) => match index.parse() {
                Ok(index) => ReplCommand::Edit {
                    index,
                    text: text.trim().to_string(),
                },
                Err(_) => ReplCommand::Usage("/edit <n> <text>"),
            },
            None => ReplCommand::Usage("/edit <n> <text>"),
        },
        "clear" => ReplCommand::Clear,
        "help" => ReplCommand::Help,
        "quit" | "exit" => ReplCommand::Quit,
        other => ReplCommand::Unknown(other.to_string()),
    }
}

/// Resolves a tab position from `/tabs` or a tab id.
fn resolve_tab(coordinator: &ChatStateCoordinator, target: &str) -> Option<String> {
    let snapshot = coordinator.tabs().open();
    if let Ok(position) = target.parse::<usize>() {
        return snapshot.tabs.get(position).map(|tab| tab.id.clone());
    }
    snapshot
        .tabs
        .iter()
        .find(|tab| tab.id == target)
        .map(|tab| tab.id.clone())
}

fn prompt(coordinator: &ChatStateCoordinator) -> String {
    let active = coordinator.tabs().active_id();
    let label = coordinator
        .tabs()
        .open()
        .tabs
        .into_iter()
        .find(|tab| tab.id == active)
        .map(|tab| tab.label)
        .unwrap_or(active);
    format!("{label}> ")
}

fn show_view(coordinator: &ChatStateCoordinator) {
    let view = coordinator.view();
    if !view.history.is_empty() {
        println!("{}", render::history(&view));
    }
    let status = render::status(&view);
    if !status.is_empty() {
        println!("({status})");
    }
}

fn report(err: &ChatError) {
    println!("{}", format!("error: {}", err.detail()).red());
}

fn note(text: &str) {
    println!("{}", text.bright_black());
}

fn drain_events(events: &mut broadcast::Receiver<ChatEvent>) {
    while let Ok(event) = events.try_recv() {
        if let ChatEvent::TabBound { thread_id, .. } = event {
            note(&format!("(new session {thread_id})"));
        }
    }
}

async fn say(coordinator: &ChatStateCoordinator, text: &str) {
    match coordinator.send_message(text).await {
        Ok(SendOutcome::Sent { .. }) => {
            let view = coordinator.view();
            if let Some(reply) = view.history.last() {
                println!("{}", render::message_line(view.history.len() - 1, reply));
            }
        }
        Ok(SendOutcome::Ignored) => {}
        Err(err) => report(&err),
    }
}

fn new_editor() -> Result<Editor<ReplHelper, DefaultHistory>> {
    let mut editor = Editor::new()?;
    editor.set_helper(Some(ReplHelper));
    if let Ok(path) = ChatdeckPaths::history_file() {
        if let Err(e) = editor.load_history(&path) {
            tracing::debug!("[Repl] no history loaded from {}: {}", path.display(), e);
        }
    }
    Ok(editor)
}

fn save_history(editor: &mut Editor<ReplHelper, DefaultHistory>) {
    let Ok(path) = ChatdeckPaths::history_file() else {
        return;
    };
    if let Err(e) = editor.save_history(&path) {
        tracing::warn!("[Repl] failed to save history to {}: {}", path.display(), e);
    }
}

async fn edit(app: &App, index: i64, text: &str) {
    let coordinator = &app.coordinator;
    let view = coordinator.view();
    let thread_id = view.thread_id.clone().unwrap_or_default();

    // keep the reasoning section of assistant turns
    let content = usize::try_from(index)
        .ok()
        .and_then(|i| view.history.get(i))
        .filter(|message| message.role == MessageRole::Assistant)
        .map(|message| splice_reasoning(&message.content, text))
        .unwrap_or_else(|| text.to_string());

    match coordinator
        .message_editor()
        .edit(&thread_id, index, &content)
        .await
    {
        Ok(_) => show_view(coordinator),
        Err(err) => report(&err),
    }
}

pub async fn run(app: &App) -> Result<()> {
    let coordinator = &app.coordinator;
    let mut events = coordinator.subscribe();

    let mut editor = new_editor()?;

    println!("{}", "=== chatdeck ===".bright_magenta().bold());
    match coordinator.startup().await {
        Ok(true) => note("Saved sessions found. /sessions to list, /open <thread> to resume."),
        Ok(false) => {}
        Err(err) => println!(
            "{}",
            format!("Could not reach the session store: {}", err.detail()).red()
        ),
    }
    note("Type a message, or /help.");

    loop {
        let prompt_text = prompt(coordinator);
        let line = match tokio::task::block_in_place(|| editor.readline(&prompt_text)) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("{}", "Ctrl-C. /quit to leave.".yellow());
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                save_history(&mut editor);
                return Err(err.into());
            }
        };
        if !line.trim().is_empty() {
            let _ = editor.add_history_entry(line.as_str());
        }

        match parse(&line) {
            ReplCommand::Empty => continue,
            ReplCommand::Say(text) => say(coordinator, &text).await,
            ReplCommand::New => {
                if let Err(err) = coordinator.tabs().select(SENTINEL_NEW_CHAT) {
                    report(&err);
                }
            }
            ReplCommand::Tabs => println!("{}", render::tabs(&coordinator.tabs().open())),
            ReplCommand::Sessions => match app.gateway.list_sessions().await {
                Ok(sessions) if sessions.is_empty() => note("No saved sessions."),
                Ok(sessions) => {
                    for session in sessions {
                        println!(
                            "{}  {}",
                            session.thread_id,
                            session.title.as_deref().unwrap_or("Untitled Chat")
                        );
                    }
                }
                Err(err) => report(&err),
            },
            ReplCommand::Open(thread_id) => {
                match open_session(coordinator, &thread_id, &thread_id).await {
                    Ok(_) => show_view(coordinator),
                    Err(err) => println!("{}", format!("error: {err}").red()),
                }
            }
            ReplCommand::Switch(target) => match resolve_tab(coordinator, &target) {
                Some(tab_id) => match coordinator.tabs().select(&tab_id) {
                    Ok(_) => {
                        coordinator.wait_idle().await;
                        show_view(coordinator);
                    }
                    Err(err) => report(&err),
                },
                None => note(&format!("No tab '{target}'. /tabs lists open tabs.")),
            },
            ReplCommand::Close(target) => {
                let tab_id = match target {
                    Some(target) => resolve_tab(coordinator, &target),
                    None => Some(coordinator.tabs().active_id()),
                };
                match tab_id.map(|id| coordinator.tabs().close(&id)) {
                    Some(Ok(_)) => {
                        coordinator.wait_idle().await;
                        show_view(coordinator);
                    }
                    Some(Err(err)) => report(&err),
                    None => note("No such tab. /tabs lists open tabs."),
                }
            }
            ReplCommand::Rename(name) => {
                let active = coordinator.tabs().active_id();
                if let Err(err) = coordinator.rename_session(&active, &name).await {
                    report(&err);
                }
            }
            ReplCommand::Edit { index, text } => edit(app, index, &text).await,
            ReplCommand::Clear => coordinator.clear_all(),
            ReplCommand::Help => println!("{HELP}"),
            ReplCommand::Usage(usage) => note(&format!("usage: {usage}")),
            ReplCommand::Unknown(name) => {
                note(&format!("Unknown command /{name}. /help lists commands."))
            }
            ReplCommand::Quit => break,
        }
        drain_events(&mut events);
    }

    save_history(&mut editor);
    coordinator.wait_idle().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_sent() {
        assert_eq!(parse("  hello there "), ReplCommand::Say("hello there".into()));
        assert_eq!(parse("   "), ReplCommand::Empty);
    }

    #[test]
    fn test_commands_with_arguments() {
        assert_eq!(parse("/switch 2"), ReplCommand::Switch("2".into()));
        assert_eq!(parse("/close"), ReplCommand::Close(None));
        assert_eq!(parse("/close t1"), ReplCommand::Close(Some("t1".into())));
        assert_eq!(parse("/rename  Trip plans "), ReplCommand::Rename("Trip plans".into()));
        assert_eq!(
            parse("/edit 3 new words here"),
            ReplCommand::Edit {
                index: 3,
                text: "new words here".into()
            }
        );
    }

    #[test]
    fn test_malformed_commands_report_usage() {
        assert_eq!(parse("/switch"), ReplCommand::Usage("/switch <n|thread>"));
        assert_eq!(parse("/edit x y"), ReplCommand::Usage("/edit <n> <text>"));
        assert_eq!(parse("/edit 2"), ReplCommand::Usage("/edit <n> <text>"));
        assert_eq!(parse("/frobnicate"), ReplCommand::Unknown("frobnicate".into()));
    }

    #[test]
    fn test_slash_commands_complete_from_prefix() {
        assert_eq!(command_candidates("/s"), vec!["/sessions", "/switch"]);
        assert_eq!(command_candidates("/quit"), vec!["/quit"]);
        assert!(command_candidates("hello").is_empty());
        assert!(command_candidates("/open t1").is_empty());
    }

    #[test]
    fn test_hint_completes_first_match() {
        assert_eq!(command_hint("/ta").as_deref(), Some("bs"));
        assert_eq!(command_hint("/tabs"), None);
        assert_eq!(command_hint("/zz"), None);
    }

    #[test]
    fn test_every_command_parses() {
        for cmd in COMMANDS {
            assert!(!matches!(parse(cmd), ReplCommand::Unknown(_)), "{cmd}");
        }
    }

    #[test]
    fn test_negative_edit_index_is_left_to_the_editor() {
        assert_eq!(
            parse("/edit -1 x"),
            ReplCommand::Edit {
                index: -1,
                text: "x".into()
            }
        );
    }
}
