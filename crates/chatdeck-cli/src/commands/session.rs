use super::open_session;
use crate::bootstrap::App;
use crate::render;
use anyhow::{Context, Result};
use chatdeck_core::SessionGateway;

const UNTITLED: &str = "Untitled Chat";

pub async fn list(app: &App) -> Result<()> {
    let sessions = app
        .gateway
        .list_sessions()
        .await
        .context("Failed to list saved sessions")?;

    if sessions.is_empty() {
        println!("No saved sessions.");
        return Ok(());
    }
    for session in sessions {
        println!(
            "{}  {}",
            session.thread_id,
            session.title.as_deref().unwrap_or(UNTITLED)
        );
    }
    Ok(())
}

pub async fn show(app: &App, thread_id: &str, json: bool) -> Result<()> {
    let view = open_session(&app.coordinator, thread_id, thread_id).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else if view.history.is_empty() {
        println!("(empty session)");
    } else {
        println!("{}", render::history(&view));
    }
    Ok(())
}

pub async fn edit(app: &App, thread_id: &str, index: i64, text: &str) -> Result<()> {
    let outcome = app
        .coordinator
        .message_editor()
        .edit(thread_id, index, text)
        .await
        .with_context(|| format!("Failed to edit message {index} in {thread_id}"))?;
    println!("Edited message {} in {}.", outcome.index, outcome.thread_id);
    Ok(())
}

pub async fn rename(app: &App, thread_id: &str, name: &str) -> Result<()> {
    app.coordinator
        .rename_session(thread_id, name)
        .await
        .with_context(|| format!("Failed to rename {thread_id}"))?;
    println!("Renamed {} to \"{}\".", thread_id, name.trim());
    Ok(())
}

pub async fn delete(app: &App, thread_id: &str) -> Result<()> {
    app.coordinator
        .delete_session(thread_id)
        .await
        .with_context(|| format!("Failed to delete {thread_id}"))?;
    println!("Deleted {}.", thread_id);
    Ok(())
}
