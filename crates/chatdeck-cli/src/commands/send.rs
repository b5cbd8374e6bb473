use super::open_session;
use crate::bootstrap::App;
use crate::render;
use anyhow::{Result, bail};
use chatdeck_application::SendOutcome;

pub async fn run(app: &App, thread: Option<&str>, text: &str) -> Result<()> {
    let coordinator = &app.coordinator;
    if let Some(thread_id) = thread {
        open_session(coordinator, thread_id, thread_id).await?;
    }

    let (thread_id, new_tab) = match coordinator.send_message(text).await {
        Ok(SendOutcome::Sent {
            thread_id, new_tab, ..
        }) => (thread_id, new_tab),
        Ok(SendOutcome::Ignored) => {
            println!("Nothing to send.");
            return Ok(());
        }
        Err(err) => bail!("Send failed: {}", err.detail()),
    };
    // lets the confirmation load settle before printing
    coordinator.wait_idle().await;

    let view = coordinator.view();
    if let Some(reply) = view.history.last() {
        println!("{}", render::message_line(view.history.len() - 1, reply));
    }
    if new_tab {
        println!("(session {thread_id})");
    }
    Ok(())
}
