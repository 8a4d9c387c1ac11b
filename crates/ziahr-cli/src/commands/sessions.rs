//! One-shot chat management commands.

use anyhow::Result;
use colored::Colorize;

use crate::bootstrap::App;
use crate::console;

pub async fn list(app: &App, archived: bool) -> Result<()> {
    let groups = app
        .chat
        .synchronizer()
        .sidebar(&chrono::Local::now())
        .await?;
    console::print_groups(&groups);

    if archived {
        let chats = app.settings.archived_chats()?;
        println!("{}", "Archived".bold());
        if chats.is_empty() {
            println!("{}", "  (none)".bright_black());
        }
        for session in &chats {
            console::print_session(session);
        }
    }
    Ok(())
}

pub async fn rename(app: &App, id: &str, title: &str) -> Result<()> {
    let session = app.chat.synchronizer().rename_session(id, title).await?;
    println!("{}", format!("Renamed {} to '{}'", session.id, session.title).green());
    Ok(())
}

pub async fn archive(app: &App, id: &str) -> Result<()> {
    let session = app.chat.synchronizer().archive_session(id).await?;
    println!("{}", format!("Archived '{}'", session.title).green());
    Ok(())
}

pub async fn unarchive(app: &App, id: &str) -> Result<()> {
    let session = app.chat.synchronizer().unarchive_session(id).await?;
    println!("{}", format!("Restored '{}'", session.title).green());
    Ok(())
}

pub async fn delete(app: &App, id: &str) -> Result<()> {
    let emptied = app.chat.synchronizer().delete_session(id).await?;
    println!("{}", format!("Deleted {}", id).green());
    if emptied {
        println!("{}", "No chats left.".bright_black());
    }
    Ok(())
}
