//! Terminal output: notifications, messages and the sidebar.

use colored::Colorize;
use ziahr_application::RenderedMessage;
use ziahr_core::notification::{Notification, NotificationLevel, Notifier};
use ziahr_core::session::{ChatSession, MessageType, SessionGroup};

/// Prints notifications inline; the terminal has no toast area.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        let line = format!("[{}] {}", label(notification.level), notification.message);
        match notification.level {
            NotificationLevel::Info => println!("{}", line.bright_black()),
            NotificationLevel::Success => println!("{}", line.green()),
            NotificationLevel::Warning => println!("{}", line.yellow()),
            NotificationLevel::Error => eprintln!("{}", line.red()),
        }
    }
}

fn label(level: NotificationLevel) -> &'static str {
    match level {
        NotificationLevel::Info => "info",
        NotificationLevel::Success => "ok",
        NotificationLevel::Warning => "warn",
        NotificationLevel::Error => "error",
    }
}

pub fn print_message(rendered: &RenderedMessage) {
    let stamp = if rendered.timestamp_label.is_empty() {
        String::new()
    } else {
        format!(" {}", rendered.timestamp_label)
    };

    match rendered.message_type {
        MessageType::User => {
            println!("{}", format!("> {}{}", rendered.text_content, stamp).green());
        }
        MessageType::Bot => {
            println!("{}", format!("ZiaHR{}", stamp).bright_magenta());
            for line in rendered.text_content.lines() {
                println!("{}", line.bright_blue());
            }
        }
        MessageType::System => {
            println!("{}", format!("* {}", rendered.text_content).yellow());
        }
    }
}

pub fn print_session(session: &ChatSession) {
    println!(
        "  {}  {} {}",
        session.id.bright_black(),
        session.title,
        format!("({} messages)", session.message_count).bright_black()
    );
}

pub fn print_groups(groups: &[SessionGroup]) {
    if groups.is_empty() {
        println!("{}", "No chats yet.".bright_black());
        return;
    }
    for group in groups {
        println!("{}", group.label.bold());
        for session in &group.sessions {
            print_session(session);
        }
    }
}
