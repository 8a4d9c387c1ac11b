//! Interactive chat loop.

use std::borrow::Cow::{self, Borrowed, Owned};
use std::path::Path;

use anyhow::{Context as _, Result};
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use ziahr_application::{
    InsertPosition, LoadOutcome, MessageRenderer, PageFetch, PendingEscalation, RenderedMessage,
    SendOutcome, ThreadView,
};
use ziahr_core::attachment::{AttachmentStatus, PendingFile};
use ziahr_core::session::{Message, MessageType};

use crate::bootstrap::App;
use crate::console;

const COMMANDS: &[&str] = &[
    "/attach", "/clear", "/copy", "/detach", "/down", "/escalate", "/files", "/help", "/list",
    "/new", "/older", "/open", "/quit", "/speak", "/suggest", "/up",
];

const SUGGESTIONS: &[&str] = &[
    "What is the leave policy?",
    "How do I claim travel expenses?",
    "When is the next payroll date?",
];

#[derive(Clone)]
struct ChatHelper;

impl Helper for ChatHelper {}

impl Completer for ChatHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        if !line.starts_with('/') || line.contains(' ') {
            return Ok((0, vec![]));
        }

        let candidates = COMMANDS
            .iter()
            .filter(|cmd| cmd.starts_with(line))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for ChatHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for ChatHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        if line.starts_with('/') && !line.contains(' ') {
            COMMANDS
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for ChatHelper {}

enum Flow {
    Continue,
    Quit,
}

struct ChatRepl<'a> {
    app: &'a App,
    renderer: MessageRenderer,
    view: ThreadView,
    escalation: Option<PendingEscalation>,
}

impl<'a> ChatRepl<'a> {
    fn new(app: &'a App) -> Self {
        Self {
            app,
            renderer: MessageRenderer::new(),
            view: ThreadView::new(),
            escalation: None,
        }
    }

    async fn start(&mut self) -> Result<()> {
        let outcome = self.app.chat.synchronizer().bootstrap().await?;
        if outcome.just_emptied {
            tracing::debug!("[ChatRepl] Previous run deleted the last chat");
        }
        match outcome.restored {
            Some(LoadOutcome::Loaded { .. }) => self.show_thread().await,
            _ => self.welcome(),
        }
        Ok(())
    }

    fn welcome(&self) {
        println!("{}", "How can I help you today?".bright_magenta());
        let show = self
            .app
            .settings
            .settings()
            .map(|s| s.show_suggestions)
            .unwrap_or(true);
        if show {
            for (i, suggestion) in SUGGESTIONS.iter().enumerate() {
                println!("  {}", format!("/suggest {}  {}", i + 1, suggestion).bright_black());
            }
        }
    }

    /// Replaces the view with the synchronizer's thread.
    async fn show_thread(&mut self) {
        self.view.clear();
        let thread = self.app.chat.synchronizer().thread_snapshot().await;
        for rendered in self.renderer.render_thread(thread.messages()) {
            console::print_message(&rendered);
            self.view.insert(rendered, InsertPosition::Append);
        }
        if thread.has_more() {
            println!("{}", "(/older shows earlier messages)".bright_black());
        }
    }

    /// Shows messages of the thread that are not in the view yet.
    async fn show_new(&mut self) {
        let thread = self.app.chat.synchronizer().thread_snapshot().await;
        let fresh: Vec<Message> = thread
            .messages()
            .iter()
            .filter(|m| self.view.copy_text(&m.id).is_none())
            .cloned()
            .collect();
        for message in fresh {
            let rendered = self.renderer.render(&message);
            if message.message_type != MessageType::User {
                console::print_message(&rendered);
            }
            self.view.insert(rendered, InsertPosition::Append);
        }
    }

    async fn handle(&mut self, line: &str) -> Result<Flow> {
        let (command, arg) = match line.split_once(' ') {
            Some((command, arg)) => (command, arg.trim()),
            None => (line, ""),
        };

        if !command.starts_with('/') {
            self.send(line, false).await?;
            return Ok(Flow::Continue);
        }

        match command {
            "/quit" | "/exit" => return Ok(Flow::Quit),
            "/help" => print_help(),
            "/suggest" => {
                let suggestion = arg
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| SUGGESTIONS.get(i))
                    .context("Usage: /suggest <1-3>")?;
                println!("{}", format!("> {}", suggestion).green());
                self.send(suggestion, true).await?;
            }
            "/new" => {
                self.app.chat.new_chat().await?;
                self.view.clear();
                self.escalation = None;
                self.welcome();
            }
            "/open" => {
                let outcome = self.app.chat.synchronizer().load_session(arg, false).await?;
                self.escalation = None;
                match outcome {
                    LoadOutcome::Welcome { .. } => {
                        self.view.clear();
                        self.welcome();
                    }
                    LoadOutcome::Loaded { .. } => self.show_thread().await,
                }
            }
            "/older" => self.older().await,
            "/list" => {
                let groups = self
                    .app
                    .chat
                    .synchronizer()
                    .sidebar(&chrono::Local::now())
                    .await?;
                console::print_groups(&groups);
            }
            "/attach" => self.attach(arg).await?,
            "/files" => self.files().await,
            "/detach" => {
                if !self.app.chat.attachments().remove(arg).await {
                    println!("{}", "Nothing removed".bright_black());
                }
            }
            "/escalate" => self.escalate().await?,
            "/speak" => {
                let message = self.message_at(arg)?;
                match self.app.chat.read_aloud(message) {
                    Ok(Some(_)) => println!("{}", "Reading aloud...".bright_black()),
                    Ok(None) => println!(
                        "{}",
                        "Read aloud is off, enable it with `ziahr settings --voice true`"
                            .bright_black()
                    ),
                    Err(e) => println!("{}", e.to_string().bright_black()),
                }
            }
            "/copy" => {
                let key = self.key_at(arg)?;
                if let Some(text) = self.view.copy_text(&key) {
                    println!("{}", text);
                }
            }
            "/up" | "/down" => {
                let key = self.key_at(arg)?;
                let state = if command == "/up" {
                    self.view.thumbs_up(&key)
                } else {
                    self.view.thumbs_down(&key)
                };
                match state {
                    Some(state) => println!("{}", format!("Feedback: {:?}", state).bright_black()),
                    None => println!("{}", "Only answers take feedback".bright_black()),
                }
            }
            "/clear" => {
                self.app.chat.clear_history().await?;
                self.view.clear();
                self.welcome();
            }
            _ => println!("{}", "Unknown command, try /help".bright_black()),
        }
        Ok(Flow::Continue)
    }

    async fn send(&mut self, text: &str, suggested: bool) -> Result<()> {
        println!("{}", "Thinking...".bright_black());
        let outcome = if suggested {
            self.app.chat.click_suggestion(text).await?
        } else {
            self.app.chat.send_message(text).await?
        };

        match outcome {
            SendOutcome::Answered {
                escalation,
                audio_url,
                ..
            } => {
                self.show_new().await;
                if let Some(url) = audio_url {
                    tracing::debug!("[ChatRepl] Answer audio at {}", url);
                }
                if let Some(pending) = escalation {
                    println!(
                        "{}",
                        "Type /escalate to send this question to HR.".bright_yellow()
                    );
                    self.escalation = Some(pending);
                }
            }
            SendOutcome::Failed { .. } => self.show_new().await,
            SendOutcome::Discarded { session_id } => {
                tracing::debug!("[ChatRepl] Dropped answer for {}", session_id);
            }
        }
        Ok(())
    }

    async fn older(&mut self) {
        match self.app.chat.synchronizer().load_older_page().await {
            PageFetch::Fetched { added, has_more, .. } => {
                let thread = self.app.chat.synchronizer().thread_snapshot().await;
                let page = self
                    .renderer
                    .render_thread(&thread.messages()[..added.min(thread.len())]);
                println!("{}", format!("--- {} earlier messages ---", page.len()).bright_black());
                for rendered in &page {
                    console::print_message(rendered);
                }
                self.view.prepend_all(page);
                if !has_more {
                    println!("{}", "(start of conversation)".bright_black());
                }
            }
            PageFetch::Exhausted => println!("{}", "No earlier messages".bright_black()),
            PageFetch::Skipped | PageFetch::Stale | PageFetch::Failed => {}
        }
    }

    async fn attach(&self, arg: &str) -> Result<()> {
        let path = Path::new(arg);
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .context("Usage: /attach <path>")?;
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Cannot read {}", path.display()))?;

        let admission = self
            .app
            .chat
            .attachments()
            .handle_upload(vec![PendingFile::new(name, bytes)])
            .await;
        if !admission.accepted.is_empty() {
            self.files().await;
        }
        Ok(())
    }

    async fn files(&self) {
        let attachments = self.app.chat.attachments().attachments().await;
        if attachments.is_empty() {
            println!("{}", "No attachments".bright_black());
        }
        for attachment in attachments {
            let status = match attachment.status {
                AttachmentStatus::Uploading => "uploading".yellow(),
                AttachmentStatus::Success => "ready".green(),
                AttachmentStatus::Error => "failed".red(),
            };
            println!(
                "  {} {} {}",
                status,
                attachment.name,
                attachment.id.bright_black()
            );
        }
    }

    async fn escalate(&mut self) -> Result<()> {
        let Some(pending) = self.escalation.take() else {
            println!("{}", "Nothing to escalate".bright_black());
            return Ok(());
        };
        self.app.chat.confirm_escalation(&pending).await?;
        self.show_new().await;
        Ok(())
    }

    /// The n-th shown message, counted from 1.
    fn message_at(&self, arg: &str) -> Result<&RenderedMessage> {
        arg.parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| self.view.items().get(i))
            .with_context(|| format!("No message #{} (1-{})", arg, self.view.len()))
    }

    fn key_at(&self, arg: &str) -> Result<String> {
        self.message_at(arg).map(|m| m.key.clone())
    }
}

fn print_help() {
    let lines = [
        ("/attach <path>", "upload a document for the next message"),
        ("/files, /detach <id>", "list or remove pending attachments"),
        ("/new", "start a new chat"),
        ("/open <id>", "switch to a chat"),
        ("/older", "show earlier messages"),
        ("/list", "list chats"),
        ("/escalate", "send the last question to HR"),
        ("/copy <n>, /up <n>, /down <n>", "copy or rate the n-th message"),
        ("/speak <n>", "read the n-th answer aloud"),
        ("/clear", "delete all chat history"),
        ("/quit", "exit"),
    ];
    for (usage, what) in lines {
        println!("  {:<32} {}", usage.bright_cyan(), what.bright_black());
    }
}

pub async fn run(app: &App) -> Result<()> {
    let mut repl = ChatRepl::new(app);

    let mut rl = Editor::new()?;
    rl.set_helper(Some(ChatHelper));

    println!("{}", "=== ZiaHR ===".bright_magenta().bold());
    println!("{}", "Ask a question, or type /help.".bright_black());
    println!();

    if let Err(e) = repl.start().await {
        eprintln!("{}", format!("Could not restore chat: {}", e).red());
    }

    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                match repl.handle(trimmed).await {
                    Ok(Flow::Quit) => break,
                    Ok(Flow::Continue) => {}
                    Err(e) => eprintln!("{}", format!("{:#}", e).red()),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type /quit to exit.".yellow());
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    app.chat.shutdown();
    println!("{}", "Goodbye!".bright_green());
    Ok(())
}
