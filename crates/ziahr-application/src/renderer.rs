//! Projection of the message log into displayable messages.
//!
//! Rendering is pure: the same messages always give the same output, and the
//! view is keyed by message id so re-rendering never duplicates anything.

use chrono::{DateTime, Local};
use pulldown_cmark::{html, Event, Options, Parser, TagEnd};
use ziahr_core::session::{Message, MessageType};

/// Thumbs feedback of one bot message. Up and down are mutually exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FeedbackState {
    #[default]
    None,
    Up,
    Down,
}

impl FeedbackState {
    /// Pressing the active thumb again clears it.
    pub fn press_up(self) -> Self {
        match self {
            Self::Up => Self::None,
            _ => Self::Up,
        }
    }

    pub fn press_down(self) -> Self {
        match self {
            Self::Down => Self::None,
            _ => Self::Down,
        }
    }
}

/// Controls shown under bot and system messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedbackControls {
    pub feedback: FeedbackState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    /// Message id; unique within a view.
    pub key: String,
    pub message_type: MessageType,
    pub html: String,
    /// Plain text, what the copy control yields.
    pub text_content: String,
    /// Local time of day, empty when the timestamp is unreadable.
    pub timestamp_label: String,
    /// `None` for user messages.
    pub controls: Option<FeedbackControls>,
}

/// Where a rendered message goes in the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    Append,
    Prepend,
}

#[derive(Debug, Clone)]
pub struct MessageRenderer {
    options: Options,
}

impl Default for MessageRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageRenderer {
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        Self { options }
    }

    pub fn render(&self, message: &Message) -> RenderedMessage {
        let (html, text_content) = if message.message_type.is_markdown() {
            (self.markdown_html(&message.content), self.markdown_text(&message.content))
        } else {
            (
                format!("<p>{}</p>", escape_html(&message.content).replace('\n', "<br>")),
                message.content.clone(),
            )
        };

        RenderedMessage {
            key: message.id.clone(),
            message_type: message.message_type,
            html,
            text_content,
            timestamp_label: timestamp_label(&message.timestamp),
            controls: message
                .message_type
                .is_markdown()
                .then(FeedbackControls::default),
        }
    }

    pub fn render_thread(&self, messages: &[Message]) -> Vec<RenderedMessage> {
        messages.iter().map(|m| self.render(m)).collect()
    }

    fn markdown_html(&self, content: &str) -> String {
        let mut out = String::with_capacity(content.len() * 3 / 2);
        html::push_html(&mut out, Parser::new_ext(content, self.options));
        out
    }

    fn markdown_text(&self, content: &str) -> String {
        let mut text = String::new();
        for event in Parser::new_ext(content, self.options) {
            match event {
                Event::Text(t) | Event::Code(t) => text.push_str(&t),
                Event::Html(raw) => text.push_str(&strip_tags(&raw)),
                Event::SoftBreak => text.push(' '),
                Event::HardBreak => text.push('\n'),
                Event::End(TagEnd::Paragraph)
                | Event::End(TagEnd::Heading(_))
                | Event::End(TagEnd::Item)
                | Event::End(TagEnd::CodeBlock)
                | Event::End(TagEnd::TableRow)
                | Event::End(TagEnd::TableHead) => text.push('\n'),
                _ => {}
            }
        }

        text.lines()
            .map(str::trim_end)
            .filter(|line| !line.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Rendered messages of the shown thread, unique by key.
#[derive(Debug, Clone, Default)]
pub struct ThreadView {
    items: Vec<RenderedMessage>,
}

impl ThreadView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[RenderedMessage] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Inserts `rendered`; an existing key is replaced in place.
    pub fn insert(&mut self, rendered: RenderedMessage, position: InsertPosition) {
        if let Some(existing) = self.items.iter_mut().find(|m| m.key == rendered.key) {
            let feedback = existing.controls;
            *existing = rendered;
            if existing.controls.is_some() {
                existing.controls = feedback.or(existing.controls);
            }
            return;
        }

        match position {
            InsertPosition::Append => self.items.push(rendered),
            InsertPosition::Prepend => self.items.insert(0, rendered),
        }
    }

    /// Inserts an older page before everything shown, keeping its order.
    pub fn prepend_all(&mut self, page: Vec<RenderedMessage>) {
        for rendered in page.into_iter().rev() {
            self.insert(rendered, InsertPosition::Prepend);
        }
    }

    /// Text the copy control puts on the clipboard.
    pub fn copy_text(&self, key: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|m| m.key == key)
            .map(|m| m.text_content.as_str())
    }

    pub fn thumbs_up(&mut self, key: &str) -> Option<FeedbackState> {
        self.press(key, FeedbackState::press_up)
    }

    pub fn thumbs_down(&mut self, key: &str) -> Option<FeedbackState> {
        self.press(key, FeedbackState::press_down)
    }

    fn press(&mut self, key: &str, f: fn(FeedbackState) -> FeedbackState) -> Option<FeedbackState> {
        let controls = self
            .items
            .iter_mut()
            .find(|m| m.key == key)?
            .controls
            .as_mut()?;
        controls.feedback = f(controls.feedback);
        Some(controls.feedback)
    }
}

fn timestamp_label(timestamp: &str) -> String {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|ts| ts.with_timezone(&Local).format("%H:%M").to_string())
        .unwrap_or_default()
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Text of an HTML fragment: tags dropped, block ends as newlines.
fn strip_tags(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut tag = String::new();
    let mut in_tag = false;

    for c in raw.chars() {
        match (in_tag, c) {
            (false, '<') => {
                in_tag = true;
                tag.clear();
            }
            (true, '>') => {
                in_tag = false;
                let name = tag.trim_start_matches('/').to_ascii_lowercase();
                let name = name.split_whitespace().next().unwrap_or_default();
                if matches!(name, "p" | "br" | "br/" | "li" | "tr" | "h1" | "h2" | "h3" | "div")
                    && (tag.starts_with('/') || name.starts_with("br"))
                {
                    out.push('\n');
                }
            }
            (true, _) => tag.push(c),
            (false, _) => out.push(c),
        }
    }

    decode_entities(&out)
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_id(mut message: Message, id: &str) -> Message {
        message.id = id.to_string();
        message
    }

    #[test]
    fn test_user_text_is_never_markdown() {
        let renderer = MessageRenderer::new();
        let rendered = renderer.render(&Message::user("**bold** <script>alert(1)</script>"));

        assert_eq!(
            rendered.html,
            "<p>**bold** &lt;script&gt;alert(1)&lt;/script&gt;</p>"
        );
        assert_eq!(rendered.text_content, "**bold** <script>alert(1)</script>");
        assert!(rendered.controls.is_none());
    }

    #[test]
    fn test_bot_markdown_with_table() {
        let renderer = MessageRenderer::new();
        let rendered = renderer.render(&Message::bot(
            "**Leave types**\n\n| Type | Days |\n|---|---|\n| Annual | 20 |\n\n~~old~~",
        ));

        assert!(rendered.html.contains("<strong>Leave types</strong>"));
        assert!(rendered.html.contains("<table>"));
        assert!(rendered.html.contains("<del>old</del>"));
        assert!(!rendered.text_content.contains('<'));
        assert!(rendered.text_content.contains("Annual20"));
        assert_eq!(rendered.controls, Some(FeedbackControls::default()));
    }

    #[test]
    fn test_copy_yields_text_of_server_html() {
        let renderer = MessageRenderer::new();
        let rendered = renderer.render(&Message::bot(
            "<p>You get <strong>20 days</strong> &amp; carry-over.</p>",
        ));

        assert_eq!(rendered.text_content, "You get 20 days & carry-over.");
    }

    #[test]
    fn test_render_thread_twice_has_no_duplicates() {
        let renderer = MessageRenderer::new();
        let messages = vec![
            with_id(Message::user("Hi"), "m1"),
            with_id(Message::bot("Hello"), "m2"),
        ];

        let mut view = ThreadView::new();
        for _ in 0..2 {
            for rendered in renderer.render_thread(&messages) {
                view.insert(rendered, InsertPosition::Append);
            }
        }

        assert_eq!(view.len(), 2);
        assert_eq!(view.items()[0].key, "m1");
    }

    #[test]
    fn test_prepend_keeps_page_order() {
        let renderer = MessageRenderer::new();
        let mut view = ThreadView::new();
        view.insert(
            renderer.render(&with_id(Message::user("newest"), "m3")),
            InsertPosition::Append,
        );

        view.prepend_all(renderer.render_thread(&[
            with_id(Message::user("oldest"), "m1"),
            with_id(Message::bot("middle"), "m2"),
        ]));

        let keys: Vec<&str> = view.items().iter().map(|m| m.key.as_str()).collect();
        assert_eq!(keys, vec!["m1", "m2", "m3"]);
    }

    #[test]
    fn test_thumbs_are_exclusive_and_toggle() {
        let renderer = MessageRenderer::new();
        let mut view = ThreadView::new();
        view.insert(
            renderer.render(&with_id(Message::bot("Answer"), "b1")),
            InsertPosition::Append,
        );
        view.insert(
            renderer.render(&with_id(Message::user("Question"), "u1")),
            InsertPosition::Append,
        );

        assert_eq!(view.thumbs_up("b1"), Some(FeedbackState::Up));
        assert_eq!(view.thumbs_down("b1"), Some(FeedbackState::Down));
        assert_eq!(view.thumbs_down("b1"), Some(FeedbackState::None));
        assert_eq!(view.thumbs_up("u1"), None);
        assert_eq!(view.copy_text("b1"), Some("Answer"));
    }

    #[test]
    fn test_rerender_keeps_feedback() {
        let renderer = MessageRenderer::new();
        let message = with_id(Message::bot("Answer"), "b1");
        let mut view = ThreadView::new();
        view.insert(renderer.render(&message), InsertPosition::Append);
        view.thumbs_up("b1");

        view.insert(renderer.render(&message), InsertPosition::Append);

        assert_eq!(
            view.items()[0].controls.map(|c| c.feedback),
            Some(FeedbackState::Up)
        );
    }

    #[test]
    fn test_invalid_timestamp_has_empty_label() {
        let mut message = Message::user("Hi");
        message.timestamp = "yesterday".to_string();
        assert_eq!(MessageRenderer::new().render(&message).timestamp_label, "");
    }
}
