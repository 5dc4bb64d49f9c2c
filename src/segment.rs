use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::{fmt, future::Future, pin::Pin, sync::Arc};
use tokio::sync::mpsc;

pub type ClickFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Callback attached to a segment, invoked with the click that hit it
pub type ClickHandler = Arc<dyn Fn(ClickEvent) -> ClickFuture + Send + Sync>;

/// A click reported by i3bar/swaybar on stdin
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ClickEvent {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub instance: Option<String>,
    pub button: u32,
    #[serde(default)]
    pub modifiers: Vec<String>,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    #[serde(default)]
    pub relative_x: i32,
    #[serde(default)]
    pub relative_y: i32,
    #[serde(default)]
    pub width: i32,
    #[serde(default)]
    pub height: i32,
}

/// One block of bar output
#[derive(Clone, Default, Serialize)]
pub struct Segment {
    pub full_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markup: Option<String>,
    #[serde(skip)]
    pub on_click: Option<ClickHandler>,
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segment")
            .field("full_text", &self.full_text)
            .field("short_text", &self.short_text)
            .field("color", &self.color)
            .field("name", &self.name)
            .field("instance", &self.instance)
            .field("markup", &self.markup)
            .field("on_click", &self.on_click.is_some())
            .finish()
    }
}

impl Segment {
    pub fn text(full_text: impl Into<String>) -> Self {
        Self {
            full_text: full_text.into(),
            ..Default::default()
        }
    }

    /// Segment whose text is Pango markup
    pub fn pango(markup: impl Into<String>) -> Self {
        Self {
            full_text: markup.into(),
            markup: Some("pango".to_string()),
            ..Default::default()
        }
    }

    pub fn short_text(mut self, short_text: impl Into<String>) -> Self {
        self.short_text = Some(short_text.into());
        self
    }

    pub fn color(mut self, color: Option<&str>) -> Self {
        self.color = color.map(str::to_string);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    pub fn on_click(mut self, handler: ClickHandler) -> Self {
        self.on_click = Some(handler);
        self
    }

    /// Invokes the click handler, if any, and waits for it to finish
    pub async fn click(&self, event: ClickEvent) {
        if let Some(handler) = &self.on_click {
            handler(event).await;
        }
    }
}

/// Wraps `text` in a Pango span with the given foreground color
pub fn pango_span(text: &str, color: Option<&str>) -> String {
    let text = escape_markup(text);
    match color {
        Some(color) => format!("<span foreground=\"{}\">{}</span>", color, text),
        None => text,
    }
}

pub fn escape_markup(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Destination for the segments a widget produces
#[async_trait::async_trait]
pub trait Sink: Send {
    /// Pushes a segment for display. An error means the consumer is gone.
    async fn output(&mut self, segment: Segment) -> Result<()>;
}

#[async_trait::async_trait]
impl Sink for mpsc::Sender<Segment> {
    async fn output(&mut self, segment: Segment) -> Result<()> {
        self.send(segment)
            .await
            .map_err(|_| anyhow!("segment receiver closed"))
    }
}

#[async_trait::async_trait]
impl Sink for mpsc::UnboundedSender<Segment> {
    async fn output(&mut self, segment: Segment) -> Result<()> {
        self.send(segment)
            .map_err(|_| anyhow!("segment receiver closed"))
    }
}
