//! i3bar / swaybar protocol driver.
//!
//! Each widget owns one slot of the bar and writes into it through a
//! [`SlotSink`]. Whenever a slot changes the full status line is printed
//! again. Click events come back on stdin and are routed by block
//! `instance` to the handler of the segment last shown in that slot.

use crate::segment::{ClickEvent, ClickHandler, Segment, Sink};
use crate::widget::{ToggleWidget, Toggleable};
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::sync::{Arc, RwLock};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// First line of the protocol
#[derive(Debug, Clone, Serialize)]
pub struct Header {
    pub version: u8,
    pub click_events: bool,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            version: 1,
            click_events: true,
        }
    }
}

/// New output for one slot of the bar
#[derive(Debug)]
pub struct SlotUpdate {
    pub index: usize,
    pub segment: Segment,
}

/// Sink handed to the widget that owns slot `index`
#[derive(Debug, Clone)]
pub struct SlotSink {
    index: usize,
    tx: mpsc::Sender<SlotUpdate>,
}

impl SlotSink {
    pub fn new(index: usize, tx: mpsc::Sender<SlotUpdate>) -> Self {
        Self { index, tx }
    }
}

#[async_trait::async_trait]
impl Sink for SlotSink {
    async fn output(&mut self, segment: Segment) -> Result<()> {
        let segment = segment.instance(self.index.to_string());
        self.tx
            .send(SlotUpdate {
                index: self.index,
                segment,
            })
            .await
            .map_err(|_| anyhow!("bar for slot {} has stopped", self.index))
    }
}

/// Click handlers of the segments currently on screen, by slot
#[derive(Clone, Default)]
pub struct ClickRouter {
    handlers: Arc<RwLock<Vec<Option<ClickHandler>>>>,
}

impl ClickRouter {
    pub fn new(slots: usize) -> Self {
        Self {
            handlers: Arc::new(RwLock::new(vec![None; slots])),
        }
    }

    pub fn set(&self, index: usize, handler: Option<ClickHandler>) {
        match self.handlers.write() {
            Ok(mut handlers) => {
                if index >= handlers.len() {
                    handlers.resize(index + 1, None);
                }
                handlers[index] = handler;
            }
            Err(e) => {
                warn!("Failed to store click handler for slot {}: {}", index, e);
            }
        }
    }

    /// Looks up the handler for the event's slot
    pub fn handler_for(&self, event: &ClickEvent) -> Option<ClickHandler> {
        let index: usize = event.instance.as_deref()?.parse().ok()?;
        match self.handlers.read() {
            Ok(handlers) => handlers.get(index).cloned().flatten(),
            Err(e) => {
                warn!("Failed to read click handlers: {}", e);
                None
            }
        }
    }

    /// Runs the matching handler on its own task. Returns false if no
    /// segment claims the event.
    pub fn dispatch(&self, event: ClickEvent) -> bool {
        match self.handler_for(&event) {
            Some(handler) => {
                tokio::spawn(handler(event));
                true
            }
            None => {
                debug!("No handler for click on {:?}/{:?}", event.name, event.instance);
                false
            }
        }
    }
}

/// Writes the protocol header and status lines
pub struct StatusWriter<W> {
    writer: W,
    lines_written: usize,
}

impl<W: AsyncWrite + Unpin> StatusWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            lines_written: 0,
        }
    }

    /// Writes the header and opens the infinite array of status lines
    pub async fn start(&mut self, header: &Header) -> Result<()> {
        let header = serde_json::to_string(header)?;
        self.writer.write_all(header.as_bytes()).await?;
        self.writer.write_all(b"\n[\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    pub async fn line(&mut self, segments: &[&Segment]) -> Result<()> {
        let mut line = if self.lines_written == 0 {
            String::new()
        } else {
            String::from(",")
        };
        line.push_str(&serde_json::to_string(segments)?);
        line.push('\n');

        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;
        self.lines_written += 1;
        Ok(())
    }
}

/// Parses one line of the click event stream.
///
/// The stream is an endless JSON array, so the opening `[` and the commas
/// between events are stripped. Returns `None` for lines carrying no event.
pub fn parse_click_line(line: &str) -> Option<Result<ClickEvent>> {
    let trimmed = line.trim().trim_start_matches(['[', ',']).trim_end_matches(',');
    let trimmed = trimmed.trim();
    if trimmed.is_empty() || trimmed == "]" {
        return None;
    }
    Some(serde_json::from_str(trimmed).with_context(|| format!("invalid click event: {}", trimmed)))
}

/// Reads click events until the input closes, dispatching each one.
///
/// Lines that are not valid UTF-8 or not a click event are skipped; only a
/// read error ends the loop early.
pub async fn read_clicks<R: AsyncBufRead + Unpin>(reader: R, router: ClickRouter) -> Result<()> {
    let mut lines = reader.split(b'\n');
    while let Some(bytes) = lines.next_segment().await? {
        let line = String::from_utf8_lossy(&bytes);
        match parse_click_line(&line) {
            Some(Ok(event)) => {
                debug!("Click event: {:?}", event);
                router.dispatch(event);
            }
            Some(Err(e)) => warn!("Skipping click input: {:#}", e),
            None => {}
        }
    }
    debug!("Click input closed");
    Ok(())
}

/// Runs every widget in its own slot and drives the bar until all widgets
/// stop or output can no longer be written.
pub async fn run_bar<W, R>(
    widgets: Vec<ToggleWidget<dyn Toggleable>>,
    writer: W,
    reader: R,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let slot_count = widgets.len();
    let router = ClickRouter::new(slot_count);
    let (tx, mut rx) = mpsc::channel::<SlotUpdate>(slot_count.max(1) * 4);

    let mut status = StatusWriter::new(writer);
    status.start(&Header::default()).await?;

    for (index, widget) in widgets.into_iter().enumerate() {
        info!(
            "Starting widget '{}' in slot {} (every {:?})",
            widget.label(),
            index,
            widget.interval()
        );
        let sink = SlotSink::new(index, tx.clone());
        tokio::spawn(async move { widget.run(sink).await });
    }
    drop(tx);

    let clicks = tokio::spawn(read_clicks(reader, router.clone()));

    let mut slots: Vec<Option<Segment>> = vec![None; slot_count];
    let result = async {
        while let Some(SlotUpdate { index, segment }) = rx.recv().await {
            router.set(index, segment.on_click.clone());
            if let Some(slot) = slots.get_mut(index) {
                *slot = Some(segment);
            }
            let visible: Vec<&Segment> = slots.iter().flatten().collect();
            status
                .line(&visible)
                .await
                .context("failed to write status line")?;
        }
        info!("All widgets stopped");
        Ok::<(), anyhow::Error>(())
    }
    .await;

    clicks.abort();
    result
}
