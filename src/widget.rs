//! Polling toggle widget.
//!
//! A [`ToggleWidget`] keeps the last probed state of some external system in
//! a [`StateStore`], re-probes it on a timer, and lets a click run an action
//! followed by an immediate re-probe. Every published state ends up as one
//! rendered [`Segment`] pushed to the widget's [`Sink`].

use crate::segment::{ClickEvent, ClickFuture, ClickHandler, Segment, Sink};
use crate::state_store::StateStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

/// Shortest polling period a widget will run with
pub const MIN_INTERVAL: Duration = Duration::from_millis(50);

/// The three capabilities a toggle needs from whatever it controls
#[async_trait::async_trait]
pub trait Toggleable: Send + Sync + 'static {
    /// Short identifier used in logs and as the i3bar block name
    fn label(&self) -> &str;

    /// Reads the current external state. Failures come back as an empty
    /// or otherwise unrecognised string, never as an error.
    async fn probe(&self) -> String;

    /// Changes the external state. Errors are swallowed.
    async fn act(&self);

    /// Turns a state into bar output. Must handle any string.
    fn render(&self, state: &str) -> Segment;
}

pub struct ToggleWidget<T: Toggleable + ?Sized> {
    source: Arc<T>,
    store: StateStore,
    interval: Duration,
}

impl<T: Toggleable + ?Sized> Clone for ToggleWidget<T> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            store: self.store.clone(),
            interval: self.interval,
        }
    }
}

impl<T: Toggleable> ToggleWidget<T> {
    pub fn new(source: T, interval: Duration) -> Self {
        Self::from_arc(Arc::new(source), interval)
    }
}

impl<T: Toggleable + ?Sized> ToggleWidget<T> {
    /// Builds a widget around a shared source. Intervals below
    /// [`MIN_INTERVAL`] are raised to it.
    pub fn from_arc(source: Arc<T>, interval: Duration) -> Self {
        Self {
            source,
            store: StateStore::new(),
            interval: interval.max(MIN_INTERVAL),
        }
    }

    pub fn label(&self) -> &str {
        self.source.label()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Probes the source and publishes the result
    pub async fn refresh(&self) {
        let state = self.source.probe().await;
        debug!("Probed '{}': {:?}", self.source.label(), state);
        self.store.set(state);
    }

    /// Runs the action, then re-probes without waiting for the timer.
    /// The new state is published before this returns.
    pub async fn click(&self, event: ClickEvent) {
        debug!(
            "Click on '{}' (button {})",
            self.source.label(),
            event.button
        );
        self.source.act().await;
        self.refresh().await;
    }

    /// Handler that performs [`ToggleWidget::click`] on this widget
    pub fn click_handler(&self) -> ClickHandler {
        let widget = self.clone();
        Arc::new(move |event: ClickEvent| -> ClickFuture {
            let widget = widget.clone();
            Box::pin(async move { widget.click(event).await })
        })
    }

    /// Renders `state` with this widget's click handler attached
    pub fn render(&self, state: &str) -> Segment {
        self.source.render(state).on_click(self.click_handler())
    }

    /// Main loop: probe once, emit, then emit again after every published
    /// state until the sink goes away.
    ///
    /// A timer tick only re-probes and publishes; the publish comes back
    /// through this widget's own subscription and produces the emission, so
    /// each tick or click yields exactly one segment.
    pub async fn run<S: Sink>(&self, mut sink: S) {
        self.refresh().await;

        let mut subscription = self.store.subscribe();
        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut state = self.store.get();
        if sink.output(self.render(&state)).await.is_err() {
            debug!("Sink for '{}' closed before first output", self.label());
            return;
        }

        loop {
            tokio::select! {
                biased;

                changed = subscription.changed() => {
                    if !changed {
                        break;
                    }
                    state = self.store.get();
                    if sink.output(self.render(&state)).await.is_err() {
                        debug!("Sink for '{}' closed, stopping widget", self.label());
                        break;
                    }
                }
                _ = ticker.tick() => {
                    self.refresh().await;
                }
            }
        }
    }
}
