//! Chat webhook alerts.
//!
//! Events are formatted on the caller's thread and queued on an unbounded
//! channel; a background worker posts them in batches, at most one post per
//! throttle period. Delivery failures are logged and dropped. When posts
//! fall behind, the worker keeps the newest [`MAX_BUFFERED_LINES`] lines.

use std::collections::VecDeque;
use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::format::{format_event_line, join_batch};
use crate::port::outbound::notifier::{AlertLevel, Event, Notifier};

/// Webhook delivery settings.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub url: String,
    /// Lines per post.
    pub batch_size: usize,
    /// Minimum gap between posts.
    pub throttle: Duration,
    /// Events below this level are not sent.
    pub min_level: AlertLevel,
    pub timeout: Duration,
}

/// Pending lines held by the worker before the oldest are dropped.
pub const MAX_BUFFERED_LINES: usize = 1000;

#[derive(Serialize)]
struct WebhookBody<'a> {
    content: &'a str,
}

/// Notifier that posts batched alert lines to a webhook.
pub struct WebhookNotifier {
    sender: mpsc::UnboundedSender<String>,
    min_level: AlertLevel,
}

impl WebhookNotifier {
    /// Create the notifier and spawn its delivery worker.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn new(config: WebhookConfig) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let min_level = config.min_level;
        tokio::spawn(webhook_worker(config, receiver));
        Self { sender, min_level }
    }
}

impl Notifier for WebhookNotifier {
    fn notify(&self, event: Event) {
        if event.level() < self.min_level {
            return;
        }
        if self.sender.send(format_event_line(&event)).is_err() {
            warn!("Webhook notifier channel closed");
        }
    }
}

async fn post(http: &HttpClient, url: &str, lines: &[String]) {
    let content = join_batch(lines);
    let result = http
        .post(url)
        .json(&WebhookBody { content: &content })
        .send()
        .await
        .and_then(reqwest::Response::error_for_status);
    match result {
        Ok(_) => debug!(lines = lines.len(), "Alert batch delivered"),
        Err(err) => warn!(error = %err, lines = lines.len(), "Failed to deliver alert batch"),
    }
}

/// Drain up to `batch_size` lines from the front of the buffer.
fn take_batch(buffer: &mut VecDeque<String>, batch_size: usize) -> Vec<String> {
    let n = batch_size.max(1).min(buffer.len());
    buffer.drain(..n).collect()
}

/// Append a line, evicting from the front to stay within `cap`.
/// Returns how many lines were evicted.
fn push_bounded(buffer: &mut VecDeque<String>, line: String, cap: usize) -> usize {
    let mut dropped = 0;
    while buffer.len() >= cap.max(1) {
        buffer.pop_front();
        dropped += 1;
    }
    buffer.push_back(line);
    dropped
}

fn report_dropped(dropped: &mut usize) {
    if *dropped > 0 {
        warn!(dropped = *dropped, "Alert buffer full, oldest lines dropped");
        *dropped = 0;
    }
}

async fn webhook_worker(config: WebhookConfig, mut receiver: mpsc::UnboundedReceiver<String>) {
    let http = HttpClient::builder()
        .timeout(config.timeout)
        .build()
        .unwrap_or_else(|err| {
            warn!(error = %err, "Failed to build HTTP client, using defaults");
            HttpClient::new()
        });
    let mut buffer: VecDeque<String> = VecDeque::new();
    let mut dropped = 0usize;
    let mut ticker = tokio::time::interval(config.throttle.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(batch_size = config.batch_size, "Webhook notifier started");

    loop {
        tokio::select! {
            line = receiver.recv() => match line {
                Some(line) => dropped += push_bounded(&mut buffer, line, MAX_BUFFERED_LINES),
                None => break,
            },
            _ = ticker.tick(), if !buffer.is_empty() => {
                report_dropped(&mut dropped);
                let batch = take_batch(&mut buffer, config.batch_size);
                post(&http, &config.url, &batch).await;
            }
        }
    }

    report_dropped(&mut dropped);
    while !buffer.is_empty() {
        let batch = take_batch(&mut buffer, config.batch_size);
        post(&http, &config.url, &batch).await;
    }
    warn!("Webhook notifier worker shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::http::StubServer;

    #[test]
    fn take_batch_respects_size() {
        let mut buffer: VecDeque<String> = (0..7).map(|i| i.to_string()).collect();
        assert_eq!(take_batch(&mut buffer, 5).len(), 5);
        assert_eq!(take_batch(&mut buffer, 5), vec!["5", "6"]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn full_buffer_drops_oldest_lines() {
        let mut buffer = VecDeque::new();
        let dropped: usize = (0..5)
            .map(|i| push_bounded(&mut buffer, i.to_string(), 3))
            .sum();
        assert_eq!(dropped, 2);
        assert_eq!(buffer, VecDeque::from(["2".to_string(), "3".into(), "4".into()]));
    }

    #[tokio::test]
    async fn batches_are_posted_as_content() {
        let server = StubServer::respond(204, "").await;
        let notifier = WebhookNotifier::new(WebhookConfig {
            url: server.url(),
            batch_size: 5,
            throttle: Duration::from_millis(10),
            min_level: AlertLevel::Info,
            timeout: Duration::from_secs(1),
        });

        notifier.notify(Event::Startup {
            markets: 2,
            mode: "simulation".into(),
        });
        // Below the minimum level; never sent.
        notifier.notify(Event::FeedRejected {
            market_id: "m1".into(),
            reason: "x".into(),
        });

        let body = server.wait_for_body(Duration::from_secs(2)).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        let content = value["content"].as_str().unwrap();
        assert!(content.starts_with("[HEALTH]"));
        assert!(!content.contains("FEED"));
    }
}
