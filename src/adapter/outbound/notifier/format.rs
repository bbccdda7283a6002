//! Alert line formatting.

use crate::port::outbound::notifier::Event;

/// Largest message body most chat webhooks accept.
pub const MAX_CONTENT_CHARS: usize = 2000;

/// One alert line: `[TAG] {json}`.
#[must_use]
pub fn format_event_line(event: &Event) -> String {
    let payload = serde_json::to_string(event)
        .unwrap_or_else(|err| format!("{{\"error\":\"unserializable event: {err}\"}}"));
    format!("[{}] {payload}", event.tag())
}

/// Join lines into one message body, cut to [`MAX_CONTENT_CHARS`].
#[must_use]
pub fn join_batch(lines: &[String]) -> String {
    let content = lines.join("\n");
    match content.char_indices().nth(MAX_CONTENT_CHARS) {
        Some((idx, _)) => content[..idx].to_string(),
        None => content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn line_carries_tag_and_kind() {
        let line = format_event_line(&Event::FeedRejected {
            market_id: "m1".into(),
            reason: "crossed book".into(),
        });
        assert!(line.starts_with("[FEED] {"));
        assert!(line.contains(r#""kind":"feed_rejected""#));
        assert!(line.contains("crossed book"));
    }

    #[test]
    fn daily_reset_serializes_pnl() {
        let line = format_event_line(&Event::DailyReset {
            date: chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            realized_pnl: dec!(-12.5),
        });
        assert!(line.starts_with("[RESET]"));
        assert!(line.contains("2024-05-01"));
        assert!(line.contains("-12.5"));
    }

    #[test]
    fn batch_is_capped() {
        let lines = vec!["x".repeat(1500), "y".repeat(1500)];
        let content = join_batch(&lines);
        assert_eq!(content.chars().count(), MAX_CONTENT_CHARS);
    }
}
