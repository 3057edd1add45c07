use opentelemetry::{KeyValue, metrics::UpDownCounter};
use std::sync::LazyLock;

static STATDS: LazyLock<UpDownCounter<i64>> = LazyLock::new(|| {
    logfire::i64_up_down_counter("inbox_statds")
        .with_description("Inbox app statistics")
        .with_unit("event")
        .build()
});

fn incr_statds(metric: String, value: String) {
    STATDS.add(1, &[KeyValue::new(metric, value)]);
}

pub fn incr_webhook_statds(outcome: &str) {
    incr_statds("webhook".to_string(), outcome.into())
}

pub fn incr_conversation_status_statds(status: &str) {
    incr_statds("conversation_status".to_string(), status.into())
}

pub fn incr_message_statds(direction: &str) {
    incr_statds("message".to_string(), direction.into())
}
