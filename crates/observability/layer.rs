use std::collections::BTreeMap;

use chrono::Utc;
use tracing::{
    Event, Subscriber,
    field::{Field, Visit},
};
use tracing_subscriber::{Layer, layer::Context, registry::LookupSpan};

use super::{
    config::ServiceLabels,
    notifier::{AlertDispatcher, AlertEvent},
};

/// Events logged by the alert pipeline itself; never forwarded.
const SELF_TARGET: &str = "observability::alerts";

/// Forwards every event that passes its level filter to the alert dispatcher.
pub(crate) struct AlertLayer {
    dispatcher: AlertDispatcher,
    labels: ServiceLabels,
}

impl AlertLayer {
    pub(crate) fn new(dispatcher: AlertDispatcher, labels: ServiceLabels) -> Self {
        Self { dispatcher, labels }
    }
}

#[derive(Default)]
struct RedactingVisitor {
    fields: BTreeMap<String, String>,
}

impl RedactingVisitor {
    fn insert(&mut self, field: &Field, value: String) {
        let name = field.name();
        let value = if is_sensitive_field(name) {
            "[REDACTED]".to_string()
        } else {
            value
        };
        self.fields.insert(name.to_string(), value);
    }
}

impl Visit for RedactingVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.insert(field, format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, value.to_string());
    }
}

impl<S> Layer<S> for AlertLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if metadata.target() == SELF_TARGET {
            return;
        }

        let mut visitor = RedactingVisitor::default();
        event.record(&mut visitor);
        let message = visitor.fields.remove("message").map(|raw| unquote(&raw));

        let span_path = ctx
            .event_scope(event)
            .map(|scope| {
                scope
                    .from_root()
                    .map(|span| span.metadata().name().to_string())
                    .collect()
            })
            .unwrap_or_default();

        self.dispatcher.try_dispatch(AlertEvent {
            level: *metadata.level(),
            timestamp: Utc::now(),
            service_name: self.labels.service_name.clone(),
            environment: self.labels.environment.clone(),
            component: self.labels.component.clone(),
            target: metadata.target().to_string(),
            location: metadata
                .file()
                .zip(metadata.line())
                .map(|(file, line)| format!("{file}:{line}")),
            message,
            fields: visitor.fields,
            span_path,
        });
    }
}

fn unquote(input: &str) -> String {
    let trimmed = input.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(trimmed)
        .to_string()
}

/// Credentials and subscriber PII (phone numbers, message bodies) stay out of chat alerts.
fn is_sensitive_field(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    const SECRET_MARKERS: [&str; 6] = [
        "secret",
        "password",
        "token",
        "authorization",
        "signature",
        "webhook",
    ];

    SECRET_MARKERS.iter().any(|marker| name.contains(marker))
        || name.contains("phone")
        || matches!(name.as_str(), "to" | "from" | "body" | "to_number")
}
