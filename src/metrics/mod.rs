// Prometheus metrics for classification and escalation

use anyhow::{Context, Result};
use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use sha2::{Digest, Sha256};

use crate::crisis::Classification;
use crate::escalation::EscalationOutcome;

/// Counters exposed at `GET /metrics`
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    classifications: IntCounterVec,
    escalations: IntCounterVec,
    notifications: IntCounterVec,
    active_sessions: IntGauge,
}

impl Metrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let classifications = IntCounterVec::new(
            Opts::new(
                "solace_classifications_total",
                "Messages classified, by verdict",
            ),
            &["verdict"],
        )?;
        let escalations = IntCounterVec::new(
            Opts::new(
                "solace_escalations_total",
                "Crisis escalations, by booking result",
            ),
            &["booking"],
        )?;
        let notifications = IntCounterVec::new(
            Opts::new(
                "solace_notifications_total",
                "Crisis notifications, by delivery status",
            ),
            &["status"],
        )?;
        let active_sessions =
            IntGauge::new("solace_sessions", "Sessions held in memory")?;

        registry.register(Box::new(classifications.clone()))?;
        registry.register(Box::new(escalations.clone()))?;
        registry.register(Box::new(notifications.clone()))?;
        registry.register(Box::new(active_sessions.clone()))?;

        Ok(Self {
            registry,
            classifications,
            escalations,
            notifications,
            active_sessions,
        })
    }

    pub fn record_classification(&self, classification: &Classification) {
        let verdict = if classification.is_crisis { "crisis" } else { "safe" };
        self.classifications.with_label_values(&[verdict]).inc();
    }

    pub fn record_escalation(&self, outcome: &EscalationOutcome) {
        self.escalations
            .with_label_values(&[outcome.booking_label()])
            .inc();
        self.notifications
            .with_label_values(&[outcome.notification.as_str()])
            .inc();
    }

    pub fn set_active_sessions(&self, count: usize) {
        self.active_sessions.set(count as i64);
    }

    /// Prometheus text exposition format
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .context("Failed to encode metrics")?;
        String::from_utf8(buffer).context("Metrics output was not UTF-8")
    }
}

/// Short SHA-256 fingerprint of user text, for correlating log lines
/// without recording the text itself
pub fn fingerprint(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    format!("{:x}", digest)[..16].to_string()
}
