// Escalation inputs and outcomes

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::crisis::{CrisisCategory, CrisisLevel};
use crate::services::{Appointment, Therapist};

/// Who and where the crisis message came from
#[derive(Debug, Clone)]
pub struct EscalationContext {
    pub user_id: String,
    pub session_id: String,
}

/// Time bounds for each collaborator call
#[derive(Debug, Clone)]
pub struct EscalationSettings {
    pub lookup_timeout: Duration,
    pub booking_timeout: Duration,
    /// Longest the response waits on email delivery. Delivery continues in
    /// the background afterwards.
    pub notify_timeout: Duration,
    /// Operations inbox copied on every crisis notification
    pub ops_email: Option<String>,
}

impl Default for EscalationSettings {
    fn default() -> Self {
        Self {
            lookup_timeout: Duration::from_secs(3),
            booking_timeout: Duration::from_secs(5),
            notify_timeout: Duration::from_secs(2),
            ops_email: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationStatus {
    Sent,
    Failed,
    TimedOut,
    /// Nobody to notify
    Skipped,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationStatus::Sent => "sent",
            NotificationStatus::Failed => "failed",
            NotificationStatus::TimedOut => "timed_out",
            NotificationStatus::Skipped => "skipped",
        }
    }
}

/// Result of one escalation attempt
#[derive(Debug, Clone)]
pub struct EscalationOutcome {
    pub escalation_id: String,
    /// Supportive message shown to the user
    pub text: String,
    pub crisis_level: CrisisLevel,
    pub crisis_type: CrisisCategory,
    /// Therapist the urgent appointment was booked with
    pub therapist: Option<Therapist>,
    pub appointment: Option<Appointment>,
    pub urgency_minutes: i64,
    pub notification: NotificationStatus,
    pub appointment_error: Option<String>,
}

impl EscalationOutcome {
    pub fn therapist_assigned(&self) -> Option<&str> {
        self.therapist.as_ref().map(|t| t.id.as_str())
    }

    pub fn appointment_scheduled(&self) -> Option<DateTime<Utc>> {
        self.appointment.as_ref().map(|a| a.scheduled_time)
    }

    /// Label for the booking metric
    pub fn booking_label(&self) -> &'static str {
        match (&self.appointment, &self.appointment_error) {
            (Some(_), _) => "booked",
            (None, Some(_)) => "failed",
            (None, None) => "no_therapist",
        }
    }
}
