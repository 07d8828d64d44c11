// Request and response bodies for the /ai endpoints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crisis::CrisisCategory;
use crate::escalation::EscalationOutcome;

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    /// Mood rating, 1-10
    pub mood: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionResponse {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndSessionRequest {
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EndSessionResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub prompt: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Appointment summary kept for older clients
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentSummary {
    pub id: String,
    pub therapist: String,
    pub scheduled_time: DateTime<Utc>,
}

/// Fields present only on crisis responses
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrisisFields {
    pub danger: bool,
    pub reason: &'static str,
    pub crisis_detected: bool,
    pub crisis_level: u8,
    pub crisis_type: CrisisCategory,
    pub therapist_assigned: Option<String>,
    pub therapist_name: Option<String>,
    pub therapist_email: Option<String>,
    pub appointment_scheduled: Option<DateTime<Utc>>,
    pub appointment_id: Option<String>,
    pub urgency_minutes: i64,
    pub appointment: Option<AppointmentSummary>,
    pub appointment_error: Option<String>,
    /// Delivery status of the caregiver email
    pub notification: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub text: String,
    pub session_id: String,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub crisis: Option<CrisisFields>,
}

impl GenerateResponse {
    pub fn companion(text: String, session_id: String) -> Self {
        Self {
            text,
            session_id,
            crisis: None,
        }
    }

    pub fn crisis(session_id: String, outcome: EscalationOutcome) -> Self {
        let therapist = outcome.therapist.as_ref();
        let appointment = match (&outcome.appointment, therapist) {
            (Some(a), Some(t)) => Some(AppointmentSummary {
                id: a.id.clone(),
                therapist: t.name().to_string(),
                scheduled_time: a.scheduled_time,
            }),
            _ => None,
        };

        let fields = CrisisFields {
            danger: true,
            reason: "crisis",
            crisis_detected: true,
            crisis_level: outcome.crisis_level.as_number(),
            crisis_type: outcome.crisis_type,
            therapist_assigned: outcome.therapist_assigned().map(str::to_string),
            therapist_name: therapist.map(|t| t.name().to_string()),
            therapist_email: therapist.and_then(|t| t.email.clone()),
            appointment_scheduled: outcome.appointment_scheduled(),
            appointment_id: outcome.appointment.as_ref().map(|a| a.id.clone()),
            urgency_minutes: outcome.urgency_minutes,
            appointment,
            appointment_error: outcome.appointment_error,
            notification: outcome.notification.as_str(),
        };

        Self {
            text: outcome.text,
            session_id,
            crisis: Some(fields),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: String,
    pub uptime_seconds: u64,
    pub active_sessions: usize,
    pub crisis_rules: usize,
    pub provider: String,
}
