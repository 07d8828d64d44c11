// Crisis escalation workflow
//
// Lookup and booking are awaited under their own timeouts because the
// response reports their result. Email delivery is spawned and only waited
// on up to `notify_timeout`.

use anyhow::{anyhow, Result};
use chrono::{Duration as ChronoDuration, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::crisis::{Classification, CrisisCategory, CrisisLevel};
use crate::services::{
    Appointment, AppointmentOrigin, AppointmentStore, NewAppointment, Notifier, Therapist,
    TherapistDirectory,
};

use super::response;
use super::types::{EscalationContext, EscalationOutcome, EscalationSettings, NotificationStatus};

pub struct EscalationOrchestrator {
    directory: Arc<dyn TherapistDirectory>,
    appointments: Arc<dyn AppointmentStore>,
    notifier: Arc<dyn Notifier>,
    settings: EscalationSettings,
}

impl EscalationOrchestrator {
    pub fn new(
        directory: Arc<dyn TherapistDirectory>,
        appointments: Arc<dyn AppointmentStore>,
        notifier: Arc<dyn Notifier>,
        settings: EscalationSettings,
    ) -> Self {
        Self {
            directory,
            appointments,
            notifier,
            settings,
        }
    }

    pub fn settings(&self) -> &EscalationSettings {
        &self.settings
    }

    /// Run one escalation attempt. Never fails: collaborator errors degrade
    /// the outcome but a supportive message is always produced.
    pub async fn escalate(
        &self,
        context: &EscalationContext,
        classification: &Classification,
    ) -> EscalationOutcome {
        let escalation_id = Uuid::new_v4().to_string();
        let category = classification.category.unwrap_or(CrisisCategory::Emergency);
        let level = classification.level.unwrap_or(CrisisLevel::Moderate);
        let urgency_minutes = level.urgency_minutes();

        if !classification.is_crisis {
            tracing::warn!(
                escalation_id = %escalation_id,
                "Escalating a message that was not classified as crisis"
            );
        }

        tracing::warn!(
            escalation_id = %escalation_id,
            session_id = %context.session_id,
            category = %category,
            level = %level,
            "Starting crisis escalation"
        );

        let therapist = self.find_therapist(&escalation_id).await;

        let (booking, appointment_error) = match therapist {
            Some(therapist) => match self
                .book(context, &therapist, category, level, urgency_minutes)
                .await
            {
                Ok(appointment) => (Some((therapist, appointment)), None),
                Err(e) => {
                    tracing::warn!(
                        escalation_id = %escalation_id,
                        therapist_id = %therapist.id,
                        error = %e,
                        "Crisis appointment booking failed"
                    );
                    (None, Some(e.to_string()))
                }
            },
            None => {
                tracing::warn!(
                    escalation_id = %escalation_id,
                    "No therapist available for crisis escalation"
                );
                (None, None)
            }
        };

        let notification = self
            .notify(
                &escalation_id,
                context,
                category,
                level,
                booking.as_ref(),
            )
            .await;

        let text = response::supportive_message(
            level,
            booking.as_ref().map(|(t, a)| (t, a)),
            urgency_minutes,
        );

        let (therapist, appointment) = match booking {
            Some((therapist, appointment)) => (Some(therapist), Some(appointment)),
            None => (None, None),
        };

        tracing::info!(
            escalation_id = %escalation_id,
            booked = appointment.is_some(),
            notification = notification.as_str(),
            "Crisis escalation finished"
        );

        EscalationOutcome {
            escalation_id,
            text,
            crisis_level: level,
            crisis_type: category,
            therapist,
            appointment,
            urgency_minutes,
            notification,
            appointment_error,
        }
    }

    async fn find_therapist(&self, escalation_id: &str) -> Option<Therapist> {
        match bounded(self.settings.lookup_timeout, "Therapist lookup", self.directory.find_available()).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(
                    escalation_id = %escalation_id,
                    error = %e,
                    "Therapist lookup failed"
                );
                None
            }
        }
    }

    async fn book(
        &self,
        context: &EscalationContext,
        therapist: &Therapist,
        category: CrisisCategory,
        level: CrisisLevel,
        urgency_minutes: i64,
    ) -> Result<Appointment> {
        let request = NewAppointment {
            patient_id: context.user_id.clone(),
            therapist_id: therapist.id.clone(),
            title: "Urgent Mental Health Support".to_string(),
            description: format!(
                "Auto-booked after a {} {} crisis was detected in chat. \
                Please reach out to the user as soon as possible.",
                level.as_str(),
                category.label().to_lowercase()
            ),
            scheduled_time: Utc::now() + ChronoDuration::minutes(urgency_minutes),
            origin: AppointmentOrigin::AutoCrisis,
        };

        bounded(
            self.settings.booking_timeout,
            "Appointment booking",
            self.appointments.create(request),
        )
        .await
    }

    async fn notify(
        &self,
        escalation_id: &str,
        context: &EscalationContext,
        category: CrisisCategory,
        level: CrisisLevel,
        booking: Option<&(Therapist, Appointment)>,
    ) -> NotificationStatus {
        let mut recipients = Vec::new();
        if let Some(email) = booking.and_then(|(t, _)| t.email.clone()) {
            recipients.push(email);
        }
        if let Some(ops) = &self.settings.ops_email {
            if !recipients.contains(ops) {
                recipients.push(ops.clone());
            }
        }

        if recipients.is_empty() {
            tracing::info!(escalation_id = %escalation_id, "No notification recipients");
            return NotificationStatus::Skipped;
        }

        let email = response::notification_email(
            recipients,
            context,
            category,
            level,
            booking.map(|(_, a)| a),
        );

        let notifier = Arc::clone(&self.notifier);
        let transport = notifier.name().to_string();
        let handle = tokio::spawn(async move { notifier.send(&email).await });

        match tokio::time::timeout(self.settings.notify_timeout, handle).await {
            Ok(Ok(Ok(()))) => {
                tracing::info!(escalation_id = %escalation_id, transport = %transport, "Crisis notification sent");
                NotificationStatus::Sent
            }
            Ok(Ok(Err(e))) => {
                tracing::error!(
                    escalation_id = %escalation_id,
                    transport = %transport,
                    error = %e,
                    "Crisis notification failed"
                );
                NotificationStatus::Failed
            }
            Ok(Err(e)) => {
                tracing::error!(
                    escalation_id = %escalation_id,
                    transport = %transport,
                    error = %e,
                    "Crisis notification task panicked"
                );
                NotificationStatus::Failed
            }
            Err(_) => {
                tracing::warn!(
                    escalation_id = %escalation_id,
                    transport = %transport,
                    timeout_ms = self.settings.notify_timeout.as_millis() as u64,
                    "Crisis notification still pending, continuing in background"
                );
                NotificationStatus::TimedOut
            }
        }
    }
}

/// Await a collaborator call, turning a timeout into an error
async fn bounded<T, F>(limit: Duration, what: &str, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(anyhow!("{} timed out after {}ms", what, limit.as_millis())),
    }
}
