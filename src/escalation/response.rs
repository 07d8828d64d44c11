// User-facing crisis messages and therapist notification text

use crate::crisis::{CrisisCategory, CrisisLevel};
use crate::services::{Appointment, Email, Therapist};

use super::types::EscalationContext;

pub const CRISIS_RESOURCES: &str = "If you are in immediate danger, please call 911. \
You can call or text 988 (Suicide & Crisis Lifeline) at any time, \
or text HOME to 741741 to reach the Crisis Text Line.";

/// Message returned when nothing beyond the classification succeeded
pub fn fallback_message() -> String {
    format!(
        "I'm very concerned about your safety, and I'm glad you told me. \
        You don't have to face this alone. {}",
        CRISIS_RESOURCES
    )
}

/// Compose the supportive reply for a crisis.
///
/// Names the therapist and the booking window only when an appointment was
/// actually created.
pub fn supportive_message(
    level: CrisisLevel,
    booking: Option<(&Therapist, &Appointment)>,
    urgency_minutes: i64,
) -> String {
    let Some((therapist, appointment)) = booking else {
        return fallback_message();
    };

    let contact = match &therapist.email {
        Some(email) => format!("{} ({})", therapist.name(), email),
        None => therapist.name().to_string(),
    };
    let when = appointment.scheduled_time.format("%H:%M UTC");

    let lead = match level {
        CrisisLevel::Critical => format!(
            "I'm extremely concerned about your safety. I've immediately booked an emergency \
            session for you with {} who will be available within {} minutes, at {}. \
            Please stay safe - help is on the way right now. You're not alone.",
            contact, urgency_minutes, when
        ),
        CrisisLevel::High => format!(
            "I'm deeply concerned about what you're sharing. Your safety is my top priority. \
            I've booked an urgent session for you with {} who will be available within {} \
            minutes, at {}. Help is on the way, and you're not alone in this.",
            contact, urgency_minutes, when
        ),
        CrisisLevel::Moderate | CrisisLevel::Elevated => format!(
            "I'm concerned about what you're sharing. I've booked a support session for you \
            with {} who will be available within {} minutes, at {}. \
            Help is available and you don't have to face this alone.",
            contact, urgency_minutes, when
        ),
    };

    format!("{} {}", lead, CRISIS_RESOURCES)
}

/// Notification for the assigned therapist and operations inbox.
///
/// Never includes the user's message text.
pub fn notification_email(
    recipients: Vec<String>,
    context: &EscalationContext,
    category: CrisisCategory,
    level: CrisisLevel,
    appointment: Option<&Appointment>,
) -> Email {
    let subject = match appointment {
        Some(_) => format!(
            "Urgent: {} crisis detected - appointment auto-booked",
            level.as_str()
        ),
        None => format!(
            "Urgent: {} crisis detected - no therapist booked",
            level.as_str()
        ),
    };

    let mut body = format!(
        "A user in crisis has been detected by the companion chat.\n\n\
        Category: {}\n\
        Severity: {} (level {})\n\
        User: {}\n\
        Session: {}\n",
        category.label(),
        level.as_str(),
        level.as_number(),
        context.user_id,
        context.session_id,
    );

    match appointment {
        Some(appointment) => body.push_str(&format!(
            "\nAn urgent appointment ({}) has been auto-booked for {}. \
            Please check the platform and reach out to the user as soon as possible.\n",
            appointment.id,
            appointment.scheduled_time.to_rfc3339()
        )),
        None => body.push_str(
            "\nNo therapist could be booked automatically. \
            Please arrange follow-up for this user as soon as possible.\n",
        ),
    }

    Email {
        to: recipients,
        subject,
        body,
    }
}
