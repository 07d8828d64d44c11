// Crisis escalation: urgent booking, caregiver notification, supportive reply

mod orchestrator;
pub mod response;
mod types;

pub use orchestrator::EscalationOrchestrator;
pub use types::{EscalationContext, EscalationOutcome, EscalationSettings, NotificationStatus};
