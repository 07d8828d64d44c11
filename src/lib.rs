// Solace - Wellness companion server with crisis escalation
// Library exports

pub mod config;
pub mod conversation;
pub mod crisis; // Tagged-rule crisis classifier
pub mod errors;
pub mod escalation; // Urgent booking and caregiver notification
pub mod metrics;
pub mod providers; // Chat backend for non-crisis messages
pub mod server; // HTTP API
pub mod services; // Therapist directory, appointments, mail
