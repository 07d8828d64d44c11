// External collaborators used by crisis escalation
//
// The escalation core only sees these traits. In-process implementations back
// the standalone server and the tests.

use anyhow::Result;
use async_trait::async_trait;

pub mod appointments;
pub mod directory;
pub mod mail;

pub use appointments::{
    Appointment, AppointmentOrigin, AppointmentStatus, InMemoryAppointmentStore, NewAppointment,
};
pub use directory::{InMemoryDirectory, Therapist};
pub use mail::{Email, HttpMailer, LogNotifier};

/// Finds a therapist who can take an urgent appointment
#[async_trait]
pub trait TherapistDirectory: Send + Sync {
    async fn find_available(&self) -> Result<Option<Therapist>>;
}

/// Persists appointments
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn create(&self, appointment: NewAppointment) -> Result<Appointment>;
}

/// Delivers email notifications
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, email: &Email) -> Result<()>;

    /// Transport name for logs
    fn name(&self) -> &str;
}
