// Therapist directory

use anyhow::Result;
use async_trait::async_trait;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::appointments::InMemoryAppointmentStore;
use super::TherapistDirectory;

/// A therapist with an appointment in this window is considered busy
const BUSY_WINDOW_HOURS: i64 = 24;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Therapist {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl Therapist {
    /// Display name when set, otherwise the username
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}

/// Directory backed by a list seeded from configuration.
///
/// When linked to an appointment store, therapists with a booking in the
/// next 24 hours are skipped.
pub struct InMemoryDirectory {
    therapists: RwLock<Vec<Therapist>>,
    bookings: Option<Arc<InMemoryAppointmentStore>>,
}

impl InMemoryDirectory {
    pub fn new(therapists: Vec<Therapist>) -> Self {
        Self {
            therapists: RwLock::new(therapists),
            bookings: None,
        }
    }

    pub fn with_bookings(mut self, bookings: Arc<InMemoryAppointmentStore>) -> Self {
        self.bookings = Some(bookings);
        self
    }

    fn is_booked(&self, therapist_id: &str) -> bool {
        self.bookings.as_ref().map_or(false, |store| {
            store.has_upcoming(therapist_id, Duration::hours(BUSY_WINDOW_HOURS))
        })
    }

    /// Mark a therapist available or busy. Returns false if the id is unknown.
    pub async fn set_available(&self, therapist_id: &str, available: bool) -> bool {
        let mut therapists = self.therapists.write().await;
        match therapists.iter_mut().find(|t| t.id == therapist_id) {
            Some(therapist) => {
                therapist.available = available;
                true
            }
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.therapists.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.therapists.read().await.is_empty()
    }
}

#[async_trait]
impl TherapistDirectory for InMemoryDirectory {
    async fn find_available(&self) -> Result<Option<Therapist>> {
        let therapists = self.therapists.read().await;
        Ok(therapists
            .iter()
            .find(|t| t.available && !self.is_booked(&t.id))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{AppointmentOrigin, AppointmentStore, NewAppointment};
    use chrono::Utc;

    fn therapist(id: &str, available: bool) -> Therapist {
        Therapist {
            id: id.to_string(),
            username: format!("dr_{}", id),
            display_name: None,
            email: Some(format!("{}@clinic.test", id)),
            available,
        }
    }

    #[tokio::test]
    async fn test_find_first_available() {
        let directory = InMemoryDirectory::new(vec![therapist("a", false), therapist("b", true)]);

        let found = directory.find_available().await.unwrap().unwrap();
        assert_eq!(found.id, "b");
    }

    #[tokio::test]
    async fn test_none_available() {
        let directory = InMemoryDirectory::new(vec![therapist("a", false)]);
        assert!(directory.find_available().await.unwrap().is_none());

        assert!(directory.set_available("a", true).await);
        assert!(directory.find_available().await.unwrap().is_some());
        assert!(!directory.set_available("missing", true).await);
    }

    #[tokio::test]
    async fn test_booked_therapist_is_busy() {
        let store = Arc::new(InMemoryAppointmentStore::new());
        let directory = InMemoryDirectory::new(vec![therapist("a", true), therapist("b", true)])
            .with_bookings(Arc::clone(&store));

        assert_eq!(directory.find_available().await.unwrap().unwrap().id, "a");

        store
            .create(NewAppointment {
                patient_id: "u1".to_string(),
                therapist_id: "a".to_string(),
                title: "Urgent Mental Health Support".to_string(),
                description: "test".to_string(),
                scheduled_time: Utc::now() + Duration::minutes(30),
                origin: AppointmentOrigin::AutoCrisis,
            })
            .await
            .unwrap();

        assert_eq!(directory.find_available().await.unwrap().unwrap().id, "b");
    }

    #[test]
    fn test_name_falls_back_to_username() {
        let mut t = therapist("a", true);
        assert_eq!(t.name(), "dr_a");
        t.display_name = Some("Dr. Sarah Smith".to_string());
        assert_eq!(t.name(), "Dr. Sarah Smith");
    }
}
