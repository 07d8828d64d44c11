// Appointment store

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AppointmentStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    /// Waiting for the therapist to accept
    Pending,
    Approved,
}

/// Who created the appointment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AppointmentOrigin {
    AutoCrisis,
    Manual,
}

impl AppointmentOrigin {
    /// Crisis bookings skip therapist approval
    pub fn initial_status(&self) -> AppointmentStatus {
        match self {
            AppointmentOrigin::AutoCrisis => AppointmentStatus::Approved,
            AppointmentOrigin::Manual => AppointmentStatus::Pending,
        }
    }
}

/// Appointment request before it is persisted
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub patient_id: String,
    pub therapist_id: String,
    pub title: String,
    pub description: String,
    pub scheduled_time: DateTime<Utc>,
    pub origin: AppointmentOrigin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub patient_id: String,
    pub therapist_id: String,
    pub title: String,
    pub description: String,
    pub scheduled_time: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub origin: AppointmentOrigin,
    pub created_at: DateTime<Utc>,
}

/// Concurrent in-memory appointment store
#[derive(Default)]
pub struct InMemoryAppointmentStore {
    appointments: DashMap<String, Appointment>,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<Appointment> {
        self.appointments.get(id).map(|entry| entry.value().clone())
    }

    /// Appointments for a patient, oldest first
    pub fn for_patient(&self, patient_id: &str) -> Vec<Appointment> {
        let mut found: Vec<Appointment> = self
            .appointments
            .iter()
            .filter(|entry| entry.value().patient_id == patient_id)
            .map(|entry| entry.value().clone())
            .collect();
        found.sort_by_key(|a| a.created_at);
        found
    }

    /// Whether the therapist has an appointment starting between now and
    /// `window` from now
    pub fn has_upcoming(&self, therapist_id: &str, window: Duration) -> bool {
        let now = Utc::now();
        let until = now + window;
        self.appointments.iter().any(|entry| {
            let a = entry.value();
            a.therapist_id == therapist_id && a.scheduled_time >= now && a.scheduled_time <= until
        })
    }

    pub fn len(&self) -> usize {
        self.appointments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.appointments.is_empty()
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn create(&self, request: NewAppointment) -> Result<Appointment> {
        if request.patient_id == request.therapist_id {
            bail!("Cannot book an appointment with yourself");
        }

        let appointment = Appointment {
            id: Uuid::new_v4().to_string(),
            patient_id: request.patient_id,
            therapist_id: request.therapist_id,
            title: request.title,
            description: request.description,
            scheduled_time: request.scheduled_time,
            status: request.origin.initial_status(),
            origin: request.origin,
            created_at: Utc::now(),
        };

        self.appointments
            .insert(appointment.id.clone(), appointment.clone());

        tracing::info!(
            appointment_id = %appointment.id,
            therapist_id = %appointment.therapist_id,
            "Created appointment"
        );

        Ok(appointment)
    }
}
