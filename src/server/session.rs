// Session management for concurrent HTTP clients
//
// Ended sessions are marked terminated and kept so their transcript survives.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use crate::conversation::{Message, Transcript};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    /// Unknown id, or a session owned by another user
    #[error("Session not found")]
    NotFound,
    #[error("Session has been terminated")]
    Terminated,
    #[error("Maximum session limit reached ({0})")]
    LimitReached(usize),
}

/// Per-session state
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    /// Mood rating (1-10) given at session start; absent for sessions
    /// opened implicitly by a first message
    pub mood: Option<u8>,
    pub terminated: bool,
    pub transcript: Transcript,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: &str, mood: Option<u8>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            mood,
            terminated: false,
            transcript: Transcript::new(),
            created_at: now,
            last_activity: now,
        }
    }

    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }
}

/// Concurrent session store using DashMap
pub struct SessionManager {
    sessions: DashMap<String, Session>,
    /// Limit on live (non-terminated) sessions
    max_sessions: usize,
}

impl SessionManager {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            max_sessions,
        }
    }

    /// Open a new session for a user
    pub fn start(&self, user_id: &str, mood: Option<u8>) -> Result<Session, SessionError> {
        if self.active_count() >= self.max_sessions {
            return Err(SessionError::LimitReached(self.max_sessions));
        }

        let session = Session::new(user_id, mood);
        self.sessions.insert(session.id.clone(), session.clone());

        tracing::info!(session_id = %session.id, user_id = %user_id, "Created new session");
        Ok(session)
    }

    /// Snapshot of a session owned by `user_id`
    pub fn get(&self, session_id: &str, user_id: &str) -> Result<Session, SessionError> {
        match self.sessions.get(session_id) {
            Some(session) if session.user_id == user_id => Ok(session.clone()),
            _ => Err(SessionError::NotFound),
        }
    }

    /// Snapshot of a session that is still accepting messages
    pub fn get_active(&self, session_id: &str, user_id: &str) -> Result<Session, SessionError> {
        let session = self.get(session_id, user_id)?;
        if session.terminated {
            return Err(SessionError::Terminated);
        }
        Ok(session)
    }

    /// Append messages to a session transcript in order
    pub fn append(
        &self,
        session_id: &str,
        messages: impl IntoIterator<Item = Message>,
    ) -> Result<(), SessionError> {
        let mut session = self
            .sessions
            .get_mut(session_id)
            .ok_or(SessionError::NotFound)?;

        for message in messages {
            session.transcript.push(message);
        }
        session.touch();
        Ok(())
    }

    /// Mark a session terminated. Ending twice is not an error.
    pub fn terminate(&self, session_id: &str, user_id: &str) -> Result<(), SessionError> {
        let mut session = self
            .sessions
            .get_mut(session_id)
            .filter(|s| s.user_id == user_id)
            .ok_or(SessionError::NotFound)?;

        if !session.terminated {
            session.terminated = true;
            session.touch();
            tracing::info!(session_id = %session_id, "Session terminated");
        }
        Ok(())
    }

    /// Sessions not yet terminated
    pub fn active_count(&self) -> usize {
        self.sessions.iter().filter(|s| !s.terminated).count()
    }

    /// All stored sessions, terminated included
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
