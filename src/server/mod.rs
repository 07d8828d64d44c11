// Solace - Companion Server Module
// HTTP API for mood-tracked chat sessions with crisis escalation

mod handlers;
mod middleware;
mod session;
pub mod types;

pub use handlers::{create_router, health_check, metrics_endpoint};
pub use middleware::{auth_middleware, hash_token, AuthenticatedUser, TokenStore, ANONYMOUS_USER};
pub use session::{Session, SessionError, SessionManager};

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::{Config, ServerSettings};
use crate::crisis::CrisisDetector;
use crate::escalation::EscalationOrchestrator;
use crate::metrics::Metrics;
use crate::providers::ChatProvider;
use crate::services::{HttpMailer, InMemoryAppointmentStore, InMemoryDirectory, LogNotifier, Notifier};

/// Main companion server structure
pub struct CompanionServer {
    /// Immutable crisis classifier (shared across requests)
    detector: CrisisDetector,
    orchestrator: EscalationOrchestrator,
    /// Chat backend for non-crisis messages
    provider: Arc<dyn ChatProvider>,
    sessions: SessionManager,
    tokens: TokenStore,
    metrics: Metrics,
    config: ServerSettings,
    started_at: Instant,
}

impl CompanionServer {
    pub fn new(
        config: ServerSettings,
        tokens: TokenStore,
        detector: CrisisDetector,
        orchestrator: EscalationOrchestrator,
        provider: Arc<dyn ChatProvider>,
    ) -> Result<Self> {
        let metrics = Metrics::new().context("Failed to register metrics")?;

        Ok(Self {
            detector,
            orchestrator,
            provider,
            sessions: SessionManager::new(config.max_sessions),
            tokens,
            metrics,
            config,
            started_at: Instant::now(),
        })
    }

    /// Wire the server from configuration.
    ///
    /// The therapist directory and appointment store are in memory. Crisis
    /// notifications go through the HTTP mail relay when one is configured,
    /// otherwise they are logged.
    pub fn from_config(config: &Config, provider: Arc<dyn ChatProvider>) -> Result<Self> {
        let detector = match &config.classifier.patterns_path {
            Some(path) => CrisisDetector::load_from_file(path, config.classifier.exception_scope)
                .with_context(|| format!("Failed to load crisis patterns from {}", path.display()))?,
            None => CrisisDetector::new(
                crate::crisis::PatternLibrary::builtin()?,
                config.classifier.exception_scope,
            ),
        };

        let notifier: Arc<dyn Notifier> = match &config.mail.endpoint {
            Some(endpoint) => Arc::new(HttpMailer::new(
                endpoint.clone(),
                config.mail.api_key.clone(),
                config.mail.from.clone(),
            )?),
            None => Arc::new(LogNotifier),
        };

        let appointments = Arc::new(InMemoryAppointmentStore::new());
        let directory = InMemoryDirectory::new(config.therapists.clone())
            .with_bookings(Arc::clone(&appointments));

        let orchestrator = EscalationOrchestrator::new(
            Arc::new(directory),
            appointments,
            notifier,
            config.escalation.to_settings(),
        );

        tracing::info!(
            crisis_rules = detector.library().rule_count(),
            scope = ?detector.scope(),
            therapists = config.therapists.len(),
            "Crisis classifier ready"
        );

        Self::new(
            config.server.clone(),
            TokenStore::new(&config.auth.tokens),
            detector,
            orchestrator,
            provider,
        )
    }

    /// Start the HTTP server
    pub async fn serve(self) -> Result<()> {
        let addr: SocketAddr = self
            .config
            .bind_address
            .parse()
            .with_context(|| format!("Invalid bind address: {}", self.config.bind_address))?;

        let app_state = Arc::new(self);

        let app = create_router(app_state)
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http());

        tracing::info!("Starting Solace companion server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    pub fn detector(&self) -> &CrisisDetector {
        &self.detector
    }

    pub fn orchestrator(&self) -> &EscalationOrchestrator {
        &self.orchestrator
    }

    pub fn provider(&self) -> &Arc<dyn ChatProvider> {
        &self.provider
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn config(&self) -> &ServerSettings {
        &self.config
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}
