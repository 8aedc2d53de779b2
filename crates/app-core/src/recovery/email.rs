//! Async email backend adapter
//!
//! Bridges an async [`EmailTransport`] to the synchronous, fire-and-forget
//! [`EmailService`] port. Each request runs as its own tokio task; failures
//! come back on a channel so the owner can feed them to
//! `RecoveryFlowController::on_request_failed`.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use super::ports::{EmailService, RequestFailure, RequestKind};
use super::validation::{EmailPattern, FieldValidator};

/// Transport errors
#[derive(Debug, Error)]
pub enum TransportError {
    /// Backend rejected the request
    #[error("Rejected: {0}")]
    Rejected(String),

    /// Backend could not be reached
    #[error("Network error: {0}")]
    Network(String),
}

/// Async sender for recovery letters and password updates
#[async_trait]
pub trait EmailTransport: Send + Sync + 'static {
    /// Send a recovery letter to `address`
    async fn send_recovery_email(&self, address: String) -> Result<(), TransportError>;

    /// Store a new password
    async fn update_password(&self, password: String) -> Result<(), TransportError>;
}

/// [`EmailService`] that runs each request on the tokio runtime
pub struct SpawningEmailService<T: EmailTransport> {
    transport: Arc<T>,
    runtime: Handle,
    validator: Arc<dyn FieldValidator>,
    failures: mpsc::UnboundedSender<RequestFailure>,
}

impl<T: EmailTransport> SpawningEmailService<T> {
    /// Create the service and the receiver for failure events
    pub fn new(transport: T, runtime: Handle) -> (Self, mpsc::UnboundedReceiver<RequestFailure>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let service = Self {
            transport: Arc::new(transport),
            runtime,
            validator: Arc::new(EmailPattern),
            failures: tx,
        };
        (service, rx)
    }

    /// Replace the address check
    pub fn with_validator(mut self, validator: Arc<dyn FieldValidator>) -> Self {
        self.validator = validator;
        self
    }
}

impl<T: EmailTransport> EmailService for SpawningEmailService<T> {
    fn is_valid_address(&self, address: &str) -> bool {
        self.validator.is_valid(address)
    }

    fn request_recovery_email(&self, address: &str) {
        let transport = Arc::clone(&self.transport);
        let failures = self.failures.clone();
        let address = address.to_string();

        self.runtime.spawn(async move {
            if let Err(e) = transport.send_recovery_email(address).await {
                tracing::warn!("Recovery email failed: {}", e);
                let _ = failures.send(RequestFailure::new(RequestKind::RecoveryEmail, e.to_string()));
            }
        });
    }

    fn submit_new_password(&self, password: &str) {
        let transport = Arc::clone(&self.transport);
        let failures = self.failures.clone();
        let password = password.to_string();

        self.runtime.spawn(async move {
            if let Err(e) = transport.update_password(password).await {
                tracing::warn!("Password update failed: {}", e);
                let _ = failures.send(RequestFailure::new(RequestKind::NewPassword, e.to_string()));
            }
        });
    }
}
