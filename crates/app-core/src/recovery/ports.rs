//! Collaborators consumed by the recovery controller
//!
//! Navigation and email delivery live outside the core. Both are called
//! fire-and-forget; anything that comes back later is fed to the controller as
//! a separate event.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::types::RecoveryStep;
use super::validation::{EmailPattern, FieldValidator};
use crate::scheduler::Scheduler;

/// Navigation requests issued by the controller
#[cfg_attr(test, mockall::automock)]
pub trait NavigationPort: Send + Sync {
    /// Show `to` on top of the current step
    fn advance(&self, to: RecoveryStep);

    /// Leave the flow and return to the root (login) screen
    fn reset_to_root(&self);
}

/// Email and password backend
#[cfg_attr(test, mockall::automock)]
pub trait EmailService: Send + Sync {
    /// Whether `address` looks deliverable
    fn is_valid_address(&self, address: &str) -> bool;

    /// Ask for a recovery letter to be sent to `address`
    fn request_recovery_email(&self, address: &str);

    /// Store `password` as the account's new password
    fn submit_new_password(&self, password: &str);
}

/// Which outbound request failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestKind {
    /// Recovery letter (first send or resend)
    RecoveryEmail,
    /// New password submission
    NewPassword,
}

/// A failed outbound request, delivered back to the controller as an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestFailure {
    /// The request that failed
    pub kind: RequestKind,
    /// Backend error text, for logs
    pub reason: String,
}

impl RequestFailure {
    /// Create a failure event
    pub fn new(kind: RequestKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

/// Collaborators handed to every controller of a flow
#[derive(Clone)]
pub struct RecoveryPorts {
    /// Screen navigation
    pub navigation: Arc<dyn NavigationPort>,
    /// Email and password backend
    pub email: Arc<dyn EmailService>,
    /// Timer capability
    pub scheduler: Arc<dyn Scheduler>,
}

impl RecoveryPorts {
    /// Bundle the three collaborators
    pub fn new(
        navigation: Arc<dyn NavigationPort>,
        email: Arc<dyn EmailService>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        Self {
            navigation,
            email,
            scheduler,
        }
    }
}

impl std::fmt::Debug for RecoveryPorts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecoveryPorts").finish_non_exhaustive()
    }
}

// =============================================================================
// Stub Service
// =============================================================================

/// Request recorded by [`StubEmailService`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailRequest {
    /// Recovery letter for an address
    RecoveryEmail(String),
    /// New password submission
    NewPassword(String),
}

/// In-app stand-in for the email backend
///
/// Nothing is delivered; requests are logged and kept for inspection.
pub struct StubEmailService {
    validator: Arc<dyn FieldValidator>,
    requests: Mutex<Vec<EmailRequest>>,
}

impl StubEmailService {
    /// Stub using [`EmailPattern`] for address checks
    pub fn new() -> Self {
        Self::with_validator(Arc::new(EmailPattern))
    }

    /// Stub using a custom address check
    pub fn with_validator(validator: Arc<dyn FieldValidator>) -> Self {
        Self {
            validator,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<EmailRequest> {
        self.requests.lock().clone()
    }
}

impl Default for StubEmailService {
    fn default() -> Self {
        Self::new()
    }
}

impl EmailService for StubEmailService {
    fn is_valid_address(&self, address: &str) -> bool {
        self.validator.is_valid(address)
    }

    fn request_recovery_email(&self, address: &str) {
        tracing::info!(address, "Recovery email requested (stub)");
        self.requests
            .lock()
            .push(EmailRequest::RecoveryEmail(address.to_string()));
    }

    fn submit_new_password(&self, password: &str) {
        tracing::info!("New password submitted (stub)");
        self.requests
            .lock()
            .push(EmailRequest::NewPassword(password.to_string()));
    }
}
