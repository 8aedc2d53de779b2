//! Password recovery flow
//!
//! This module implements the three-step password recovery flow
//! (`InputEmail -> SendingLetter -> InputNewPassword`) as a small,
//! event-driven state machine. The rendering layer reads immutable
//! [`RecoverySnapshot`]s and forwards user input and lifecycle events back to
//! the [`RecoveryFlowController`].
//!
//! # Collaborators
//!
//! - [`NavigationPort`] - moves between steps and back to login
//! - [`EmailService`] - address checks and outbound requests
//! - [`Scheduler`](crate::scheduler::Scheduler) - cooldown timers
//!
//! # Example
//!
//! ```rust
//! use app_core::recovery::{
//!     FieldId, NavigationPort, RecoveryConfig, RecoveryFlowController, RecoveryPorts,
//!     RecoveryStep, StubEmailService,
//! };
//! use app_core::scheduler::ManualScheduler;
//! use std::sync::Arc;
//!
//! struct Nowhere;
//! impl NavigationPort for Nowhere {
//!     fn advance(&self, _to: RecoveryStep) {}
//!     fn reset_to_root(&self) {}
//! }
//!
//! let ports = RecoveryPorts::new(
//!     Arc::new(Nowhere),
//!     Arc::new(StubEmailService::new()),
//!     Arc::new(ManualScheduler::new()),
//! );
//! let mut controller =
//!     RecoveryFlowController::new(RecoveryStep::InputEmail, ports, RecoveryConfig::default());
//!
//! controller.update_field(FieldId::Email, "alice@example.com").unwrap();
//! assert!(controller.confirm_action().is_enabled);
//! ```

pub mod config;
pub mod controller;
mod countdown;
pub mod email;
pub mod ports;
pub mod types;
pub mod validation;

use thiserror::Error;

pub use config::{RecoveryConfig, RecoveryCopy};
pub use controller::RecoveryFlowController;
pub use email::{EmailTransport, SpawningEmailService, TransportError};
pub use ports::{
    EmailRequest, EmailService, NavigationPort, RecoveryPorts, RequestFailure, RequestKind,
    StubEmailService,
};
pub use types::{
    format_remaining, ActionCommand, ConfirmAction, CountdownState, FieldId, FieldState,
    FieldView, RecoverySnapshot, RecoveryStep,
};
pub use validation::{EmailPattern, FieldValidator, PasswordPolicy};

/// Recovery flow errors
#[derive(Debug, Error)]
pub enum RecoveryError {
    /// Field addressed on a step that doesn't render it
    #[error("Field {field} does not belong to step {step}")]
    FieldNotInStep {
        /// The field that was addressed
        field: FieldId,
        /// The controller's step
        step: RecoveryStep,
    },

    /// Configuration values out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type for recovery operations
pub type Result<T> = std::result::Result<T, RecoveryError>;
