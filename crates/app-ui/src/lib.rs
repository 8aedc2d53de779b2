//! User interface for Termeet
//!
//! This crate provides the presentation layer above `app-core`: navigation,
//! render props for the shared form components, and the recovery screens.
//!
//! # Modules
//!
//! - [`navigation`] - Routes, tabs and the shared navigation stack
//! - [`components`] - Form component props
//! - [`screens`] - Controller stack for the recovery flow
//!
//! # Example
//!
//! ```rust
//! use app_core::recovery::{RecoveryConfig, RecoveryStep, StubEmailService};
//! use app_core::scheduler::ManualScheduler;
//! use app_ui::{Navigator, RecoveryScreens, Route};
//! use std::sync::Arc;
//!
//! let navigator = Navigator::default();
//! let screens = RecoveryScreens::new(
//!     navigator.clone(),
//!     Arc::new(StubEmailService::new()),
//!     Arc::new(ManualScheduler::new()),
//!     RecoveryConfig::default(),
//! );
//!
//! assert_eq!(
//!     navigator.current(),
//!     Route::PasswordRecovery { step: RecoveryStep::InputEmail }
//! );
//! assert!(screens.props().is_some());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod components;
pub mod navigation;
pub mod screens;

// Re-export commonly used types
pub use components::{ConfirmButton, EventHandler, InputText};

pub use navigation::{
    NavigationStack, NavigationState, NavigationTab, Navigator, Route, StackEntry,
};

pub use screens::{RecoveryScreenProps, RecoveryScreens};
