//! Termeet account screens
//!
//! Facade over the workspace crates:
//!
//! - [`app_core`] - recovery flow controller and timer capability
//! - [`app_ui`] - navigation, component props and recovery screens

#![warn(missing_docs)]
#![warn(clippy::all)]

pub use app_core;
pub use app_ui;

pub use app_core::recovery::{
    RecoveryConfig, RecoveryError, RecoveryFlowController, RecoverySnapshot, RecoveryStep,
};
pub use app_core::scheduler::{ManualScheduler, Scheduler, TimerHandle, TokioScheduler};
pub use app_ui::{Navigator, RecoveryScreens, Route};
