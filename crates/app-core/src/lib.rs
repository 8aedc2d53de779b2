//! Core application logic for Termeet
//!
//! This crate contains the platform-independent parts of the account
//! screens: the password recovery flow and the timer capability it runs on.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod recovery;
pub mod scheduler;
