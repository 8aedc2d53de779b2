//! Recovery flow data model
//!
//! Steps, field keys, per-field state, the confirm action and the snapshot
//! handed to the rendering layer.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Steps and Fields
// =============================================================================

/// One screen of the password-recovery flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecoveryStep {
    /// Enter the account email
    #[default]
    InputEmail,
    /// Letter sent, waiting for the user (resend cooldown runs here)
    SendingLetter,
    /// Choose a new password
    InputNewPassword,
}

impl RecoveryStep {
    /// The step after this one, if any
    pub fn next(&self) -> Option<RecoveryStep> {
        match self {
            RecoveryStep::InputEmail => Some(RecoveryStep::SendingLetter),
            RecoveryStep::SendingLetter => Some(RecoveryStep::InputNewPassword),
            RecoveryStep::InputNewPassword => None,
        }
    }

    /// The step before this one, if any
    pub fn previous(&self) -> Option<RecoveryStep> {
        match self {
            RecoveryStep::InputEmail => None,
            RecoveryStep::SendingLetter => Some(RecoveryStep::InputEmail),
            RecoveryStep::InputNewPassword => Some(RecoveryStep::SendingLetter),
        }
    }

    /// Fields rendered on this step, in display order
    pub fn fields(&self) -> &'static [FieldId] {
        match self {
            RecoveryStep::InputEmail => &[FieldId::Email],
            RecoveryStep::SendingLetter => &[],
            RecoveryStep::InputNewPassword => &[FieldId::Password, FieldId::RepeatPassword],
        }
    }

    /// Whether `field` belongs to this step
    pub fn owns(&self, field: FieldId) -> bool {
        self.fields().contains(&field)
    }
}

impl fmt::Display for RecoveryStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecoveryStep::InputEmail => "input-email",
            RecoveryStep::SendingLetter => "sending-letter",
            RecoveryStep::InputNewPassword => "input-new-password",
        };
        f.write_str(name)
    }
}

/// Field key, scoped to the step that owns it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldId {
    /// Account email (`InputEmail`)
    Email,
    /// New password (`InputNewPassword`)
    Password,
    /// New password, repeated (`InputNewPassword`)
    RepeatPassword,
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldId::Email => "email",
            FieldId::Password => "password",
            FieldId::RepeatPassword => "repeatPassword",
        };
        f.write_str(name)
    }
}

/// Mutable state of one text field
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldState {
    /// Current text
    pub value: String,
    /// Whether the field is showing a validation error
    pub is_error: bool,
    /// Helper or error text under the field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer_message: Option<String>,
}

impl FieldState {
    /// Empty field with its helper footer
    pub fn with_footer(footer: Option<String>) -> Self {
        Self {
            value: String::new(),
            is_error: false,
            footer_message: footer,
        }
    }

    /// Mark as failing with `message`
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.is_error = true;
        self.footer_message = Some(message.into());
    }

    /// Clear the error and restore `footer`
    pub fn clear_error(&mut self, footer: Option<String>) {
        self.is_error = false;
        self.footer_message = footer;
    }

    /// Non-blank and error-free
    pub fn is_acceptable(&self) -> bool {
        !self.value.trim().is_empty() && !self.is_error
    }
}

/// Static presentation data for a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldView {
    /// Field key
    pub id: FieldId,
    /// Label above the input
    pub label: String,
    /// Placeholder inside the empty input
    pub placeholder: String,
    /// Whether input is masked
    pub is_secure: bool,
    /// Current state
    pub state: FieldState,
}

// =============================================================================
// Confirm Action
// =============================================================================

/// Command the presentation layer sends back when a control is pressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionCommand {
    /// Request the recovery letter
    SendRecoveryEmail,
    /// Request the letter again after the cooldown
    ResendEmail,
    /// Store the new password
    SubmitNewPassword,
    /// Leave the flow for the login screen
    GoToLogin,
}

/// Primary call-to-action at the bottom of a step, plus its footer link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmAction {
    /// Button title
    pub title: String,
    /// Whether the button accepts presses
    pub is_enabled: bool,
    /// Text shown above the button
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_message: Option<String>,
    /// Footer link label
    pub footer_label: String,
    /// Command bound to the button
    pub primary: ActionCommand,
    /// Command bound to the footer link
    pub footer: ActionCommand,
}

// =============================================================================
// Countdown
// =============================================================================

/// Resend cooldown, exposed during `SendingLetter`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountdownState {
    /// Ticks left before resend is allowed
    pub remaining_seconds: u32,
    /// Whether the tick timer is running
    pub is_active: bool,
}

impl CountdownState {
    /// Whether the cooldown has run out
    pub fn is_expired(&self) -> bool {
        self.remaining_seconds == 0
    }
}

/// Format remaining seconds as `m:ss`
pub fn format_remaining(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

// =============================================================================
// Snapshot
// =============================================================================

/// Immutable view of a controller, published after every command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoverySnapshot {
    /// Active step
    pub step: RecoveryStep,
    /// Fields of the active step, in display order
    pub fields: Vec<FieldView>,
    /// Bottom call-to-action
    pub confirm: ConfirmAction,
    /// Resend cooldown (`SendingLetter` only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countdown: Option<CountdownState>,
    /// Explanatory text for steps without fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Increments with every publication
    pub revision: u64,
}

impl RecoverySnapshot {
    /// Look up a field view by key
    pub fn field(&self, id: FieldId) -> Option<&FieldView> {
        self.fields.iter().find(|f| f.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_sequence() {
        assert_eq!(RecoveryStep::default(), RecoveryStep::InputEmail);
        assert_eq!(RecoveryStep::InputEmail.next(), Some(RecoveryStep::SendingLetter));
        assert_eq!(RecoveryStep::SendingLetter.next(), Some(RecoveryStep::InputNewPassword));
        assert_eq!(RecoveryStep::InputNewPassword.next(), None);
        assert_eq!(RecoveryStep::InputEmail.previous(), None);
        assert_eq!(
            RecoveryStep::InputNewPassword.previous(),
            Some(RecoveryStep::SendingLetter)
        );
    }

    #[test]
    fn test_step_fields() {
        assert!(RecoveryStep::InputEmail.owns(FieldId::Email));
        assert!(!RecoveryStep::InputEmail.owns(FieldId::Password));
        assert!(RecoveryStep::SendingLetter.fields().is_empty());
        assert_eq!(
            RecoveryStep::InputNewPassword.fields(),
            &[FieldId::Password, FieldId::RepeatPassword]
        );
    }

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(180), "3:00");
        assert_eq!(format_remaining(179), "2:59");
        assert_eq!(format_remaining(65), "1:05");
        assert_eq!(format_remaining(9), "0:09");
        assert_eq!(format_remaining(0), "0:00");
    }

    #[test]
    fn test_field_state_acceptable() {
        let mut field = FieldState::with_footer(Some("helper".to_string()));
        assert!(!field.is_acceptable());

        field.value = "   ".to_string();
        assert!(!field.is_acceptable());

        field.value = "a@b.co".to_string();
        assert!(field.is_acceptable());

        field.set_error("bad");
        assert!(!field.is_acceptable());
        assert_eq!(field.footer_message.as_deref(), Some("bad"));

        field.clear_error(Some("helper".to_string()));
        assert!(field.is_acceptable());
        assert_eq!(field.footer_message.as_deref(), Some("helper"));
    }

    #[test]
    fn test_step_serialization() {
        let json = serde_json::to_string(&RecoveryStep::SendingLetter).unwrap();
        assert_eq!(json, "\"sendingLetter\"");
        let parsed: RecoveryStep = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, RecoveryStep::SendingLetter);
    }
}
