//! Shared form components for Termeet
//!
//! Components are defined as Rust structs with serializable properties that
//! the frontend renders. Each component provides type-safe props with a
//! builder pattern, and can be built straight from a recovery snapshot.
//!
//! # Available Components
//!
//! - [`InputText`] - Labelled text input with footer and secure entry
//! - [`ConfirmButton`] - Primary button with header text and footer link

use app_core::recovery::{ActionCommand, ConfirmAction, FieldId, FieldView};
use serde::{Deserialize, Serialize};

/// Event handler callback type (represented as a string identifier)
pub type EventHandler = String;

// =============================================================================
// InputText Component
// =============================================================================

/// Labelled text input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputText {
    /// Field this input edits, when bound to a form
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<FieldId>,
    /// Current text
    #[serde(default)]
    pub text: String,
    /// Text above the input
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_text: Option<String>,
    /// Placeholder text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Text below the input (hint or error message)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer_text: Option<String>,
    /// Label of the button at the trailing edge
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auxiliary_button_text: Option<String>,
    /// Hide the text, with a show/hide toggle
    #[serde(default)]
    pub is_secured: bool,
    /// Draw border and footer in the error color
    #[serde(default)]
    pub is_errored: bool,
    /// Fired when editing starts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_begin_editing: Option<EventHandler>,
    /// Fired when editing ends
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_end_editing: Option<EventHandler>,
    /// Fired on every text change
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_text_change: Option<EventHandler>,
    /// Fired by the auxiliary button
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_auxiliary_button: Option<EventHandler>,
}

impl InputText {
    /// Create an empty input
    pub fn new() -> Self {
        Self {
            field: None,
            text: String::new(),
            header_text: None,
            placeholder: None,
            footer_text: None,
            auxiliary_button_text: None,
            is_secured: false,
            is_errored: false,
            on_begin_editing: None,
            on_end_editing: None,
            on_text_change: None,
            on_auxiliary_button: None,
        }
    }

    /// Set the current text
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set the header text
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header_text = Some(header.into());
        self
    }

    /// Set the placeholder
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Set the footer text
    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer_text = Some(footer.into());
        self
    }

    /// Add a trailing button
    pub fn with_auxiliary_button(
        mut self,
        label: impl Into<String>,
        handler: impl Into<EventHandler>,
    ) -> Self {
        self.auxiliary_button_text = Some(label.into());
        self.on_auxiliary_button = Some(handler.into());
        self
    }

    /// Set secure entry
    pub fn secured(mut self, secured: bool) -> Self {
        self.is_secured = secured;
        self
    }

    /// Set error state
    pub fn errored(mut self, errored: bool) -> Self {
        self.is_errored = errored;
        self
    }

    /// Set editing handlers
    pub fn on_editing(
        mut self,
        begin: impl Into<EventHandler>,
        end: impl Into<EventHandler>,
    ) -> Self {
        self.on_begin_editing = Some(begin.into());
        self.on_end_editing = Some(end.into());
        self
    }

    /// Set change handler
    pub fn on_change(mut self, handler: impl Into<EventHandler>) -> Self {
        self.on_text_change = Some(handler.into());
        self
    }
}

impl Default for InputText {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&FieldView> for InputText {
    fn from(view: &FieldView) -> Self {
        let key = field_key(view.id);
        let mut input = InputText::new()
            .with_text(view.state.value.clone())
            .with_header(view.label.clone())
            .with_placeholder(view.placeholder.clone())
            .secured(view.is_secure)
            .errored(view.state.is_error)
            .on_editing(format!("{key}:begin"), format!("{key}:commit"))
            .on_change(format!("{key}:change"));
        input.field = Some(view.id);
        input.footer_text = view.state.footer_message.clone();
        input
    }
}

fn field_key(id: FieldId) -> &'static str {
    match id {
        FieldId::Email => "email",
        FieldId::Password => "password",
        FieldId::RepeatPassword => "repeatPassword",
    }
}

// =============================================================================
// ConfirmButton Component
// =============================================================================

/// Primary action button with optional header text and footer link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmButton {
    /// Button title
    pub title: String,
    /// Whether the button accepts presses
    #[serde(default = "default_enabled")]
    pub is_enabled: bool,
    /// Text above the button
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_text: Option<String>,
    /// Link-style button below
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer_text_button: Option<String>,
    /// Command run by the main button
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionCommand>,
    /// Command run by the footer link
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer_action: Option<ActionCommand>,
}

fn default_enabled() -> bool {
    true
}

impl ConfirmButton {
    /// Create an enabled button
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            is_enabled: true,
            header_text: None,
            footer_text_button: None,
            action: None,
            footer_action: None,
        }
    }

    /// Set enabled state
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.is_enabled = enabled;
        self
    }

    /// Set the header text
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header_text = Some(header.into());
        self
    }

    /// Set the main command
    pub fn with_action(mut self, action: ActionCommand) -> Self {
        self.action = Some(action);
        self
    }

    /// Add the footer link
    pub fn with_footer(mut self, label: impl Into<String>, action: ActionCommand) -> Self {
        self.footer_text_button = Some(label.into());
        self.footer_action = Some(action);
        self
    }

    /// Command for a press on the main button, `None` while disabled
    pub fn press(&self) -> Option<ActionCommand> {
        if self.is_enabled {
            self.action
        } else {
            None
        }
    }
}

impl From<&ConfirmAction> for ConfirmButton {
    fn from(action: &ConfirmAction) -> Self {
        let mut button = ConfirmButton::new(action.title.clone())
            .enabled(action.is_enabled)
            .with_action(action.primary)
            .with_footer(action.footer_label.clone(), action.footer);
        button.header_text = action.header_message.clone();
        button
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use app_core::recovery::FieldState;

    fn email_view(state: FieldState) -> FieldView {
        FieldView {
            id: FieldId::Email,
            label: "Email".to_string(),
            placeholder: "Enter email".to_string(),
            is_secure: false,
            state,
        }
    }

    // ==========================================================================
    // InputText Tests
    // ==========================================================================

    #[test]
    fn test_input_builder() {
        let input = InputText::new()
            .with_header("Password")
            .with_placeholder("Enter a password")
            .with_footer("At least 8 characters")
            .with_auxiliary_button("Forgot?", "forgot")
            .secured(true);

        assert_eq!(input.header_text.as_deref(), Some("Password"));
        assert_eq!(input.auxiliary_button_text.as_deref(), Some("Forgot?"));
        assert_eq!(input.on_auxiliary_button.as_deref(), Some("forgot"));
        assert!(input.is_secured);
        assert!(!input.is_errored);
    }

    #[test]
    fn test_input_from_field_view() {
        let mut state = FieldState::with_footer(Some("helper".to_string()));
        state.value = "abc".to_string();
        state.set_error("Invalid".to_string());

        let input = InputText::from(&email_view(state));
        assert_eq!(input.field, Some(FieldId::Email));
        assert_eq!(input.text, "abc");
        assert_eq!(input.header_text.as_deref(), Some("Email"));
        assert_eq!(input.footer_text.as_deref(), Some("Invalid"));
        assert!(input.is_errored);
        assert_eq!(input.on_end_editing.as_deref(), Some("email:commit"));
    }

    #[test]
    fn test_input_without_footer() {
        let input = InputText::from(&email_view(FieldState::default()));
        assert_eq!(input.footer_text, None);

        let json = serde_json::to_value(&input).unwrap();
        assert!(json.get("footerText").is_none());
        assert_eq!(json["isSecured"], false);
    }

    // ==========================================================================
    // ConfirmButton Tests
    // ==========================================================================

    #[test]
    fn test_button_from_action() {
        let action = ConfirmAction {
            title: "Send again".to_string(),
            is_enabled: false,
            header_message: Some("You can request again in 2:59".to_string()),
            footer_label: "Back to login".to_string(),
            primary: ActionCommand::ResendEmail,
            footer: ActionCommand::GoToLogin,
        };

        let button = ConfirmButton::from(&action);
        assert_eq!(button.title, "Send again");
        assert!(!button.is_enabled);
        assert_eq!(
            button.header_text.as_deref(),
            Some("You can request again in 2:59")
        );
        assert_eq!(button.footer_action, Some(ActionCommand::GoToLogin));
        assert_eq!(button.press(), None);

        let button = button.enabled(true);
        assert_eq!(button.press(), Some(ActionCommand::ResendEmail));
    }

    #[test]
    fn test_button_deserialize_defaults() {
        let button: ConfirmButton = serde_json::from_str(r#"{"title":"Test"}"#).unwrap();
        assert!(button.is_enabled);
        assert_eq!(button.action, None);
    }
}
