//! Recovery flow controller
//!
//! One controller per step. The step is fixed at construction; moving on is
//! requested through the [`NavigationPort`](super::NavigationPort), and the
//! presentation layer builds the next controller with
//! [`RecoveryFlowController::derive`].

use std::sync::Arc;
use tokio::sync::watch;

use super::config::RecoveryConfig;
use super::countdown::{Countdown, CountdownEvent};
use super::ports::{RecoveryPorts, RequestFailure, RequestKind};
use super::types::{
    ActionCommand, ConfirmAction, CountdownState, FieldId, FieldState, FieldView,
    RecoverySnapshot, RecoveryStep,
};
use super::validation::FieldValidator;
use super::{RecoveryError, Result};
use crate::scheduler::TimerHandle;

/// State machine for one step of the recovery flow
///
/// All commands publish a fresh [`RecoverySnapshot`] to subscribers. Invalid
/// input never produces an error; it shows up as `FieldState::is_error`.
pub struct RecoveryFlowController {
    step: RecoveryStep,
    config: Arc<RecoveryConfig>,
    ports: RecoveryPorts,
    password_validator: Arc<dyn FieldValidator>,
    fields: Vec<(FieldId, FieldState)>,
    action: ConfirmAction,
    countdown: Countdown,
    recovery_address: Option<String>,
    revision: u64,
    snapshots: watch::Sender<RecoverySnapshot>,
}

impl RecoveryFlowController {
    /// Create a controller for `step`
    pub fn new(step: RecoveryStep, ports: RecoveryPorts, config: RecoveryConfig) -> Self {
        if let Err(e) = config.validate() {
            tracing::warn!("Recovery config out of range: {}", e);
        }
        let password_validator: Arc<dyn FieldValidator> = Arc::new(config.password.clone());
        Self::from_parts(step, Arc::new(config), ports, password_validator, None)
    }

    fn from_parts(
        step: RecoveryStep,
        config: Arc<RecoveryConfig>,
        ports: RecoveryPorts,
        password_validator: Arc<dyn FieldValidator>,
        recovery_address: Option<String>,
    ) -> Self {
        let fields = step
            .fields()
            .iter()
            .map(|id| (*id, FieldState::with_footer(helper_text(&config, *id))))
            .collect();
        let action = initial_action(step, &config);
        let countdown = Countdown::new(config.resend_cooldown_ticks);
        let placeholder = RecoverySnapshot {
            step,
            fields: Vec::new(),
            confirm: action.clone(),
            countdown: None,
            message: None,
            revision: 0,
        };

        let mut controller = Self {
            step,
            config,
            ports,
            password_validator,
            fields,
            action,
            countdown,
            recovery_address,
            revision: 0,
            snapshots: watch::channel(placeholder).0,
        };
        controller.refresh_enabled();
        controller.snapshots.send_replace(controller.snapshot());
        controller
    }

    /// Replace the password rule
    pub fn with_password_validator(mut self, validator: Arc<dyn FieldValidator>) -> Self {
        self.password_validator = validator;
        self
    }

    /// Replace the password rule in place, keeping all other state
    pub fn set_password_validator(&mut self, validator: Arc<dyn FieldValidator>) {
        self.password_validator = validator;
    }

    /// Fresh controller for `step`, sharing collaborators and the recovery address
    pub fn derive(&self, step: RecoveryStep) -> Self {
        Self::from_parts(
            step,
            Arc::clone(&self.config),
            self.ports.clone(),
            Arc::clone(&self.password_validator),
            self.recovery_address.clone(),
        )
    }

    /// Set the address letters are sent to
    pub fn with_recovery_address(mut self, address: impl Into<String>) -> Self {
        self.recovery_address = Some(address.into());
        self
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Active step
    pub fn step(&self) -> RecoveryStep {
        self.step
    }

    /// State of `id`, or an empty default if the step has no such field
    pub fn field(&self, id: FieldId) -> FieldState {
        match self.state(id) {
            Some(state) => state.clone(),
            None => {
                tracing::warn!(field = %id, step = %self.step, "Queried field not in step");
                FieldState::default()
            }
        }
    }

    /// Fields of the active step, in display order
    pub fn fields(&self) -> Vec<FieldView> {
        self.fields
            .iter()
            .map(|(id, state)| field_view(&self.config, *id, state.clone()))
            .collect()
    }

    /// Current call-to-action
    pub fn confirm_action(&self) -> &ConfirmAction {
        &self.action
    }

    /// Resend cooldown, `SendingLetter` only
    pub fn countdown(&self) -> Option<CountdownState> {
        (self.step == RecoveryStep::SendingLetter).then(|| self.countdown.state())
    }

    /// Address the letter goes to, once known
    pub fn recovery_address(&self) -> Option<&str> {
        self.recovery_address.as_deref()
    }

    /// Current state as an immutable value
    pub fn snapshot(&self) -> RecoverySnapshot {
        RecoverySnapshot {
            step: self.step,
            fields: self.fields(),
            confirm: self.action.clone(),
            countdown: self.countdown(),
            message: (self.step == RecoveryStep::SendingLetter)
                .then(|| self.config.copy.letter_sent_message.clone()),
            revision: self.revision,
        }
    }

    /// Receive a snapshot after every command
    pub fn subscribe(&self) -> watch::Receiver<RecoverySnapshot> {
        self.snapshots.subscribe()
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Store a new value for `id`
    ///
    /// A field currently in error is revalidated so the error clears as soon
    /// as the input is fixed.
    pub fn update_field(&mut self, id: FieldId, value: impl Into<String>) -> Result<()> {
        let state = self.owned_state_mut(id)?;
        state.value = value.into();
        let was_error = state.is_error;

        if was_error {
            self.validate(id);
        }
        self.refresh_enabled();
        self.publish();
        Ok(())
    }

    /// Validate `id` at the end of editing
    pub fn commit_field(&mut self, id: FieldId) -> Result<()> {
        self.owned_state_mut(id)?;
        self.validate(id);
        self.refresh_enabled();
        self.publish();
        Ok(())
    }

    /// Press the primary button
    pub fn submit(&mut self) {
        if !self.action.is_enabled {
            tracing::debug!(step = %self.step, "Submit ignored, action disabled");
            return;
        }

        match self.step {
            RecoveryStep::InputEmail => self.submit_email(),
            RecoveryStep::SendingLetter => self.resend_email(),
            RecoveryStep::InputNewPassword => self.submit_password(),
        }
        self.publish();
    }

    /// Leave the flow for the login screen
    pub fn go_to_login(&mut self) {
        self.countdown.cancel(&*self.ports.scheduler);
        tracing::debug!(step = %self.step, "Returning to login");
        self.ports.navigation.reset_to_root();
        self.refresh_enabled();
        self.publish();
    }

    /// Run the command bound to a control
    pub fn execute(&mut self, command: ActionCommand) {
        match command {
            ActionCommand::GoToLogin => self.go_to_login(),
            command if command == self.action.primary => self.submit(),
            command => {
                tracing::warn!(?command, step = %self.step, "Command not bound on this step");
            }
        }
    }

    /// The waiting screen appeared
    pub fn on_enter_sending_letter(&mut self) {
        if self.step != RecoveryStep::SendingLetter {
            tracing::debug!(step = %self.step, "Enter hook ignored outside sending-letter");
            return;
        }
        if self.countdown.is_running() {
            return;
        }

        self.countdown.start(
            &*self.ports.scheduler,
            self.config.advance_delay(),
            self.config.tick_interval(),
        );
        self.action.header_message = Some(self.config.copy.countdown_header(self.countdown.remaining()));
        self.refresh_enabled();
        self.publish();
    }

    /// The waiting screen went away; stops both timers
    pub fn on_leave_sending_letter(&mut self) {
        if self.step != RecoveryStep::SendingLetter {
            tracing::debug!(step = %self.step, "Leave hook ignored outside sending-letter");
            return;
        }

        self.countdown.cancel(&*self.ports.scheduler);
        self.refresh_enabled();
        self.publish();
    }

    /// Route a timer firing; handles this controller doesn't own are ignored
    pub fn on_timer(&mut self, handle: TimerHandle) {
        match self.countdown.on_timer(handle, &*self.ports.scheduler) {
            CountdownEvent::Ignored => {
                tracing::debug!(timer = handle.id(), "Ignoring stale timer");
                return;
            }
            CountdownEvent::AdvanceDue => {
                self.ports.navigation.advance(RecoveryStep::InputNewPassword);
            }
            CountdownEvent::Tick(remaining) => {
                self.action.header_message = Some(self.config.copy.countdown_header(remaining));
            }
            CountdownEvent::Expired => {
                self.action.header_message = None;
            }
        }
        self.refresh_enabled();
        self.publish();
    }

    /// An outbound request reported failure
    pub fn on_request_failed(&mut self, failure: RequestFailure) {
        tracing::warn!(step = %self.step, kind = ?failure.kind, "Request failed: {}", failure.reason);

        match (self.step, failure.kind) {
            (RecoveryStep::InputEmail, RequestKind::RecoveryEmail) => {
                self.action.header_message = Some(self.config.copy.send_failed.clone());
            }
            (RecoveryStep::SendingLetter, RequestKind::RecoveryEmail) => {
                // Let the user retry right away
                self.countdown.expire(&*self.ports.scheduler);
                self.action.header_message = Some(self.config.copy.send_failed.clone());
            }
            (RecoveryStep::InputNewPassword, RequestKind::NewPassword) => {
                let message = self.config.copy.save_failed.clone();
                if let Some(password) = self.state_mut(FieldId::Password) {
                    password.set_error(message);
                }
            }
            (step, kind) => {
                tracing::debug!(%step, ?kind, "Ignoring failure not owned by this step");
                return;
            }
        }
        self.refresh_enabled();
        self.publish();
    }

    // =========================================================================
    // Submission
    // =========================================================================

    fn submit_email(&mut self) {
        // Submission validates even if the field never committed
        self.validate(FieldId::Email);
        self.refresh_enabled();
        if !self.action.is_enabled {
            return;
        }

        let address = self
            .state(FieldId::Email)
            .map(|s| s.value.trim().to_string())
            .unwrap_or_default();
        if address.is_empty() {
            return;
        }
        self.action.header_message = None;
        self.recovery_address = Some(address.clone());

        self.ports.email.request_recovery_email(&address);
        self.ports.navigation.advance(RecoveryStep::SendingLetter);
    }

    fn resend_email(&mut self) {
        match &self.recovery_address {
            Some(address) => self.ports.email.request_recovery_email(address),
            None => tracing::warn!("Resend requested without a recovery address"),
        }

        self.countdown
            .rearm_tick(&*self.ports.scheduler, self.config.tick_interval());
        self.action.header_message = Some(self.config.copy.countdown_header(self.countdown.remaining()));
        self.refresh_enabled();
    }

    fn submit_password(&mut self) {
        self.validate(FieldId::Password);
        self.refresh_enabled();
        if !self.action.is_enabled {
            return;
        }

        let password = self
            .state(FieldId::Password)
            .map(|s| s.value.clone())
            .unwrap_or_default();
        self.ports.email.submit_new_password(&password);
        self.ports.navigation.reset_to_root();
    }

    // =========================================================================
    // Validation
    // =========================================================================

    fn validate(&mut self, id: FieldId) {
        match id {
            FieldId::Email => self.validate_email(),
            FieldId::Password | FieldId::RepeatPassword => self.validate_passwords(),
        }
    }

    fn validate_email(&mut self) {
        let helper = helper_text(&self.config, FieldId::Email);
        let message = self.config.copy.email_invalid.clone();
        let email = Arc::clone(&self.ports.email);

        let Some(field) = self.state_mut(FieldId::Email) else {
            return;
        };
        let value = field.value.trim();
        if value.is_empty() || email.is_valid_address(value) {
            field.clear_error(helper);
        } else {
            field.set_error(message);
        }
    }

    /// Validates the pair; an invalid password skips the repeat comparison
    fn validate_passwords(&mut self) {
        let helper = helper_text(&self.config, FieldId::Password);
        let invalid = self.config.copy.password_invalid.clone();
        let mismatch = self.config.copy.passwords_mismatch.clone();
        let validator = Arc::clone(&self.password_validator);

        let password = self
            .state(FieldId::Password)
            .map(|s| s.value.clone())
            .unwrap_or_default();
        let Some(password_state) = self.state_mut(FieldId::Password) else {
            return;
        };

        if password.is_empty() {
            password_state.clear_error(helper);
            return;
        }
        if !validator.is_valid(&password) {
            password_state.set_error(invalid);
            return;
        }
        password_state.clear_error(helper);

        let repeat_helper = helper_text(&self.config, FieldId::RepeatPassword);
        let Some(repeat) = self.state_mut(FieldId::RepeatPassword) else {
            return;
        };
        if repeat.value.is_empty() || repeat.value == password {
            repeat.clear_error(repeat_helper);
        } else {
            repeat.set_error(mismatch);
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn state(&self, id: FieldId) -> Option<&FieldState> {
        self.fields.iter().find(|(f, _)| *f == id).map(|(_, s)| s)
    }

    fn state_mut(&mut self, id: FieldId) -> Option<&mut FieldState> {
        self.fields.iter_mut().find(|(f, _)| *f == id).map(|(_, s)| s)
    }

    fn owned_state_mut(&mut self, id: FieldId) -> Result<&mut FieldState> {
        let step = self.step;
        self.state_mut(id).ok_or_else(|| {
            tracing::warn!(field = %id, step = %step, "Field not in step");
            RecoveryError::FieldNotInStep { field: id, step }
        })
    }

    fn refresh_enabled(&mut self) {
        self.action.is_enabled = match self.step {
            RecoveryStep::SendingLetter => self.countdown.state().is_expired(),
            _ => self.fields.iter().all(|(_, s)| s.is_acceptable()),
        };
    }

    fn publish(&mut self) {
        self.revision += 1;
        self.snapshots.send_replace(self.snapshot());
    }
}

impl Drop for RecoveryFlowController {
    fn drop(&mut self) {
        self.countdown.cancel(&*self.ports.scheduler);
    }
}

impl std::fmt::Debug for RecoveryFlowController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecoveryFlowController")
            .field("step", &self.step)
            .field("fields", &self.fields)
            .field("action", &self.action)
            .field("countdown", &self.countdown)
            .field("revision", &self.revision)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Step Templates
// =============================================================================

fn helper_text(config: &RecoveryConfig, id: FieldId) -> Option<String> {
    match id {
        FieldId::Email => Some(config.copy.email_helper.clone()),
        FieldId::Password => Some(config.copy.password_helper.clone()),
        FieldId::RepeatPassword => None,
    }
}

fn field_view(config: &RecoveryConfig, id: FieldId, state: FieldState) -> FieldView {
    let copy = &config.copy;
    let (label, placeholder, is_secure) = match id {
        FieldId::Email => (&copy.email_label, &copy.email_placeholder, false),
        FieldId::Password => (&copy.password_label, &copy.password_placeholder, true),
        FieldId::RepeatPassword => (&copy.repeat_label, &copy.repeat_placeholder, true),
    };
    FieldView {
        id,
        label: label.clone(),
        placeholder: placeholder.clone(),
        is_secure,
        state,
    }
}

fn initial_action(step: RecoveryStep, config: &RecoveryConfig) -> ConfirmAction {
    let copy = &config.copy;
    let (title, primary) = match step {
        RecoveryStep::InputEmail => (&copy.send_title, ActionCommand::SendRecoveryEmail),
        RecoveryStep::SendingLetter => (&copy.resend_title, ActionCommand::ResendEmail),
        RecoveryStep::InputNewPassword => (&copy.save_title, ActionCommand::SubmitNewPassword),
    };
    ConfirmAction {
        title: title.clone(),
        is_enabled: false,
        header_message: None,
        footer_label: copy.back_to_login.clone(),
        primary,
        footer: ActionCommand::GoToLogin,
    }
}
