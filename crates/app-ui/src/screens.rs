//! Recovery screens
//!
//! [`RecoveryScreens`] mirrors the recovery routes on the [`Navigator`]'s
//! stack with one [`RecoveryFlowController`] per route. Going back reveals the
//! previous step's controller as it was left; moving forward derives a fresh
//! controller that inherits the recovery address.

use std::sync::Arc;

use app_core::recovery::{
    EmailService, FieldValidator, RecoveryConfig, RecoveryFlowController, RecoveryPorts,
    RecoverySnapshot, RecoveryStep, RequestFailure,
};
use app_core::scheduler::{Scheduler, TimerHandle};
use serde::{Deserialize, Serialize};

use crate::components::{ConfirmButton, InputText};
use crate::navigation::{Navigator, Route};

/// Everything the frontend needs to draw one recovery screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryScreenProps {
    /// Route being shown
    pub route: Route,
    /// Navigation bar title
    pub title: String,
    /// Body text (sending-letter step)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Inputs in display order
    pub inputs: Vec<InputText>,
    /// Call-to-action
    pub button: ConfirmButton,
}

impl From<&RecoverySnapshot> for RecoveryScreenProps {
    fn from(snapshot: &RecoverySnapshot) -> Self {
        let route = Route::PasswordRecovery {
            step: snapshot.step,
        };
        Self {
            title: route.title().to_string(),
            route,
            message: snapshot.message.clone(),
            inputs: snapshot.fields.iter().map(InputText::from).collect(),
            button: ConfirmButton::from(&snapshot.confirm),
        }
    }
}

/// Controller stack for the recovery flow
pub struct RecoveryScreens {
    navigator: Navigator,
    ports: RecoveryPorts,
    config: RecoveryConfig,
    password_validator: Option<Arc<dyn FieldValidator>>,
    controllers: Vec<RecoveryFlowController>,
}

impl RecoveryScreens {
    /// Open the flow on top of the navigator's current route
    pub fn new(
        navigator: Navigator,
        email: Arc<dyn EmailService>,
        scheduler: Arc<dyn Scheduler>,
        config: RecoveryConfig,
    ) -> Self {
        let ports = RecoveryPorts::new(Arc::new(navigator.clone()), email, scheduler);
        let mut screens = Self {
            navigator,
            ports,
            config,
            password_validator: None,
            controllers: Vec::new(),
        };
        screens.navigator.navigate(Route::PasswordRecovery {
            step: RecoveryStep::InputEmail,
        });
        screens.sync();
        screens
    }

    /// Replace the password rule on open steps and on any opened later
    pub fn with_password_validator(mut self, validator: Arc<dyn FieldValidator>) -> Self {
        for controller in &mut self.controllers {
            controller.set_password_validator(Arc::clone(&validator));
        }
        self.password_validator = Some(validator);
        self
    }

    /// Navigator the flow runs on
    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// Whether any recovery step is still on the stack
    pub fn is_active(&self) -> bool {
        !self.controllers.is_empty()
    }

    /// Number of recovery steps on the stack
    pub fn depth(&self) -> usize {
        self.controllers.len()
    }

    /// Visible controller
    pub fn current(&self) -> Option<&RecoveryFlowController> {
        self.controllers.last()
    }

    /// Snapshot of the visible controller
    pub fn snapshot(&self) -> Option<RecoverySnapshot> {
        self.current().map(RecoveryFlowController::snapshot)
    }

    /// Render props of the visible screen
    pub fn props(&self) -> Option<RecoveryScreenProps> {
        self.snapshot().as_ref().map(RecoveryScreenProps::from)
    }

    /// Run `f` on the visible controller, then follow any navigation it did
    pub fn dispatch<R>(&mut self, f: impl FnOnce(&mut RecoveryFlowController) -> R) -> Option<R> {
        let result = self.controllers.last_mut().map(f);
        self.sync();
        result
    }

    /// Route a timer firing to whichever controller owns it
    pub fn on_timer(&mut self, handle: TimerHandle) {
        for controller in &mut self.controllers {
            controller.on_timer(handle);
        }
        self.sync();
    }

    /// Feed a backend failure to the visible controller
    pub fn on_request_failed(&mut self, failure: RequestFailure) {
        self.dispatch(|c| c.on_request_failed(failure));
    }

    /// Pop the visible step; from the first step this leaves the flow
    pub fn back(&mut self) -> bool {
        if self.navigator.current().recovery_step().is_none() {
            return false;
        }
        let popped = self.navigator.go_back();
        self.sync();
        popped
    }

    /// Reconcile the controller stack with the navigator's recovery routes
    pub fn sync(&mut self) {
        let steps = self.navigator.recovery_steps();
        let common = self
            .controllers
            .iter()
            .zip(&steps)
            .take_while(|(controller, step)| controller.step() == **step)
            .count();

        if common == self.controllers.len() && common == steps.len() {
            return;
        }

        if let Some(hidden) = self.controllers.last_mut() {
            hidden.on_leave_sending_letter();
        }
        self.controllers.truncate(common);

        for step in &steps[common..] {
            let controller = match self.controllers.last() {
                Some(previous) => previous.derive(*step),
                None => self.root_controller(*step),
            };
            tracing::debug!(step = %step, "Recovery screen pushed");
            self.controllers.push(controller);
        }

        if let Some(visible) = self.controllers.last_mut() {
            visible.on_enter_sending_letter();
        }
    }

    fn root_controller(&self, step: RecoveryStep) -> RecoveryFlowController {
        let controller =
            RecoveryFlowController::new(step, self.ports.clone(), self.config.clone());
        match &self.password_validator {
            Some(validator) => controller.with_password_validator(Arc::clone(validator)),
            None => controller,
        }
    }
}

impl std::fmt::Debug for RecoveryScreens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecoveryScreens")
            .field("navigator", &self.navigator)
            .field("controllers", &self.controllers)
            .finish_non_exhaustive()
    }
}
