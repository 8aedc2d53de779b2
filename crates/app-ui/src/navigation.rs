//! Navigation system for Termeet
//!
//! This module provides the navigation model for the account screens and the
//! main tabs:
//! - Route definitions with path mapping
//! - Tab navigation
//! - Navigation stack management
//! - A shared [`Navigator`] that the recovery flow drives through
//!   [`NavigationPort`]

use app_core::recovery::{NavigationPort, RecoveryStep};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

// =============================================================================
// Route Definitions
// =============================================================================

/// All possible routes in the application
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "route", content = "params")]
pub enum Route {
    // Auth
    /// Login screen, root of the unauthenticated stack
    #[default]
    Login,
    /// Create account
    Registration,
    /// Confirmation that a registration letter was sent
    MailInfo,
    /// One step of the password recovery flow
    PasswordRecovery {
        /// Step shown by this screen
        step: RecoveryStep,
    },

    // Main tabs
    /// Upcoming meets
    Meets,
    /// Teams list
    Teams,
    /// New meet composer
    CreateMeet,
    /// Notifications
    Notifications,
    /// Own profile
    Profile,
}

impl Route {
    /// Get the URL path for this route
    pub fn to_path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Registration => "/registration".to_string(),
            Route::MailInfo => "/mail-info".to_string(),
            Route::PasswordRecovery { step } => {
                format!("/password-recovery/{}", step_segment(*step))
            }
            Route::Meets => "/meets".to_string(),
            Route::Teams => "/teams".to_string(),
            Route::CreateMeet => "/meets/new".to_string(),
            Route::Notifications => "/notifications".to_string(),
            Route::Profile => "/profile".to_string(),
        }
    }

    /// Parse a URL path back into a route
    pub fn from_path(path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            ["login"] => Some(Route::Login),
            ["registration"] => Some(Route::Registration),
            ["mail-info"] => Some(Route::MailInfo),
            ["password-recovery"] => Some(Route::PasswordRecovery {
                step: RecoveryStep::InputEmail,
            }),
            ["password-recovery", segment] => {
                step_from_segment(segment).map(|step| Route::PasswordRecovery { step })
            }
            ["meets"] => Some(Route::Meets),
            ["meets", "new"] => Some(Route::CreateMeet),
            ["teams"] => Some(Route::Teams),
            ["notifications"] => Some(Route::Notifications),
            ["profile"] => Some(Route::Profile),
            _ => None,
        }
    }

    /// Check if this route requires authentication
    pub fn requires_auth(&self) -> bool {
        !matches!(
            self,
            Route::Login | Route::Registration | Route::MailInfo | Route::PasswordRecovery { .. }
        )
    }

    /// Get the screen title for this route
    pub fn title(&self) -> &'static str {
        match self {
            Route::Login => "Log in",
            Route::Registration => "Registration",
            Route::MailInfo => "Check your mail",
            Route::PasswordRecovery { .. } => "Password recovery",
            Route::Meets => "Meets",
            Route::Teams => "Teams",
            Route::CreateMeet => "New meet",
            Route::Notifications => "Notifications",
            Route::Profile => "Profile",
        }
    }

    /// Recovery step shown by this route, if any
    pub fn recovery_step(&self) -> Option<RecoveryStep> {
        match self {
            Route::PasswordRecovery { step } => Some(*step),
            _ => None,
        }
    }
}

fn step_segment(step: RecoveryStep) -> &'static str {
    match step {
        RecoveryStep::InputEmail => "email",
        RecoveryStep::SendingLetter => "letter",
        RecoveryStep::InputNewPassword => "new-password",
    }
}

fn step_from_segment(segment: &str) -> Option<RecoveryStep> {
    match segment {
        "email" => Some(RecoveryStep::InputEmail),
        "letter" => Some(RecoveryStep::SendingLetter),
        "new-password" => Some(RecoveryStep::InputNewPassword),
        _ => None,
    }
}

// =============================================================================
// Navigation Tabs
// =============================================================================

/// Main navigation tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum NavigationTab {
    /// Meets tab
    Meets,
    /// Teams tab
    Teams,
    /// Create-meet tab
    CreateMeet,
    /// Notifications tab
    Notifications,
    /// Profile tab
    #[default]
    Profile,
}

impl NavigationTab {
    /// Get the root route for this tab
    pub fn root_route(&self) -> Route {
        match self {
            NavigationTab::Meets => Route::Meets,
            NavigationTab::Teams => Route::Teams,
            NavigationTab::CreateMeet => Route::CreateMeet,
            NavigationTab::Notifications => Route::Notifications,
            NavigationTab::Profile => Route::Profile,
        }
    }

    /// Icon names for the normal and selected states
    pub fn icons(&self) -> (&'static str, &'static str) {
        match self {
            NavigationTab::Meets => ("meets", "meetsSelected"),
            NavigationTab::Teams => ("teams", "teamsSelected"),
            NavigationTab::CreateMeet => ("createMeet", "createMeetSelected"),
            NavigationTab::Notifications => ("notifications", "notificationsSelected"),
            NavigationTab::Profile => ("profile", "profileSelected"),
        }
    }

    /// Get all tabs in order
    pub fn all() -> [NavigationTab; 5] {
        [
            NavigationTab::Meets,
            NavigationTab::Teams,
            NavigationTab::CreateMeet,
            NavigationTab::Notifications,
            NavigationTab::Profile,
        ]
    }
}

// =============================================================================
// Navigation Stack
// =============================================================================

/// A navigation stack entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackEntry {
    /// The route
    pub route: Route,
    /// Unique key for this entry
    pub key: String,
}

impl StackEntry {
    /// Create a new stack entry
    pub fn new(route: Route) -> Self {
        Self {
            route,
            key: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// Push/pop navigation stack over a fixed root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationStack {
    /// Root entry, never popped
    root: StackEntry,
    /// Entries above the root (bottom to top)
    entries: Vec<StackEntry>,
}

impl NavigationStack {
    /// Create a new navigation stack with a root route
    pub fn new(root: Route) -> Self {
        Self {
            root: StackEntry::new(root),
            entries: Vec::new(),
        }
    }

    /// Push a route onto the stack
    pub fn push(&mut self, route: Route) {
        self.entries.push(StackEntry::new(route));
    }

    /// Pop the top route (returns true if popped, false if at root)
    pub fn pop(&mut self) -> bool {
        self.entries.pop().is_some()
    }

    /// Pop to root
    pub fn pop_to_root(&mut self) {
        self.entries.clear();
    }

    /// Get the current (top) route
    pub fn current(&self) -> &Route {
        &self.current_entry().route
    }

    /// Get the current stack entry
    pub fn current_entry(&self) -> &StackEntry {
        self.entries.last().unwrap_or(&self.root)
    }

    /// Root route
    pub fn root(&self) -> &Route {
        &self.root.route
    }

    /// Check if we can go back
    pub fn can_go_back(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Get stack depth, root included
    pub fn depth(&self) -> usize {
        self.entries.len() + 1
    }

    /// Routes from bottom to top, root included
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        std::iter::once(&self.root.route).chain(self.entries.iter().map(|e| &e.route))
    }

    /// Reset to a new root
    pub fn reset(&mut self, route: Route) {
        self.root = StackEntry::new(route);
        self.entries.clear();
    }
}

// =============================================================================
// Navigation State
// =============================================================================

/// Tab selection plus one stack per tab
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationState {
    /// Current active tab
    pub active_tab: NavigationTab,
    /// Stacks for each tab
    pub tab_stacks: HashMap<NavigationTab, NavigationStack>,
}

impl Default for NavigationState {
    fn default() -> Self {
        let tab_stacks = NavigationTab::all()
            .into_iter()
            .map(|tab| (tab, NavigationStack::new(tab.root_route())))
            .collect();

        Self {
            active_tab: NavigationTab::default(),
            tab_stacks,
        }
    }
}

impl NavigationState {
    /// Create a new navigation state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current route of the active tab
    pub fn current_route(&self) -> Route {
        self.tab_stacks
            .get(&self.active_tab)
            .map(|s| s.current().clone())
            .unwrap_or_else(|| self.active_tab.root_route())
    }

    /// Navigate to a route on the active tab
    pub fn navigate(&mut self, route: Route) {
        let tab = self.active_tab;
        self.tab_stacks
            .entry(tab)
            .or_insert_with(|| NavigationStack::new(tab.root_route()))
            .push(route);
    }

    /// Go back on the active tab
    pub fn go_back(&mut self) -> bool {
        self.tab_stacks
            .get_mut(&self.active_tab)
            .is_some_and(|s| s.pop())
    }

    /// Switch to a tab, keeping its stack
    pub fn switch_tab(&mut self, tab: NavigationTab) {
        if self.active_tab != tab {
            tracing::debug!(from = ?self.active_tab, to = ?tab, "Switching tab");
            self.active_tab = tab;
        }
    }

    /// Reset to tab root
    pub fn reset_to_tab(&mut self, tab: NavigationTab) {
        if let Some(stack) = self.tab_stacks.get_mut(&tab) {
            stack.pop_to_root();
        }
        self.active_tab = tab;
    }
}

// =============================================================================
// Navigator
// =============================================================================

/// Shared navigation stack for the unauthenticated screens
///
/// Clones share the same stack. The recovery controllers drive it through
/// [`NavigationPort`]; the presentation layer reads it back.
#[derive(Debug, Clone)]
pub struct Navigator {
    stack: Arc<Mutex<NavigationStack>>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(Route::Login)
    }
}

impl Navigator {
    /// Create a navigator rooted at `root`
    pub fn new(root: Route) -> Self {
        Self {
            stack: Arc::new(Mutex::new(NavigationStack::new(root))),
        }
    }

    /// Push a route
    pub fn navigate(&self, route: Route) {
        tracing::debug!(path = %route.to_path(), "Navigating");
        self.stack.lock().push(route);
    }

    /// Pop the top route; false at root
    pub fn go_back(&self) -> bool {
        self.stack.lock().pop()
    }

    /// Return to the root route
    pub fn pop_to_root(&self) {
        self.stack.lock().pop_to_root();
    }

    /// Top route
    pub fn current(&self) -> Route {
        self.stack.lock().current().clone()
    }

    /// Stack depth, root included
    pub fn depth(&self) -> usize {
        self.stack.lock().depth()
    }

    /// Copy of the stack
    pub fn stack(&self) -> NavigationStack {
        self.stack.lock().clone()
    }

    /// Recovery steps on the stack, bottom to top
    pub fn recovery_steps(&self) -> Vec<RecoveryStep> {
        self.stack
            .lock()
            .routes()
            .filter_map(Route::recovery_step)
            .collect()
    }
}

impl NavigationPort for Navigator {
    fn advance(&self, to: RecoveryStep) {
        self.navigate(Route::PasswordRecovery { step: to });
    }

    fn reset_to_root(&self) {
        tracing::debug!("Popping to root");
        self.pop_to_root();
    }
}
