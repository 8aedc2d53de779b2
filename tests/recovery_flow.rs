//! Recovery Flow Integration Tests
//!
//! End-to-end tests driving the recovery screens through the shared
//! navigator, with both the manual and the tokio-backed scheduler.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use termeet::app_core::recovery::{
    ActionCommand, EmailRequest, EmailTransport, FieldId, RequestKind, SpawningEmailService,
    StubEmailService, TransportError,
};
use termeet::{
    ManualScheduler, Navigator, RecoveryConfig, RecoveryScreens, RecoveryStep, Route,
    TokioScheduler,
};
use tokio::runtime::Handle;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct Flow {
    screens: RecoveryScreens,
    navigator: Navigator,
    email: Arc<StubEmailService>,
    scheduler: Arc<ManualScheduler>,
}

impl Flow {
    fn open(config: RecoveryConfig) -> Self {
        init_tracing();
        let navigator = Navigator::default();
        // Fixture rule: "123" is the only rejected address
        let email = Arc::new(StubEmailService::with_validator(Arc::new(|v: &str| {
            v != "123"
        })));
        let scheduler = Arc::new(ManualScheduler::new());
        let screens = RecoveryScreens::new(
            navigator.clone(),
            email.clone(),
            scheduler.clone(),
            config,
        );
        Self {
            screens,
            navigator,
            email,
            scheduler,
        }
    }

    fn advance_secs(&mut self, secs: u64) {
        let screens = &mut self.screens;
        self.scheduler
            .advance(Duration::from_secs(secs), |h| screens.on_timer(h));
    }

    fn step(&self) -> Option<RecoveryStep> {
        self.screens.current().map(|c| c.step())
    }

    fn header(&self) -> Option<String> {
        self.screens
            .current()
            .and_then(|c| c.confirm_action().header_message.clone())
    }

    fn submit_email(&mut self, address: &str) {
        self.screens.dispatch(|c| {
            c.update_field(FieldId::Email, address).unwrap();
            c.commit_field(FieldId::Email).unwrap();
            c.submit();
        });
    }
}

/// Test the whole flow from login back to login
#[test]
fn test_full_recovery_round_trip() {
    let mut flow = Flow::open(RecoveryConfig::default());
    assert_eq!(flow.step(), Some(RecoveryStep::InputEmail));

    flow.submit_email("alice@example.com");
    assert_eq!(flow.step(), Some(RecoveryStep::SendingLetter));
    assert_eq!(
        flow.navigator.current().to_path(),
        "/password-recovery/letter"
    );
    assert_eq!(
        flow.header().as_deref(),
        Some("You can request again in 3:00")
    );

    flow.advance_secs(1);
    assert_eq!(
        flow.header().as_deref(),
        Some("You can request again in 2:59")
    );

    // Advance delay elapses
    flow.advance_secs(4);
    assert_eq!(flow.step(), Some(RecoveryStep::InputNewPassword));
    assert_eq!(flow.scheduler.pending(), 0);

    flow.screens.dispatch(|c| {
        c.update_field(FieldId::Password, "newpass123").unwrap();
        c.commit_field(FieldId::Password).unwrap();
        c.update_field(FieldId::RepeatPassword, "newpass123").unwrap();
        c.commit_field(FieldId::RepeatPassword).unwrap();
        assert!(c.confirm_action().is_enabled);
        c.execute(ActionCommand::SubmitNewPassword);
    });

    assert!(!flow.screens.is_active());
    assert_eq!(flow.navigator.current(), Route::Login);
    assert_eq!(
        flow.email.requests(),
        vec![
            EmailRequest::RecoveryEmail("alice@example.com".to_string()),
            EmailRequest::NewPassword("newpass123".to_string()),
        ]
    );
}

/// Test that a rejected address keeps the user on the first step
#[test]
fn test_rejected_address_stays_on_email_step() {
    let mut flow = Flow::open(RecoveryConfig::default());
    flow.submit_email("123");

    assert_eq!(flow.step(), Some(RecoveryStep::InputEmail));
    let props = flow.screens.props().unwrap();
    assert!(props.inputs[0].is_errored);
    assert!(!props.button.is_enabled);
    assert!(flow.email.requests().is_empty());

    flow.submit_email("bob@example.com");
    assert_eq!(flow.step(), Some(RecoveryStep::SendingLetter));
}

/// Test mismatch feedback on the password step
#[test]
fn test_password_mismatch_blocks_submission() {
    let mut flow = Flow::open(RecoveryConfig::default());
    flow.submit_email("alice@example.com");
    flow.advance_secs(5);

    flow.screens.dispatch(|c| {
        c.update_field(FieldId::Password, "newpass123").unwrap();
        c.update_field(FieldId::RepeatPassword, "newpass124").unwrap();
        c.commit_field(FieldId::RepeatPassword).unwrap();
        c.submit();
    });

    let props = flow.screens.props().unwrap();
    assert_eq!(props.inputs.len(), 2);
    assert!(props.inputs[1].is_errored);
    assert_eq!(
        props.inputs[1].footer_text.as_deref(),
        Some("Passwords do not match")
    );
    assert_eq!(flow.step(), Some(RecoveryStep::InputNewPassword));
}

/// Test leaving mid-countdown through the footer link
#[test]
fn test_back_to_login_during_countdown() {
    let mut flow = Flow::open(RecoveryConfig::default());
    flow.submit_email("alice@example.com");
    flow.advance_secs(2);

    let footer = flow.screens.props().unwrap().button.footer_action.unwrap();
    flow.screens.dispatch(|c| c.execute(footer));

    assert!(!flow.screens.is_active());
    assert_eq!(flow.navigator.depth(), 1);
    assert_eq!(flow.scheduler.pending(), 0);

    // Time keeps passing without effect
    flow.advance_secs(600);
    assert_eq!(flow.navigator.current(), Route::Login);
}

/// Test a shortened cooldown loaded from a config file
#[test]
fn test_resend_with_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"advanceDelayMs": 60000, "resendCooldownTicks": 3}}"#
    )
    .unwrap();
    let config = RecoveryConfig::load(file.path()).unwrap();
    assert_eq!(config.tick_interval_ms, 1000);

    let mut flow = Flow::open(config);
    flow.submit_email("alice@example.com");

    flow.advance_secs(2);
    assert!(!flow.screens.props().unwrap().button.is_enabled);

    flow.advance_secs(1);
    let button = flow.screens.props().unwrap().button;
    assert!(button.is_enabled);
    assert_eq!(button.header_text, None);

    flow.screens.dispatch(|c| c.execute(button.press().unwrap()));
    assert_eq!(
        flow.header().as_deref(),
        Some("You can request again in 0:03")
    );
    assert_eq!(flow.email.requests().len(), 2);
    assert_eq!(flow.step(), Some(RecoveryStep::SendingLetter));
}

/// Test snapshot subscription and serialization of render props
#[test]
fn test_subscription_and_props_json() {
    let mut flow = Flow::open(RecoveryConfig::default());
    let mut rx = flow.screens.current().unwrap().subscribe();

    flow.screens.dispatch(|c| {
        c.update_field(FieldId::Email, "alice@example.com").unwrap();
    });
    assert!(rx.has_changed().unwrap());
    assert!(rx.borrow_and_update().confirm.is_enabled);

    let json = serde_json::to_value(flow.screens.props().unwrap()).unwrap();
    assert_eq!(json["route"]["params"]["step"], "inputEmail");
    assert_eq!(json["inputs"][0]["text"], "alice@example.com");
    assert_eq!(json["button"]["isEnabled"], true);
    assert_eq!(json["button"]["action"], "sendRecoveryEmail");
}

// =============================================================================
// Tokio runtime
// =============================================================================

struct FlakyTransport;

#[async_trait]
impl EmailTransport for FlakyTransport {
    async fn send_recovery_email(&self, _address: String) -> Result<(), TransportError> {
        Err(TransportError::Network("connection reset".to_string()))
    }

    async fn update_password(&self, _password: String) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Test the advance delay on real (paused) tokio timers
#[tokio::test(start_paused = true)]
async fn test_tokio_timers_drive_flow() {
    init_tracing();
    let navigator = Navigator::default();
    let (scheduler, mut timers) = TokioScheduler::new(Handle::current());
    let mut screens = RecoveryScreens::new(
        navigator.clone(),
        Arc::new(StubEmailService::new()),
        Arc::new(scheduler),
        RecoveryConfig::default(),
    );
    let started = tokio::time::Instant::now();

    screens.dispatch(|c| {
        c.update_field(FieldId::Email, "alice@example.com").unwrap();
        c.submit();
    });

    while screens.current().map(|c| c.step()) != Some(RecoveryStep::InputNewPassword) {
        let handle = timers.recv().await.unwrap();
        screens.on_timer(handle);
    }
    assert!(started.elapsed() >= Duration::from_secs(5));

    // Both timers of the hidden step are gone
    let next = tokio::time::timeout(Duration::from_secs(30), timers.recv()).await;
    assert!(next.is_err());
}

/// Test that a failed send unlocks resend straight away
#[tokio::test(start_paused = true)]
async fn test_send_failure_reaches_visible_screen() {
    init_tracing();
    let (scheduler, _timers) = TokioScheduler::new(Handle::current());
    let (email, mut failures) = SpawningEmailService::new(FlakyTransport, Handle::current());
    let mut screens = RecoveryScreens::new(
        Navigator::default(),
        Arc::new(email),
        Arc::new(scheduler),
        RecoveryConfig::default(),
    );

    screens.dispatch(|c| {
        c.update_field(FieldId::Email, "alice@example.com").unwrap();
        c.submit();
    });
    let button = screens.props().unwrap().button;
    assert!(!button.is_enabled);

    let failure = failures.recv().await.unwrap();
    assert_eq!(failure.kind, RequestKind::RecoveryEmail);
    screens.on_request_failed(failure);

    let props = screens.props().unwrap();
    assert!(props.button.is_enabled);
    assert_eq!(
        props.button.header_text.as_deref(),
        Some(RecoveryConfig::default().copy.send_failed.as_str())
    );
}
