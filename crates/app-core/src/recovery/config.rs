//! Recovery flow configuration
//!
//! Timings, password policy and user-facing copy. Every field has a default,
//! so a partial JSON document is enough to override a single value.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use super::validation::PasswordPolicy;
use super::{RecoveryError, Result};

/// User-facing text for every step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecoveryCopy {
    /// Email field label
    pub email_label: String,
    /// Email field placeholder
    pub email_placeholder: String,
    /// Helper text under the email field
    pub email_helper: String,
    /// Error text for an implausible address
    pub email_invalid: String,
    /// Button title on the email step
    pub send_title: String,
    /// Explanation shown while waiting for the letter
    pub letter_sent_message: String,
    /// Button title on the waiting step
    pub resend_title: String,
    /// Cooldown header; `{time}` is replaced with `m:ss`
    pub resend_countdown: String,
    /// Password field label
    pub password_label: String,
    /// Password field placeholder
    pub password_placeholder: String,
    /// Helper text explaining the password rule
    pub password_helper: String,
    /// Error text when the password breaks the rule
    pub password_invalid: String,
    /// Repeat field label
    pub repeat_label: String,
    /// Repeat field placeholder
    pub repeat_placeholder: String,
    /// Error text when the passwords differ
    pub passwords_mismatch: String,
    /// Button title on the password step
    pub save_title: String,
    /// Footer link back to login
    pub back_to_login: String,
    /// Header shown when a letter could not be sent
    pub send_failed: String,
    /// Error shown when the new password could not be stored
    pub save_failed: String,
}

impl Default for RecoveryCopy {
    fn default() -> Self {
        Self {
            email_label: "Email".to_string(),
            email_placeholder: "Enter your email".to_string(),
            email_helper: "We will send a recovery link to this address".to_string(),
            email_invalid: "Enter a valid email address".to_string(),
            send_title: "Send link".to_string(),
            letter_sent_message: "A recovery letter has been sent to your email. \
                                  Please check your spam folder too."
                .to_string(),
            resend_title: "Send again".to_string(),
            resend_countdown: "You can request again in {time}".to_string(),
            password_label: "Password".to_string(),
            password_placeholder: "Enter a password".to_string(),
            password_helper: "At least 8 characters, with digits and latin letters".to_string(),
            password_invalid: "Password must be at least 8 characters and contain digits \
                               and latin letters"
                .to_string(),
            repeat_label: "Repeat password".to_string(),
            repeat_placeholder: "Repeat the password".to_string(),
            passwords_mismatch: "Passwords do not match".to_string(),
            save_title: "Save password".to_string(),
            back_to_login: "Back to login".to_string(),
            send_failed: "Could not send the letter. Try again".to_string(),
            save_failed: "Could not save the password. Try again".to_string(),
        }
    }
}

impl RecoveryCopy {
    /// Cooldown header for `remaining` seconds
    pub fn countdown_header(&self, remaining: u32) -> String {
        self.resend_countdown
            .replace("{time}", &super::types::format_remaining(remaining))
    }
}

/// Recovery flow configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecoveryConfig {
    /// Delay before the waiting step moves on to the password step
    pub advance_delay_ms: u64,
    /// Length of one cooldown tick
    pub tick_interval_ms: u64,
    /// Ticks before resend is allowed
    pub resend_cooldown_ticks: u32,
    /// Rule for new passwords
    pub password: PasswordPolicy,
    /// User-facing text
    pub copy: RecoveryCopy,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            advance_delay_ms: 5_000,
            tick_interval_ms: 1_000,
            resend_cooldown_ticks: 180,
            password: PasswordPolicy::default(),
            copy: RecoveryCopy::default(),
        }
    }
}

impl RecoveryConfig {
    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&contents)?;
        tracing::debug!(path = %path.as_ref().display(), "Loaded recovery config");
        Ok(config)
    }

    /// Reject timings that would stall or spin the countdown
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(RecoveryError::InvalidConfig(
                "tickIntervalMs must be greater than zero".to_string(),
            ));
        }
        if self.resend_cooldown_ticks == 0 {
            return Err(RecoveryError::InvalidConfig(
                "resendCooldownTicks must be greater than zero".to_string(),
            ));
        }
        if self.password.min_length == 0 {
            return Err(RecoveryError::InvalidConfig(
                "password.minLength must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Advance delay as a duration
    pub fn advance_delay(&self) -> Duration {
        Duration::from_millis(self.advance_delay_ms)
    }

    /// Tick interval as a duration
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = RecoveryConfig::default();
        assert_eq!(config.advance_delay(), Duration::from_secs(5));
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
        assert_eq!(config.resend_cooldown_ticks, 180);
        assert_eq!(config.password.min_length, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            RecoveryConfig::from_json(r#"{"resendCooldownTicks": 60, "password": {"minLength": 10}}"#)
                .unwrap();
        assert_eq!(config.resend_cooldown_ticks, 60);
        assert_eq!(config.password.min_length, 10);
        assert!(config.password.require_digit);
        assert_eq!(config.advance_delay_ms, 5_000);
        assert_eq!(config.copy, RecoveryCopy::default());
    }

    #[test]
    fn test_rejects_zero_tick() {
        let err = RecoveryConfig::from_json(r#"{"tickIntervalMs": 0}"#).unwrap_err();
        assert!(matches!(err, RecoveryError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = RecoveryConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, RecoveryError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"copy": {{"sendTitle": "Send"}}}}"#).unwrap();

        let config = RecoveryConfig::load(file.path()).unwrap();
        assert_eq!(config.copy.send_title, "Send");
        assert_eq!(config.copy.back_to_login, "Back to login");
    }

    #[test]
    fn test_load_missing_file() {
        let err = RecoveryConfig::load("/nonexistent/recovery.json").unwrap_err();
        assert!(matches!(err, RecoveryError::Io(_)));
    }

    #[test]
    fn test_countdown_header() {
        let copy = RecoveryCopy::default();
        assert_eq!(copy.countdown_header(180), "You can request again in 3:00");
        assert_eq!(copy.countdown_header(61), "You can request again in 1:01");
    }
}
