//! Typed configuration structures
//!
//! Every field has a default, so a missing or partial file still yields a
//! usable configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::questions::QuestionSettings;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QotdConfig {
    /// Directory holding `questions.json`, `polls.json` and `scores.json`
    pub data_dir: PathBuf,

    /// Guesses allowed per user per question
    pub max_guesses: u32,

    /// Hours after publication before a question expires
    pub question_expiry_hours: u32,

    /// Days a message stays watched for reactions
    pub engagement_max_age_days: u32,

    /// Hours an expired question stays in the archive
    pub old_question_window_hours: u32,

    /// Channel where newly published items are announced
    pub deploy_channel: String,

    /// Channel where awarded points are announced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub point_announcement_channel: Option<String>,

    /// User allowed to run developer-only commands
    #[serde(skip_serializing_if = "Option::is_none")]
    pub developer_id: Option<String>,

    /// The bot's own user ID, used to recognise mentions
    pub bot_user_id: String,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for QotdConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            max_guesses: 3,
            question_expiry_hours: 18,
            engagement_max_age_days: 5,
            old_question_window_hours: 24,
            deploy_channel: "general".to_string(),
            point_announcement_channel: None,
            developer_id: None,
            bot_user_id: "QOTD".to_string(),
            logging: LoggingConfig::default(),
        }
    }
}

impl QotdConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        let nonzero = [
            ("maxGuesses", self.max_guesses),
            ("questionExpiryHours", self.question_expiry_hours),
            ("engagementMaxAgeDays", self.engagement_max_age_days),
            ("oldQuestionWindowHours", self.old_question_window_hours),
        ];
        for (path, value) in nonzero {
            if value == 0 {
                errors.push(ValidationError {
                    path: path.to_string(),
                    message: "must be greater than zero".to_string(),
                });
            }
        }

        if self.deploy_channel.trim().is_empty() {
            errors.push(ValidationError {
                path: "deployChannel".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        if self.bot_user_id.trim().is_empty() {
            errors.push(ValidationError {
                path: "botUserId".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        if !matches!(self.logging.format.as_str(), "json" | "text") {
            errors.push(ValidationError {
                path: "logging.format".to_string(),
                message: format!("unknown format '{}', expected json or text", self.logging.format),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Settings handed to the question store
    pub fn question_settings(&self) -> QuestionSettings {
        QuestionSettings {
            max_guesses: self.max_guesses,
            expiry_hours: self.question_expiry_hours,
            old_question_window_hours: self.old_question_window_hours,
        }
    }

    /// Channel for point announcements, falling back to the deploy channel
    pub fn point_channel(&self) -> &str {
        self.point_announcement_channel
            .as_deref()
            .unwrap_or(&self.deploy_channel)
    }

    pub fn is_developer(&self, user_id: &str) -> bool {
        self.developer_id.as_deref() == Some(user_id)
    }
}

/// `~/.local/share/qotd` on Linux, or `.local/share/qotd` without a home directory
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from(".local/share"))
        .join("qotd")
}

/// Validation error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingConfig {
    /// Log level or filter directive (error, warn, info, debug, trace)
    pub level: String,

    /// Log format (json, text)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = QotdConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_guesses, 3);
        assert_eq!(config.question_expiry_hours, 18);
        assert_eq!(config.engagement_max_age_days, 5);
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let config: QotdConfig =
            serde_json::from_str(r#"{"maxGuesses": 5, "logging": {"format": "json"}}"#).unwrap();
        assert_eq!(config.max_guesses, 5);
        assert_eq!(config.question_expiry_hours, 18);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_validate_collects_every_problem() {
        let config = QotdConfig {
            max_guesses: 0,
            question_expiry_hours: 0,
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "xml".to_string(),
            },
            ..QotdConfig::default()
        };
        let errors = config.validate().unwrap_err();
        let paths: Vec<&str> = errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["maxGuesses", "questionExpiryHours", "logging.format"]);
    }

    #[test]
    fn test_point_channel_falls_back_to_deploy_channel() {
        let mut config = QotdConfig::default();
        assert_eq!(config.point_channel(), "general");
        config.point_announcement_channel = Some("points".to_string());
        assert_eq!(config.point_channel(), "points");
    }

    #[test]
    fn test_is_developer() {
        let mut config = QotdConfig::default();
        assert!(!config.is_developer("U1"));
        config.developer_id = Some("U1".to_string());
        assert!(config.is_developer("U1"));
        assert!(!config.is_developer("U2"));
    }
}
