//! Worker/speech events delivered to the UI thread and error modeling for the status line.

use client_core::SessionCompletion;
use shared::domain::UtteranceId;

pub enum UiEvent {
    Info(String),
    Error(UiError),
    Completed(SessionCompletion),
    UtteranceFinished(UtteranceId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Configuration,
    Speech,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    CommandQueue,
    General,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("url")
            || message_lower.contains("scheme")
            || message_lower.contains("settings")
        {
            UiErrorCategory::Configuration
        } else if message_lower.contains("speech") || message_lower.contains("utterance") {
            UiErrorCategory::Speech
        } else if message_lower.contains("timeout")
            || message_lower.contains("timed out")
            || message_lower.contains("connection")
            || message_lower.contains("network")
            || message_lower.contains("unavailable")
            || message_lower.contains("disconnect")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Startup and queue failures leave the app unable to reach the service.
    pub fn is_persistent(&self) -> bool {
        matches!(
            self.context,
            UiErrorContext::BackendStartup | UiErrorContext::CommandQueue
        )
    }
}

pub fn err_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::Transport => "Transport",
        UiErrorCategory::Configuration => "Configuration",
        UiErrorCategory::Speech => "Speech",
        UiErrorCategory::Unknown => "Unexpected",
    }
}
