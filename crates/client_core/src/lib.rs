//! Client side of the vocal PDF reader: the document session controller, the
//! extraction service client, and the speech engine seam.

pub mod config;
pub mod document;
pub mod extraction;
pub mod session;
pub mod speech;

pub use config::{load_settings, ClientSettings, SettingsError};
pub use document::SelectedDocument;
pub use extraction::{ClientError, ExtractionBackend, HttpExtractionClient};
pub use session::{execute, DocumentSession, SessionCompletion, SessionError, SessionRequest};
pub use speech::{
    platform_speech_engine, SpeechEngine, SpeechError, UnavailableSpeechEngine,
    UtteranceEndHandler,
};

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
