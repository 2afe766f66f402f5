//! UI layer for the desktop GUI.

pub mod app;

pub use app::{PersistedDesktopSettings, StartupConfig, VocalPdfApp, SETTINGS_STORAGE_KEY};
