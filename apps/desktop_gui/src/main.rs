mod backend_bridge;
mod controller;
mod ui;

use clap::Parser;
use client_core::{load_settings, platform_speech_engine, ClientSettings};
use crossbeam_channel::bounded;
use eframe::egui;

use crate::backend_bridge::commands::BackendCommand;
use crate::backend_bridge::runtime;
use crate::controller::events::UiEvent;
use crate::ui::{PersistedDesktopSettings, StartupConfig, VocalPdfApp, SETTINGS_STORAGE_KEY};

const WINDOW_TITLE: &str = "PDF to Speech Converter";

#[derive(Debug, Parser)]
#[command(name = "vocal-pdf-gui", about = "Listen to PDF pages")]
struct GuiArgs {
    /// Extraction service base URL; overrides settings file and environment.
    #[arg(long)]
    base_url: Option<String>,
}

fn resolve_settings(args: &GuiArgs, mut settings: ClientSettings) -> ClientSettings {
    if let Some(base_url) = &args.base_url {
        settings.base_url = base_url.clone();
    }
    settings
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let args = GuiArgs::parse();
    let settings = resolve_settings(&args, load_settings());
    let startup = StartupConfig {
        base_url: settings.base_url.clone(),
    };

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);

    let speech_tx = ui_tx.clone();
    let speech = platform_speech_engine(Box::new(move |utterance| {
        if speech_tx
            .try_send(UiEvent::UtteranceFinished(utterance))
            .is_err()
        {
            tracing::warn!(%utterance, "ui event queue unavailable; dropping utterance end");
        }
    }));

    runtime::launch(cmd_rx, ui_tx, settings);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size([760.0, 720.0])
            .with_min_inner_size([520.0, 480.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };
    eframe::run_native(
        WINDOW_TITLE,
        options,
        Box::new(|cc| {
            let persisted_settings = cc.storage.and_then(|storage| {
                storage
                    .get_string(SETTINGS_STORAGE_KEY)
                    .and_then(|text| serde_json::from_str::<PersistedDesktopSettings>(&text).ok())
            });
            Ok(Box::new(VocalPdfApp::new(
                cmd_tx,
                ui_rx,
                speech,
                startup,
                persisted_settings,
            )))
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_flag_overrides_loaded_settings() {
        let args = GuiArgs::parse_from(["vocal-pdf-gui", "--base-url", "http://127.0.0.1:5000"]);
        let settings = resolve_settings(&args, ClientSettings::default());
        assert_eq!(settings.base_url, "http://127.0.0.1:5000");
    }

    #[test]
    fn settings_are_kept_without_flag() {
        let args = GuiArgs::parse_from(["vocal-pdf-gui"]);
        let loaded = ClientSettings {
            base_url: "https://pdf.example.com".to_string(),
            request_timeout_secs: Some(30),
        };
        let settings = resolve_settings(&args, loaded);
        assert_eq!(settings.base_url, "https://pdf.example.com");
        assert_eq!(settings.request_timeout_secs, Some(30));
    }
}
