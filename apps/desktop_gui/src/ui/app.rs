use std::path::{Path, PathBuf};

use client_core::{DocumentSession, SessionRequest, SpeechEngine};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use serde::{Deserialize, Serialize};
use shared::domain::{page_count_label, PageToken};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{err_label, UiEvent};
use crate::controller::orchestration::dispatch_session_request;

pub const SETTINGS_STORAGE_KEY: &str = "vocal_pdf_desktop_settings";
const APP_TITLE: &str = "PDF to Speech Converter";

#[derive(Debug, Clone)]
pub struct StartupConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedDesktopSettings {
    pub last_directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusBannerSeverity {
    Error,
}

#[derive(Debug, Clone)]
struct StatusBanner {
    severity: StatusBannerSeverity,
    message: String,
}

pub struct VocalPdfApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    session: DocumentSession<Box<dyn SpeechEngine>>,
    startup: StartupConfig,
    settings: PersistedDesktopSettings,
    status: String,
    status_banner: Option<StatusBanner>,
}

impl VocalPdfApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        speech: Box<dyn SpeechEngine>,
        startup: StartupConfig,
        persisted_settings: Option<PersistedDesktopSettings>,
    ) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            session: DocumentSession::new(speech),
            startup,
            settings: persisted_settings.unwrap_or_default(),
            status: "Starting".to_string(),
            status_banner: None,
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::Error(err) => {
                    self.status = format!("{} error: {}", err_label(err.category()), err.message());
                    if err.is_persistent() {
                        self.status_banner = Some(StatusBanner {
                            severity: StatusBannerSeverity::Error,
                            message: self.status.clone(),
                        });
                    }
                }
                UiEvent::Completed(completion) => {
                    self.session.complete(completion);
                }
                UiEvent::UtteranceFinished(utterance) => {
                    self.session.utterance_finished(utterance);
                }
            }
        }
    }

    fn dispatch(&mut self, request: Option<SessionRequest>) {
        let Some(request) = request else {
            return;
        };
        if let Err((request, reason)) =
            dispatch_session_request(&self.cmd_tx, request, &mut self.status)
        {
            self.session.complete(request.fail(reason));
        }
    }

    fn open_file(&mut self, path: Option<PathBuf>) {
        if let Some(dir) = path.as_deref().and_then(Path::parent) {
            self.settings.last_directory = Some(dir.to_path_buf());
        }
        let request = self.session.begin_file_selection(path.as_deref());
        self.dispatch(request);
    }

    fn pick_file(&mut self) {
        let mut dialog = rfd::FileDialog::new().add_filter("PDF", &["pdf"]);
        if let Some(dir) = &self.settings.last_directory {
            dialog = dialog.set_directory(dir);
        }
        let picked = dialog.pick_file();
        self.open_file(picked);
    }

    fn accept_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .find_map(|file| file.path.clone())
        });
        if dropped.is_some() {
            self.open_file(dropped);
        }
    }

    fn select_page(&mut self, token: PageToken) {
        match self.session.select_page(token) {
            Ok(request) => self.dispatch(request),
            Err(err) => {
                tracing::warn!("ignoring page selection: {err}");
            }
        }
    }

    fn show_status_banner(&mut self, ui: &mut egui::Ui) {
        let Some(banner) = self.status_banner.clone() else {
            return;
        };
        let color = match banner.severity {
            StatusBannerSeverity::Error => egui::Color32::from_rgb(220, 38, 38),
        };
        ui.horizontal(|ui| {
            ui.colored_label(color, &banner.message);
            if ui.small_button("Dismiss").clicked() {
                self.status_banner = None;
            }
        });
        ui.separator();
    }

    fn show_upload_section(&mut self, ui: &mut egui::Ui) {
        ui.heading("Upload Document");
        ui.add_space(8.0);

        let hovering = ui.ctx().input(|i| !i.raw.hovered_files.is_empty());
        let drop_frame = egui::Frame::group(ui.style()).inner_margin(egui::Margin::same(16));
        drop_frame.show(ui, |ui| {
            ui.set_min_width(ui.available_width());
            ui.vertical_centered(|ui| {
                if ui.button("Choose PDF...").clicked() {
                    self.pick_file();
                }
                let hint = if hovering {
                    "Release to open the file"
                } else {
                    "or drag and drop a PDF here"
                };
                ui.weak(hint);
            });
        });

        if let Some(name) = self.session.file_name().map(str::to_string) {
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                ui.label(format!("📄 {name}"));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Remove").clicked() {
                        self.session.remove_file();
                    }
                });
            });
        }

        if self.session.is_uploading() {
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Processing your document...");
            });
        }

        ui.add_space(12.0);
        let analyze_enabled = self.session.can_analyze();
        ui.horizontal(|ui| {
            let analyze = ui.add_enabled(
                analyze_enabled,
                egui::Button::new("Analyze Document").min_size(egui::vec2(180.0, 32.0)),
            );
            if analyze.clicked() {
                let request = self.session.analyze();
                self.dispatch(request);
            }
            if self.session.is_analyzing() {
                ui.spinner();
            }
        });
    }

    fn show_document_controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Document Controls");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(page_count_label(self.session.page_count()));
            });
        });
        ui.weak("Select pages to preview and listen");
        ui.add_space(8.0);

        let options = self.session.page_options();
        let current = self.session.selected_page();
        let mut selected = current;
        ui.horizontal(|ui| {
            ui.label("Select Pages");
            egui::ComboBox::from_id_salt("page_selector")
                .selected_text(current.label())
                .show_ui(ui, |ui| {
                    for option in options {
                        ui.selectable_value(&mut selected, option, option.label());
                    }
                });
            if self.session.is_page_loading() {
                ui.spinner();
            }
        });
        if selected != current {
            self.select_page(selected);
        }

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            ui.label("Speech Controls");
            if ui
                .add_enabled(self.session.can_play(), egui::Button::new("▶ Play"))
                .clicked()
            {
                self.session.start_speech();
            }
            if ui.button("⏹ Stop").clicked() {
                self.session.stop_speech();
            }
            if self.session.is_playing() {
                ui.weak("Speaking...");
            }
        });

        if !self.session.preview_text().is_empty() {
            ui.add_space(12.0);
            ui.heading("Content Preview");
            egui::Frame::group(ui.style()).show(ui, |ui| {
                egui::ScrollArea::vertical()
                    .max_height(320.0)
                    .auto_shrink([false, true])
                    .show(ui, |ui| {
                        ui.label(self.session.preview_text());
                    });
            });
        }
    }

    fn show_alert(&mut self, ctx: &egui::Context) {
        let Some(message) = self.session.alert().map(str::to_string) else {
            return;
        };
        let mut dismissed = false;
        let modal = egui::Modal::new(egui::Id::new("session_alert")).show(ctx, |ui| {
            ui.set_width(320.0);
            ui.heading("Notice");
            ui.add_space(8.0);
            ui.label(&message);
            ui.add_space(12.0);
            if ui.button("OK").clicked() {
                dismissed = true;
            }
        });
        if dismissed || modal.should_close() {
            self.session.dismiss_alert();
        }
    }

    fn show_main(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.weak(&self.status);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.weak(&self.startup.base_url);
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                self.show_status_banner(ui);
                ui.vertical_centered(|ui| {
                    ui.heading(APP_TITLE);
                    ui.weak(
                        "Transform your PDF documents into spoken words. Upload, select pages, and listen to your content.",
                    );
                });
                ui.add_space(16.0);
                self.show_upload_section(ui);

                if self.session.page_count() > 0 {
                    ui.add_space(16.0);
                    ui.separator();
                    self.show_document_controls(ui);
                }

                ui.add_space(16.0);
                ui.separator();
                ui.vertical_centered(|ui| {
                    ui.weak(format!("{APP_TITLE} v{}", env!("CARGO_PKG_VERSION")));
                });
            });
        });
    }

    fn has_pending_work(&self) -> bool {
        self.session.is_uploading()
            || self.session.is_analyzing()
            || self.session.is_page_loading()
            || self.session.is_playing()
    }
}

impl eframe::App for VocalPdfApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        self.accept_dropped_files(ctx);

        self.show_main(ctx);
        self.show_alert(ctx);

        if self.has_pending_work() {
            ctx.request_repaint_after(std::time::Duration::from_millis(50));
        } else {
            ctx.request_repaint_after(std::time::Duration::from_millis(250));
        }
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        if let Ok(serialized) = serde_json::to_string(&self.settings) {
            storage.set_string(SETTINGS_STORAGE_KEY, serialized);
        }
    }
}

impl Drop for VocalPdfApp {
    fn drop(&mut self) {
        self.session.stop_speech();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::events::{UiError, UiErrorContext};
    use client_core::{SessionCompletion, UnavailableSpeechEngine};
    use crossbeam_channel::bounded;
    use shared::domain::RequestTicket;

    fn app() -> (VocalPdfApp, Receiver<BackendCommand>, Sender<UiEvent>) {
        let (cmd_tx, cmd_rx) = bounded(8);
        let (ui_tx, ui_rx) = bounded(8);
        let app = VocalPdfApp::new(
            cmd_tx,
            ui_rx,
            Box::new(UnavailableSpeechEngine::new("tests")),
            StartupConfig {
                base_url: "http://127.0.0.1:5000".to_string(),
            },
            None,
        );
        (app, cmd_rx, ui_tx)
    }

    #[test]
    fn opening_a_pdf_queues_a_read_and_remembers_its_directory() {
        let (mut app, cmd_rx, _ui_tx) = app();

        app.open_file(Some(PathBuf::from("/docs/report.pdf")));

        assert!(app.session.is_uploading());
        assert_eq!(app.settings.last_directory, Some(PathBuf::from("/docs")));
        let BackendCommand::Run(request) = cmd_rx.try_recv().expect("queued");
        assert!(matches!(request, SessionRequest::ReadDocument { .. }));
    }

    #[test]
    fn completions_from_the_worker_reach_the_session() {
        let (mut app, cmd_rx, ui_tx) = app();
        app.open_file(Some(PathBuf::from("/docs/report.pdf")));
        let BackendCommand::Run(request) = cmd_rx.try_recv().expect("queued");

        ui_tx
            .send(UiEvent::Completed(SessionCompletion::DocumentRead {
                ticket: request.ticket(),
                result: Ok(client_core::SelectedDocument::new(
                    "report.pdf",
                    b"%PDF".to_vec(),
                )),
            }))
            .expect("send");
        app.process_ui_events();

        assert!(!app.session.is_uploading());
        assert_eq!(app.session.file_name(), Some("report.pdf"));
    }

    #[test]
    fn stale_completion_is_ignored() {
        let (mut app, _cmd_rx, ui_tx) = app();
        ui_tx
            .send(UiEvent::Completed(SessionCompletion::PageCount {
                ticket: RequestTicket(42),
                result: Ok(3),
            }))
            .expect("send");
        app.process_ui_events();
        assert_eq!(app.session.page_count(), 0);
    }

    #[test]
    fn disconnected_worker_settles_request_with_alert() {
        let (mut app, cmd_rx, _ui_tx) = app();
        drop(cmd_rx);

        app.open_file(Some(PathBuf::from("/docs/report.pdf")));

        assert!(!app.session.is_uploading());
        assert!(app.session.alert().is_some());
        assert!(app.status.contains("disconnected"));
    }

    #[test]
    fn startup_errors_raise_a_banner() {
        let (mut app, _cmd_rx, ui_tx) = app();
        ui_tx
            .send(UiEvent::Error(UiError::from_message(
                UiErrorContext::BackendStartup,
                "backend worker startup failure: invalid extraction service url",
            )))
            .expect("send");
        app.process_ui_events();

        let banner = app.status_banner.as_ref().expect("banner");
        assert_eq!(banner.severity, StatusBannerSeverity::Error);
        assert!(banner.message.starts_with("Configuration error"));
    }

    #[test]
    fn persisted_settings_tolerate_missing_fields() {
        let parsed: PersistedDesktopSettings = serde_json::from_str("{}").expect("decode");
        assert_eq!(parsed, PersistedDesktopSettings::default());
    }
}
