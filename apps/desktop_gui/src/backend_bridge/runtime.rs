//! Backend worker: owns the tokio runtime and the extraction client, runs
//! queued session requests, and reports completions back to the UI.

use std::thread;

use client_core::{execute, ClientSettings, HttpExtractionClient};
use crossbeam_channel::{Receiver, Sender};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

pub fn launch(cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>, settings: ClientSettings) {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let client = match HttpExtractionClient::new(&settings) {
                Ok(client) => {
                    tracing::info!(base_url = %settings.base_url, "extraction client ready");
                    let _ = ui_tx.try_send(UiEvent::Info(format!(
                        "Ready - using {}",
                        settings.base_url
                    )));
                    Some(client)
                }
                Err(err) => {
                    tracing::error!("failed to configure extraction client: {err}");
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                        UiErrorContext::BackendStartup,
                        format!("backend worker startup failure: {err}"),
                    )));
                    None
                }
            };

            while let Ok(cmd) = cmd_rx.recv() {
                let BackendCommand::Run(request) = cmd;
                let ui_tx = ui_tx.clone();
                let Some(client) = client.clone() else {
                    let _ = ui_tx.send(UiEvent::Completed(
                        request.fail("extraction client is not configured"),
                    ));
                    continue;
                };

                // Requests run concurrently; the session drops superseded results.
                tokio::spawn(async move {
                    let name = request.name();
                    let ticket = request.ticket();
                    let completion = execute(&client, request).await;
                    tracing::debug!(request = name, %ticket, "request settled");
                    if ui_tx.send(UiEvent::Completed(completion)).is_err() {
                        tracing::warn!(request = name, "ui event queue closed; dropping completion");
                    }
                });
            }
            tracing::info!("ui command queue closed; backend worker exiting");
        });
    });
}
