//! Command orchestration helpers from UI actions to backend command queue.

use client_core::SessionRequest;
use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;

/// Queues `request` for the worker. A request that cannot be queued is handed
/// back so the caller can settle it as failed.
pub fn dispatch_session_request(
    cmd_tx: &Sender<BackendCommand>,
    request: SessionRequest,
    status: &mut String,
) -> Result<(), (SessionRequest, &'static str)> {
    let cmd = BackendCommand::Run(request);
    let cmd_name = cmd.name();
    tracing::debug!(command = cmd_name, "queueing ui->backend command");

    match cmd_tx.try_send(cmd) {
        Ok(()) => {
            tracing::debug!(command = cmd_name, "queued ui->backend command");
            Ok(())
        }
        Err(TrySendError::Full(BackendCommand::Run(request))) => {
            *status = "UI command queue is full; please retry".to_string();
            tracing::warn!(command = cmd_name, "ui->backend command queue is full");
            Err((request, "command queue full"))
        }
        Err(TrySendError::Disconnected(BackendCommand::Run(request))) => {
            *status =
                "Backend command processor disconnected (possible startup/runtime failure); restart the app"
                    .to_string();
            tracing::error!(command = cmd_name, "ui->backend command queue disconnected");
            Err((request, "command queue disconnected"))
        }
    }
}
