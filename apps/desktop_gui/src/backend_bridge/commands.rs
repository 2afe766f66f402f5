//! Backend commands queued from UI to backend worker.

use client_core::SessionRequest;

pub enum BackendCommand {
    Run(SessionRequest),
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::Run(request) => request.name(),
        }
    }
}
