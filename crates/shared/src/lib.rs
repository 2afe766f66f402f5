//! Types shared between the extraction client, the session controller, and the apps.

pub mod domain;
pub mod error;
pub mod protocol;
