//! Attendance sessions: the roster walk, the identification shortcut and the
//! liveness sub-flow they share.
//!
//! Exactly one session runs at a time. It lives on the actix worker that
//! started it and only ever suspends on timers, oracle calls, or the
//! operator's confirmation.

pub mod controller;
pub mod gate;
pub mod identify;
pub mod state;
pub mod verification;

use crate::{oracle::OracleError, photo::CaptureError, store::StoreError};
use state::SessionMode;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("an attendance session is already running ({0})")]
    Busy(SessionMode),

    #[error("no attendance session is running")]
    NotRunning,

    #[error("no verification is waiting for confirmation")]
    NoPendingVerification,

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("verification service failed: {0}")]
    Oracle(#[from] OracleError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("matched student {0} is not enrolled on this roster")]
    UnknownStudent(String),
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::{model::student::Student, photo::PhotoDataUri};

    pub fn roster(entries: &[(&str, &str)]) -> Vec<Student> {
        entries
            .iter()
            .map(|(id, name)| Student {
                id: id.to_string(),
                name: name.to_string(),
                avatar: format!("https://picsum.photos/seed/{id}/400/400"),
            })
            .collect()
    }

    pub fn photo() -> PhotoDataUri {
        PhotoDataUri::parse("data:image/jpeg;base64,/9j/4AAQSkZJRg==").unwrap()
    }
}
