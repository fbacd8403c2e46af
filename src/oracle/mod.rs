//! The external judgment service: prompt generation, liveness and face matching.
//!
//! Nothing here decides anything on its own. Callers treat every answer as
//! authoritative and every failure as terminal for the current step.

pub mod http;
#[cfg(test)]
pub mod scripted;

use serde::{Deserialize, Serialize};

use crate::{model::student::Student, photo::PhotoDataUri};

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("oracle request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("oracle endpoint `{endpoint}` answered {status}")]
    Status { endpoint: &'static str, status: u16 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationPrompt {
    pub prompt: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LivenessJudgment {
    pub is_live: bool,
    /// Informational only.
    pub blink_detected: bool,
    /// Informational only.
    pub smile_detected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identification {
    /// `None` when there is no confident match.
    pub student_id: Option<String>,
}

pub trait VerificationOracle {
    /// A short random instruction such as "Blink twice."
    async fn generate_verification_prompt(&self) -> Result<VerificationPrompt, OracleError>;

    async fn detect_liveness(&self, photo: &PhotoDataUri) -> Result<LivenessJudgment, OracleError>;

    async fn identify_student(
        &self,
        photo: &PhotoDataUri,
        students: &[Student],
    ) -> Result<Identification, OracleError>;
}

impl<T: VerificationOracle + ?Sized> VerificationOracle for &T {
    async fn generate_verification_prompt(&self) -> Result<VerificationPrompt, OracleError> {
        (**self).generate_verification_prompt().await
    }

    async fn detect_liveness(&self, photo: &PhotoDataUri) -> Result<LivenessJudgment, OracleError> {
        (**self).detect_liveness(photo).await
    }

    async fn identify_student(
        &self,
        photo: &PhotoDataUri,
        students: &[Student],
    ) -> Result<Identification, OracleError> {
        (**self).identify_student(photo, students).await
    }
}
