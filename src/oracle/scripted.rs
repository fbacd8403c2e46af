use std::sync::Mutex;

use super::{
    Identification, LivenessJudgment, OracleError, VerificationOracle, VerificationPrompt,
};
use crate::{model::student::Student, photo::PhotoDataUri};

/// Canned oracle answers plus a log of which endpoints were hit.
pub struct ScriptedOracle {
    pub prompt: String,
    pub is_live: bool,
    pub identified: Option<String>,
    pub failing: Option<&'static str>,
    calls: Mutex<Vec<&'static str>>,
}

impl ScriptedOracle {
    pub fn live(is_live: bool) -> Self {
        Self {
            prompt: "Blink twice.".into(),
            is_live,
            identified: None,
            failing: None,
            calls: Mutex::default(),
        }
    }

    pub fn identifying(mut self, student_id: Option<&str>) -> Self {
        self.identified = student_id.map(str::to_string);
        self
    }

    /// Make `endpoint` answer with a 500.
    pub fn failing(mut self, endpoint: &'static str) -> Self {
        self.failing = Some(endpoint);
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn hit(&self, endpoint: &'static str) -> Result<(), OracleError> {
        self.calls.lock().unwrap().push(endpoint);
        if self.failing == Some(endpoint) {
            return Err(OracleError::Status {
                endpoint,
                status: 500,
            });
        }
        Ok(())
    }
}

impl VerificationOracle for ScriptedOracle {
    async fn generate_verification_prompt(&self) -> Result<VerificationPrompt, OracleError> {
        self.hit("generateVerificationPrompt")?;
        Ok(VerificationPrompt {
            prompt: self.prompt.clone(),
        })
    }

    async fn detect_liveness(&self, _photo: &PhotoDataUri) -> Result<LivenessJudgment, OracleError> {
        self.hit("detectLiveness")?;
        Ok(LivenessJudgment {
            is_live: self.is_live,
            blink_detected: self.is_live,
            smile_detected: false,
        })
    }

    async fn identify_student(
        &self,
        _photo: &PhotoDataUri,
        _students: &[Student],
    ) -> Result<Identification, OracleError> {
        self.hit("identifyStudent")?;
        Ok(Identification {
            student_id: self.identified.clone(),
        })
    }
}
