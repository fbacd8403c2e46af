use tracing::{error, info, warn};

use super::{
    SessionError,
    state::{Notice, SessionHandle, SessionMode},
    verification::{Resolution, verify_student},
};
use crate::{
    model::{
        attendance::{ScanStatus, VerificationStatus},
        student::Student,
    },
    oracle::VerificationOracle,
    photo::{CaptureError, PhotoDataUri},
    store::Repository,
};

/// Single-shot attendance: match one frame against the whole roster, then
/// gate the match through the liveness sub-flow.
pub struct Identify<R, O> {
    repo: R,
    oracle: O,
    session: SessionHandle,
}

pub enum IdentifyOutcome<R, O> {
    Matched(MatchedStudent<R, O>),
    /// No confident match. Nothing was written.
    NoMatch,
}

impl<R, O> Identify<R, O>
where
    R: Repository,
    O: VerificationOracle,
{
    pub fn new(repo: R, oracle: O, session: SessionHandle) -> Self {
        Self {
            repo,
            oracle,
            session,
        }
    }

    /// Claims the session and asks the oracle who is in `frame`.
    ///
    /// A capture failure is returned before anything is touched. Every other
    /// exit except a match releases the session again.
    pub async fn identify(
        self,
        frame: Result<PhotoDataUri, CaptureError>,
    ) -> Result<IdentifyOutcome<R, O>, SessionError> {
        let photo = frame?;
        let roster = self.repo.students().await?;
        self.session.begin(SessionMode::Identification, &roster)?;

        match self.lookup(&photo, &roster).await {
            Ok(Some(student)) => {
                info!(student_id = %student.id, "Student identified");
                self.session.set_attendance(&student.id, ScanStatus::Present);
                self.session
                    .set_verification(&student.id, VerificationStatus::Pending);
                Ok(IdentifyOutcome::Matched(MatchedStudent {
                    flow: self,
                    student,
                }))
            }
            Ok(None) => {
                info!("No confident match for captured frame");
                self.session.notify(Notice::failure(
                    "Identification Failed",
                    "No enrolled student matched the captured face.",
                ));
                self.session.finish();
                Ok(IdentifyOutcome::NoMatch)
            }
            Err(e) => {
                error!(error = %e, "Identification failed");
                self.session
                    .notify(Notice::error("Identification Failed", e.to_string()));
                self.session.finish();
                Err(e)
            }
        }
    }

    async fn lookup(
        &self,
        photo: &PhotoDataUri,
        roster: &[Student],
    ) -> Result<Option<Student>, SessionError> {
        if roster.is_empty() {
            return Ok(None);
        }

        let Some(student_id) = self.oracle.identify_student(photo, roster).await?.student_id
        else {
            return Ok(None);
        };

        roster
            .iter()
            .find(|s| s.id == student_id)
            .cloned()
            .map(Some)
            .ok_or_else(|| {
                warn!(%student_id, "Oracle matched a student missing from the roster");
                SessionError::UnknownStudent(student_id)
            })
    }
}

/// An identified student whose liveness check has not run yet.
pub struct MatchedStudent<R, O> {
    flow: Identify<R, O>,
    student: Student,
}

impl<R, O> MatchedStudent<R, O>
where
    R: Repository,
    O: VerificationOracle,
{
    pub fn student(&self) -> &Student {
        &self.student
    }

    /// Runs the liveness sub-flow for the match and releases the session.
    pub async fn verify(self) -> Result<Resolution, SessionError> {
        let Identify {
            repo,
            oracle,
            session,
        } = &self.flow;

        let result = async {
            let prompt = oracle.generate_verification_prompt().await?.prompt;
            verify_student(session, repo, oracle, &self.student, prompt).await
        }
        .await;

        if let Err(e) = &result {
            error!(student_id = %self.student.id, error = %e, "Identification verification aborted");
            session.notify(Notice::error(
                "Processing Error",
                format!("{e}. Capture a new frame to try again."),
            ));
        }
        session.finish();
        result
    }
}
