use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicBool, Ordering},
};

use derive_more::Display;
use serde::Serialize;
use tokio::sync::{Notify, oneshot};
use tracing::warn;
use utoipa::ToSchema;

use super::SessionError;
use crate::{
    model::{
        attendance::{ScanStatus, VerificationStatus},
        student::Student,
    },
    photo::{CaptureError, PhotoDataUri},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, ToSchema)]
pub enum SessionMode {
    #[display(fmt = "roster scan")]
    RosterScan,
    #[display(fmt = "identification")]
    Identification,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentWithStatus {
    pub id: String,
    pub name: String,
    pub avatar: String,
    pub attendance_status: ScanStatus,
    pub verification_status: VerificationStatus,
}

impl From<&Student> for StudentWithStatus {
    fn from(student: &Student) -> Self {
        Self {
            id: student.id.clone(),
            name: student.name.clone(),
            avatar: student.avatar.clone(),
            attendance_status: ScanStatus::Unmarked,
            verification_status: VerificationStatus::NotRequired,
        }
    }
}

/// The liveness dialog currently shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({"studentId": "1001", "studentName": "Student #1001", "prompt": "Blink twice."}))]
pub struct PendingVerification {
    pub student_id: String,
    pub student_name: String,
    pub prompt: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Failure,
    Error,
}

/// Operator-facing message produced while a session runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn success(title: &str, description: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, title, description)
    }

    pub fn failure(title: &str, description: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Failure, title, description)
    }

    pub fn error(title: &str, description: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, title, description)
    }

    fn new(level: NoticeLevel, title: &str, description: impl Into<String>) -> Self {
        Self {
            level,
            title: title.to_string(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub mode: Option<SessionMode>,
    pub running: bool,
    /// Percentage of the roster completed, 0 to 100.
    #[schema(example = 50.0)]
    pub progress: f64,
    pub students: Vec<StudentWithStatus>,
    pub pending: Option<PendingVerification>,
    pub notices: Vec<Notice>,
}

/// What the operator did with the liveness dialog.
#[derive(Debug)]
pub enum OperatorResponse {
    Confirmed(Result<PhotoDataUri, CaptureError>),
    Dismissed,
}

#[derive(Default)]
struct SessionState {
    mode: Option<SessionMode>,
    running: bool,
    progress: f64,
    students: Vec<StudentWithStatus>,
    pending: Option<PendingVerification>,
    responder: Option<oneshot::Sender<OperatorResponse>>,
    notices: Vec<Notice>,
}

#[derive(Default)]
struct Shared {
    state: Mutex<SessionState>,
    stop: AtomicBool,
    prompt_ready: Notify,
}

/// Cheaply cloneable handle on the one attendance session of this process.
///
/// The lock is never held across an `.await`.
#[derive(Clone, Default)]
pub struct SessionHandle {
    shared: Arc<Shared>,
}

impl SessionHandle {
    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Claims the session for `mode` with a fresh per-student view of `roster`.
    pub fn begin(&self, mode: SessionMode, roster: &[Student]) -> Result<(), SessionError> {
        let mut state = self.state();
        if state.running {
            return Err(SessionError::Busy(state.mode.unwrap_or(mode)));
        }

        *state = SessionState {
            mode: Some(mode),
            running: true,
            students: roster.iter().map(StudentWithStatus::from).collect(),
            ..SessionState::default()
        };
        self.shared.stop.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Releases the session. Student statuses and notices stay visible until reset.
    pub fn finish(&self) {
        let mut state = self.state();
        state.running = false;
        state.pending = None;
        state.responder = None;
    }

    /// Clears a finished session back to an unmarked view of `roster`.
    pub fn reset(&self, roster: &[Student]) -> Result<(), SessionError> {
        let mut state = self.state();
        if state.running {
            return Err(SessionError::Busy(
                state.mode.unwrap_or(SessionMode::RosterScan),
            ));
        }

        *state = SessionState {
            students: roster.iter().map(StudentWithStatus::from).collect(),
            ..SessionState::default()
        };
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.state().running
    }

    /// Asks the running session to stop before its next step. A pending
    /// verification is abandoned right away.
    pub fn stop(&self) -> Result<(), SessionError> {
        self.shared.stop.store(true, Ordering::SeqCst);

        let mut state = self.state();
        if !state.running {
            return Err(SessionError::NotRunning);
        }
        state.pending = None;
        // dropping the sender wakes the suspended sub-flow
        state.responder = None;
        Ok(())
    }

    pub fn stop_requested(&self) -> bool {
        self.shared.stop.load(Ordering::SeqCst)
    }

    pub fn set_attendance(&self, student_id: &str, status: ScanStatus) {
        if let Some(student) = self.state().students.iter_mut().find(|s| s.id == student_id) {
            student.attendance_status = status;
        }
    }

    /// Applies a verification transition. Illegal steps are ignored and
    /// reported with `false`.
    pub fn set_verification(&self, student_id: &str, status: VerificationStatus) -> bool {
        let mut state = self.state();
        let Some(student) = state.students.iter_mut().find(|s| s.id == student_id) else {
            return false;
        };

        match student.verification_status.advance(status) {
            Some(next) => {
                student.verification_status = next;
                true
            }
            None => {
                warn!(
                    student_id,
                    from = %student.verification_status,
                    to = %status,
                    "Ignoring illegal verification transition"
                );
                false
            }
        }
    }

    pub fn set_progress(&self, completed: usize, total: usize) {
        if total > 0 {
            self.state().progress = completed as f64 / total as f64 * 100.0;
        }
    }

    pub fn notify(&self, notice: Notice) {
        self.state().notices.push(notice);
    }

    pub fn pending(&self) -> Option<PendingVerification> {
        self.state().pending.clone()
    }

    /// Publishes `pending` and suspends until the operator responds.
    ///
    /// `None` means the dialog was torn down without an answer (the session
    /// was stopped). The dialog is cleared on every exit path.
    pub async fn await_operator(&self, pending: PendingVerification) -> Option<OperatorResponse> {
        let (tx, rx) = oneshot::channel();
        {
            let mut state = self.state();
            if self.stop_requested() {
                return None;
            }
            state.pending = Some(pending);
            state.responder = Some(tx);
        }
        self.shared.prompt_ready.notify_waiters();

        let _dialog = DialogGuard { session: self };
        rx.await.ok()
    }

    /// Hands the operator's answer to the suspended sub-flow.
    pub fn respond(&self, response: OperatorResponse) -> Result<(), SessionError> {
        let responder = {
            let mut state = self.state();
            state.pending = None;
            state.responder.take()
        };

        responder
            .ok_or(SessionError::NoPendingVerification)?
            .send(response)
            .map_err(|_| SessionError::NoPendingVerification)
    }

    pub fn confirm(&self, frame: Result<PhotoDataUri, CaptureError>) -> Result<(), SessionError> {
        self.respond(OperatorResponse::Confirmed(frame))
    }

    pub fn dismiss(&self) -> Result<(), SessionError> {
        self.respond(OperatorResponse::Dismissed)
    }

    /// Resolves once a verification prompt is waiting for the operator.
    pub async fn wait_for_prompt(&self) -> PendingVerification {
        loop {
            let notified = self.shared.prompt_ready.notified();
            if let Some(pending) = self.pending() {
                return pending;
            }
            notified.await;
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state();
        SessionSnapshot {
            mode: state.mode,
            running: state.running,
            progress: state.progress,
            students: state.students.clone(),
            pending: state.pending.clone(),
            notices: state.notices.clone(),
        }
    }
}

struct DialogGuard<'a> {
    session: &'a SessionHandle,
}

impl Drop for DialogGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.session.state();
        state.pending = None;
        state.responder = None;
    }
}
