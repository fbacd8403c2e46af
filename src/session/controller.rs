use std::time::Duration;

use serde::Serialize;
use tokio::time::sleep;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use super::{
    SessionError,
    gate::VerificationGate,
    state::{Notice, SessionHandle, SessionMode},
    verification::{Resolution, verify_student},
};
use crate::{
    model::{
        attendance::{NewAttendanceRecord, ScanStatus, VerificationStatus},
        student::Student,
    },
    oracle::VerificationOracle,
    store::Repository,
};

#[derive(Debug, Clone, Copy)]
pub struct SessionTiming {
    /// Simulated scan time per student.
    pub scan: Duration,
    /// Pause after each student.
    pub between_students: Duration,
}

#[cfg(test)]
impl SessionTiming {
    pub const fn immediate() -> Self {
        Self {
            scan: Duration::ZERO,
            between_students: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum RunOutcome {
    Completed,
    Stopped,
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RunSummary {
    pub total: usize,
    pub recorded: usize,
    pub outcome: RunOutcome,
}

/// One sequential pass over the roster.
pub struct RosterScan<R, O, G> {
    repo: R,
    oracle: O,
    gate: G,
    timing: SessionTiming,
    session: SessionHandle,
}

impl<R, O, G> RosterScan<R, O, G>
where
    R: Repository,
    O: VerificationOracle,
    G: VerificationGate,
{
    pub fn new(repo: R, oracle: O, gate: G, timing: SessionTiming, session: SessionHandle) -> Self {
        Self {
            repo,
            oracle,
            gate,
            timing,
            session,
        }
    }

    /// Snapshots the roster and claims the session.
    ///
    /// An empty roster is a no-op: `Ok(None)`, and the session stays free.
    pub async fn begin(self) -> Result<Option<ScanRun<R, O, G>>, SessionError> {
        let roster = self.repo.students().await?;
        if roster.is_empty() {
            info!("Roster is empty, nothing to scan");
            return Ok(None);
        }

        self.session.begin(SessionMode::RosterScan, &roster)?;
        info!(students = roster.len(), "Attendance scan started");
        Ok(Some(ScanRun { scan: self, roster }))
    }

    pub async fn run(self) -> Result<RunSummary, SessionError> {
        Ok(match self.begin().await? {
            Some(run) => run.run().await,
            None => RunSummary {
                total: 0,
                recorded: 0,
                outcome: RunOutcome::Completed,
            },
        })
    }
}

/// A claimed scan over a fixed roster snapshot.
pub struct ScanRun<R, O, G> {
    scan: RosterScan<R, O, G>,
    roster: Vec<Student>,
}

impl<R, O, G> ScanRun<R, O, G>
where
    R: Repository,
    O: VerificationOracle,
    G: VerificationGate,
{
    pub fn total(&self) -> usize {
        self.roster.len()
    }

    /// Walks the roster to the end, a stop request, or the first hard failure,
    /// then releases the session.
    pub async fn run(mut self) -> RunSummary {
        let total = self.roster.len();
        let mut recorded = 0;

        let outcome = match self.walk(&mut recorded).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, recorded, total, "Attendance scan aborted");
                self.scan.session.notify(Notice::error(
                    "Processing Error",
                    format!("{e}. Restart the session to try again."),
                ));
                RunOutcome::Aborted
            }
        };

        match outcome {
            RunOutcome::Completed => {
                self.scan.session.notify(Notice::success(
                    "Attendance Complete",
                    "All students have been processed.",
                ));
            }
            RunOutcome::Stopped => {
                self.scan.session.notify(Notice::failure(
                    "Attendance Stopped",
                    format!("{recorded} of {total} students were recorded."),
                ));
            }
            RunOutcome::Aborted => {}
        }

        self.scan.session.finish();
        info!(?outcome, recorded, total, "Attendance scan finished");

        RunSummary {
            total,
            recorded,
            outcome,
        }
    }

    async fn walk(&mut self, recorded: &mut usize) -> Result<RunOutcome, SessionError> {
        let Self { scan, roster } = self;
        let session = &scan.session;
        let total = roster.len();

        for (index, student) in roster.iter().enumerate() {
            if session.stop_requested() {
                return Ok(RunOutcome::Stopped);
            }

            session.set_attendance(&student.id, ScanStatus::Scanning);
            sleep(scan.timing.scan).await;
            if session.stop_requested() {
                info!(student_id = %student.id, "Stopped mid-scan, student abandoned");
                return Ok(RunOutcome::Stopped);
            }
            session.set_attendance(&student.id, ScanStatus::Present);

            if scan.gate.requires_verification() {
                session.set_verification(&student.id, VerificationStatus::Pending);
                let prompt = scan.oracle.generate_verification_prompt().await?.prompt;
                if session.stop_requested() {
                    return Ok(RunOutcome::Stopped);
                }

                match verify_student(session, &scan.repo, &scan.oracle, student, prompt).await? {
                    Resolution::Recorded(_) => *recorded += 1,
                    Resolution::Dismissed => {}
                    Resolution::CaptureFailed(e) => {
                        warn!(student_id = %student.id, error = %e, "No record written for student");
                    }
                    Resolution::Abandoned => return Ok(RunOutcome::Stopped),
                }
            } else {
                scan.repo
                    .append_record(NewAttendanceRecord::present(
                        student,
                        VerificationStatus::NotRequired,
                    ))
                    .await?;
                *recorded += 1;
            }

            session.set_progress(index + 1, total);
            sleep(scan.timing.between_students).await;
        }

        Ok(RunOutcome::Completed)
    }
}
