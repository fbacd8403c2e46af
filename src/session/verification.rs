use tracing::{debug, info, warn};

use super::{
    SessionError,
    state::{Notice, OperatorResponse, PendingVerification, SessionHandle},
};
use crate::{
    model::{
        attendance::{AttendanceRecord, NewAttendanceRecord, VerificationStatus},
        student::Student,
    },
    oracle::{LivenessJudgment, VerificationOracle},
    photo::CaptureError,
    store::Repository,
};

/// How a single liveness check ended.
#[derive(Debug)]
pub enum Resolution {
    /// The oracle judged the frame and the ledger entry was written.
    Recorded(AttendanceRecord),
    /// No usable frame; nothing was written.
    CaptureFailed(CaptureError),
    /// The operator closed the dialog without confirming.
    Dismissed,
    /// The session was stopped while this student was in flight.
    Abandoned,
}

/// Only `is_live` decides the outcome.
pub fn outcome_of(judgment: &LivenessJudgment) -> VerificationStatus {
    if judgment.is_live {
        VerificationStatus::Verified
    } else {
        VerificationStatus::Failed
    }
}

/// Shows `prompt` for `student`, waits for the operator's frame and resolves
/// it with exactly one liveness call. The student must already be `Pending`.
pub async fn verify_student<R, O>(
    session: &SessionHandle,
    repo: &R,
    oracle: &O,
    student: &Student,
    prompt: String,
) -> Result<Resolution, SessionError>
where
    R: Repository,
    O: VerificationOracle,
{
    info!(student_id = %student.id, %prompt, "Awaiting liveness confirmation");

    let pending = PendingVerification {
        student_id: student.id.clone(),
        student_name: student.name.clone(),
        prompt,
    };
    let frame = match session.await_operator(pending).await {
        Some(OperatorResponse::Confirmed(frame)) => frame,
        Some(OperatorResponse::Dismissed) => {
            info!(student_id = %student.id, "Verification dismissed by operator");
            return Ok(Resolution::Dismissed);
        }
        None => return Ok(Resolution::Abandoned),
    };

    let photo = match frame {
        Ok(photo) => photo,
        Err(e) => {
            warn!(student_id = %student.id, error = %e, "Frame capture failed");
            session.set_verification(&student.id, VerificationStatus::Failed);
            session.notify(Notice::error("Verification Error", e.to_string()));
            return Ok(Resolution::CaptureFailed(e));
        }
    };

    debug!(student_id = %student.id, %photo, "Checking liveness");
    let judgment = oracle.detect_liveness(&photo).await?;
    debug!(
        student_id = %student.id,
        is_live = judgment.is_live,
        blink = judgment.blink_detected,
        smile = judgment.smile_detected,
        "Liveness judged"
    );

    if session.stop_requested() {
        info!(student_id = %student.id, "Session stopped during liveness check, student abandoned");
        return Ok(Resolution::Abandoned);
    }

    let status = outcome_of(&judgment);
    let record = repo
        .append_record(NewAttendanceRecord::present(student, status))
        .await?;
    session.set_verification(&student.id, status);

    session.notify(match status {
        VerificationStatus::Verified => Notice::success(
            "Verification Successful",
            format!("{} has been verified.", student.name),
        ),
        _ => Notice::failure(
            "Verification Failed",
            format!("Liveness check failed for {}.", student.name),
        ),
    });

    Ok(Resolution::Recorded(record))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn liveness_alone_decides() {
        for blink in [true, false] {
            for smile in [true, false] {
                let live = LivenessJudgment {
                    is_live: true,
                    blink_detected: blink,
                    smile_detected: smile,
                };
                let spoof = LivenessJudgment {
                    is_live: false,
                    ..live
                };
                assert_eq!(outcome_of(&live), VerificationStatus::Verified);
                assert_eq!(outcome_of(&spoof), VerificationStatus::Failed);
            }
        }
    }
}
