use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;

use super::student::Student;

/// Ledger-level attendance outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
pub enum AttendanceStatus {
    Present,
    Absent,
}

/// Per-student progress inside a running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
pub enum ScanStatus {
    Unmarked,
    Scanning,
    Present,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, ToSchema)]
pub enum VerificationStatus {
    Verified,
    Pending,
    Failed,
    #[serde(rename = "Not Required")]
    #[strum(serialize = "Not Required")]
    NotRequired,
}

impl VerificationStatus {
    /// Returns the next state if `next` is a legal step from `self`.
    ///
    /// Verification only ever moves `Not Required -> Pending -> {Verified | Failed}`,
    /// so a terminal outcome can never be reached without passing through `Pending`.
    pub fn advance(self, next: VerificationStatus) -> Option<VerificationStatus> {
        use VerificationStatus::*;
        if self.is_terminal() {
            return None;
        }
        match (self, next) {
            (NotRequired, Pending) => Some(Pending),
            (Pending, Verified) | (Pending, Failed) => Some(next),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, VerificationStatus::Verified | VerificationStatus::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(
    example = json!({
        "id": "rec-5f0c2a4e-7d1b-4c55-9f43-1f6f2c1f9a10",
        "studentId": "1001",
        "studentName": "Student #1001",
        "date": "2024-07-20",
        "status": "Present",
        "verification": "Verified"
    })
)]
pub struct AttendanceRecord {
    pub id: String,
    pub student_id: String,
    pub student_name: String,
    #[schema(example = "2024-07-20", value_type = String, format = "date")]
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub verification: VerificationStatus,
}

/// A record before the ledger assigns it an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttendanceRecord {
    pub student_id: String,
    pub student_name: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub verification: VerificationStatus,
}

impl NewAttendanceRecord {
    /// A `Present` entry for today (UTC).
    pub fn present(student: &Student, verification: VerificationStatus) -> Self {
        Self {
            student_id: student.id.clone(),
            student_name: student.name.clone(),
            date: Utc::now().date_naive(),
            status: AttendanceStatus::Present,
            verification,
        }
    }

    pub fn into_record(self) -> AttendanceRecord {
        AttendanceRecord {
            id: format!("rec-{}", Uuid::new_v4()),
            student_id: self.student_id,
            student_name: self.student_name,
            date: self.date,
            status: self.status,
            verification: self.verification,
        }
    }
}
