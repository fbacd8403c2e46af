//! Roster and ledger persistence.
//!
//! Both collections are stored as whole JSON arrays under fixed keys and are
//! rewritten on every mutation (read-modify-write, no transactions).

pub mod kv;
#[cfg(test)]
pub mod memory;
pub mod seed;

use crate::model::{
    attendance::{AttendanceRecord, NewAttendanceRecord},
    student::Student,
};

pub const ROSTER_KEY: &str = "guardian-students";
pub const LEDGER_KEY: &str = "guardian-attendance";
pub const OPERATORS_KEY: &str = "guardian-operators";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("storage backend failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("collection `{key}` holds invalid JSON: {source}")]
    Corrupt {
        key: &'static str,
        source: serde_json::Error,
    },

    #[error("failed to encode collection `{key}`: {source}")]
    Encode {
        key: &'static str,
        source: serde_json::Error,
    },

    #[error("A student with this ID already exists.")]
    DuplicateStudent(String),

    #[error("This email is already in use.")]
    DuplicateOperator(String),
}

/// Get/set access to the roster and the ledger.
pub trait Repository {
    async fn students(&self) -> Result<Vec<Student>, StoreError>;
    async fn set_students(&self, students: &[Student]) -> Result<(), StoreError>;
    async fn records(&self) -> Result<Vec<AttendanceRecord>, StoreError>;
    async fn set_records(&self, records: &[AttendanceRecord]) -> Result<(), StoreError>;

    /// Enrolls `student`, rejecting an id that is already on the roster.
    async fn add_student(&self, student: Student) -> Result<(), StoreError> {
        let mut students = self.students().await?;
        enroll(&mut students, student)?;
        self.set_students(&students).await
    }

    /// Appends to the ledger and returns the stored record with its id.
    async fn append_record(
        &self,
        record: NewAttendanceRecord,
    ) -> Result<AttendanceRecord, StoreError> {
        let mut records = self.records().await?;
        let record = record.into_record();
        records.push(record.clone());
        self.set_records(&records).await?;
        Ok(record)
    }
}

impl<T: Repository + ?Sized> Repository for &T {
    async fn students(&self) -> Result<Vec<Student>, StoreError> {
        (**self).students().await
    }

    async fn set_students(&self, students: &[Student]) -> Result<(), StoreError> {
        (**self).set_students(students).await
    }

    async fn records(&self) -> Result<Vec<AttendanceRecord>, StoreError> {
        (**self).records().await
    }

    async fn set_records(&self, records: &[AttendanceRecord]) -> Result<(), StoreError> {
        (**self).set_records(records).await
    }

    async fn add_student(&self, student: Student) -> Result<(), StoreError> {
        (**self).add_student(student).await
    }

    async fn append_record(
        &self,
        record: NewAttendanceRecord,
    ) -> Result<AttendanceRecord, StoreError> {
        (**self).append_record(record).await
    }
}

/// Pushes `student` onto `roster` unless its id is already taken.
pub(crate) fn enroll(roster: &mut Vec<Student>, student: Student) -> Result<(), StoreError> {
    if roster.iter().any(|s| s.id == student.id) {
        return Err(StoreError::DuplicateStudent(student.id));
    }
    roster.push(student);
    Ok(())
}
