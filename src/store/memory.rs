use std::sync::Mutex;

use super::{Repository, StoreError};
use crate::model::{attendance::AttendanceRecord, student::Student};

/// In-process repository for exercising sessions without a database.
#[derive(Default)]
pub struct MemoryStore {
    students: Mutex<Vec<Student>>,
    records: Mutex<Vec<AttendanceRecord>>,
}

impl MemoryStore {
    pub fn with_students(students: Vec<Student>) -> Self {
        Self {
            students: Mutex::new(students),
            records: Mutex::default(),
        }
    }

    pub fn ledger(&self) -> Vec<AttendanceRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl Repository for MemoryStore {
    async fn students(&self) -> Result<Vec<Student>, StoreError> {
        Ok(self.students.lock().unwrap().clone())
    }

    async fn set_students(&self, students: &[Student]) -> Result<(), StoreError> {
        *self.students.lock().unwrap() = students.to_vec();
        Ok(())
    }

    async fn records(&self) -> Result<Vec<AttendanceRecord>, StoreError> {
        Ok(self.records.lock().unwrap().clone())
    }

    async fn set_records(&self, records: &[AttendanceRecord]) -> Result<(), StoreError> {
        *self.records.lock().unwrap() = records.to_vec();
        Ok(())
    }
}
