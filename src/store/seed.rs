use chrono::NaiveDate;
use tracing::info;

use super::{LEDGER_KEY, ROSTER_KEY, StoreError, kv::SqliteStore};
use crate::model::{
    attendance::{AttendanceRecord, AttendanceStatus, VerificationStatus},
    student::Student,
};

const DEMO_ROSTER_SIZE: u32 = 12;
const FIRST_DEMO_ID: u32 = 1001;

pub fn demo_students() -> Vec<Student> {
    (FIRST_DEMO_ID..FIRST_DEMO_ID + DEMO_ROSTER_SIZE)
        .map(|n| Student {
            id: n.to_string(),
            name: format!("Student #{n}"),
            avatar: format!("https://picsum.photos/seed/{n}/400/400"),
        })
        .collect()
}

pub fn demo_records() -> Vec<AttendanceRecord> {
    let date = NaiveDate::from_ymd_opt(2024, 7, 20).unwrap_or(NaiveDate::MIN);
    let entry = |n: u32, status, verification| AttendanceRecord {
        id: format!("rec{}", n - FIRST_DEMO_ID + 1),
        student_id: n.to_string(),
        student_name: format!("Student #{n}"),
        date,
        status,
        verification,
    };

    vec![
        entry(1001, AttendanceStatus::Present, VerificationStatus::Verified),
        entry(1002, AttendanceStatus::Present, VerificationStatus::NotRequired),
        entry(1003, AttendanceStatus::Absent, VerificationStatus::NotRequired),
        entry(1004, AttendanceStatus::Present, VerificationStatus::Failed),
    ]
}

/// Writes the demo roster and ledger into collections that have never been written.
/// Collections that exist (even empty) are left alone.
pub async fn seed_demo_data(store: &SqliteStore) -> Result<(), StoreError> {
    if !store.has_collection(ROSTER_KEY).await? {
        let students = demo_students();
        store.put_collection(ROSTER_KEY, &students).await?;
        info!(count = students.len(), "Seeded demo roster");
    }

    if !store.has_collection(LEDGER_KEY).await? {
        let records = demo_records();
        store.put_collection(LEDGER_KEY, &records).await?;
        info!(count = records.len(), "Seeded demo ledger");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_db;
    use crate::store::Repository;

    #[actix_web::test]
    async fn seeds_once_and_keeps_references_valid() {
        let store = SqliteStore::new(init_memory_db().await.unwrap());
        seed_demo_data(&store).await.unwrap();

        let roster = store.students().await.unwrap();
        let ledger = store.records().await.unwrap();
        assert_eq!(roster.len(), 12);
        assert_eq!(roster[0].id, "1001");
        assert_eq!(ledger.len(), 4);
        assert!(ledger
            .iter()
            .all(|r| roster.iter().any(|s| s.id == r.student_id)));

        store.set_students(&[]).await.unwrap();
        seed_demo_data(&store).await.unwrap();
        assert!(store.students().await.unwrap().is_empty());
    }
}
