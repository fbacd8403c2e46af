use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};
use sqlx::SqlitePool;
use tokio::sync::Mutex;

use super::{LEDGER_KEY, OPERATORS_KEY, ROSTER_KEY, Repository, StoreError, enroll};
use crate::model::{
    attendance::{AttendanceRecord, NewAttendanceRecord},
    operator::Operator,
    student::Student,
};

/// Key/value blob store on top of the `kv` table.
///
/// Every read-modify-write holds `writes` from the read to the write, so
/// concurrent handlers cannot overwrite each other's collections.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    writes: Arc<Mutex<()>>,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            writes: Arc::default(),
        }
    }

    /// `None` when the key has never been written.
    pub async fn get_collection<T: DeserializeOwned>(
        &self,
        key: &'static str,
    ) -> Result<Option<Vec<T>>, StoreError> {
        let row = sqlx::query_as::<_, (String,)>("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|(raw,)| serde_json::from_str(&raw))
            .transpose()
            .map_err(|source| StoreError::Corrupt { key, source })
    }

    pub async fn put_collection<T: Serialize>(
        &self,
        key: &'static str,
        items: &[T],
    ) -> Result<(), StoreError> {
        let raw =
            serde_json::to_string(items).map_err(|source| StoreError::Encode { key, source })?;

        sqlx::query(
            r#"
            INSERT INTO kv (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(raw)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn has_collection(&self, key: &'static str) -> Result<bool, StoreError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM kv WHERE key = ?")
            .bind(key)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    pub async fn find_operator(&self, email: &str) -> Result<Option<Operator>, StoreError> {
        let email = email.trim().to_lowercase();
        let operators: Vec<Operator> = self
            .get_collection(OPERATORS_KEY)
            .await?
            .unwrap_or_default();
        Ok(operators.into_iter().find(|o| o.email == email))
    }

    pub async fn add_operator(&self, operator: Operator) -> Result<(), StoreError> {
        let _write = self.writes.lock().await;
        let mut operators: Vec<Operator> = self
            .get_collection(OPERATORS_KEY)
            .await?
            .unwrap_or_default();
        if operators.iter().any(|o| o.email == operator.email) {
            return Err(StoreError::DuplicateOperator(operator.email));
        }
        operators.push(operator);
        self.put_collection(OPERATORS_KEY, &operators).await
    }
}

impl Repository for SqliteStore {
    async fn students(&self) -> Result<Vec<Student>, StoreError> {
        Ok(self.get_collection(ROSTER_KEY).await?.unwrap_or_default())
    }

    async fn set_students(&self, students: &[Student]) -> Result<(), StoreError> {
        self.put_collection(ROSTER_KEY, students).await
    }

    async fn records(&self) -> Result<Vec<AttendanceRecord>, StoreError> {
        Ok(self.get_collection(LEDGER_KEY).await?.unwrap_or_default())
    }

    async fn set_records(&self, records: &[AttendanceRecord]) -> Result<(), StoreError> {
        self.put_collection(LEDGER_KEY, records).await
    }

    async fn add_student(&self, student: Student) -> Result<(), StoreError> {
        let _write = self.writes.lock().await;
        let mut students = self.students().await?;
        enroll(&mut students, student)?;
        self.set_students(&students).await
    }

    async fn append_record(
        &self,
        record: NewAttendanceRecord,
    ) -> Result<AttendanceRecord, StoreError> {
        let _write = self.writes.lock().await;
        let mut records = self.records().await?;
        let record = record.into_record();
        records.push(record.clone());
        self.set_records(&records).await?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_db;
    use crate::model::attendance::VerificationStatus;
    use chrono::Utc;

    fn student(id: &str, name: &str) -> Student {
        Student {
            id: id.into(),
            name: name.into(),
            avatar: format!("https://picsum.photos/seed/{id}/400/400"),
        }
    }

    async fn store() -> SqliteStore {
        SqliteStore::new(init_memory_db().await.unwrap())
    }

    #[actix_web::test]
    async fn missing_collections_read_as_empty() {
        let store = store().await;
        assert!(store.students().await.unwrap().is_empty());
        assert!(store.records().await.unwrap().is_empty());
        assert!(!store.has_collection(ROSTER_KEY).await.unwrap());
    }

    #[actix_web::test]
    async fn duplicate_enrollment_leaves_roster_unchanged() {
        let store = store().await;
        store.add_student(student("1001", "A")).await.unwrap();

        let err = store.add_student(student("1001", "Someone Else")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateStudent(id) if id == "1001"));

        let roster = store.students().await.unwrap();
        assert_eq!(roster, vec![student("1001", "A")]);
    }

    #[actix_web::test]
    async fn interleaved_enrollments_all_land() {
        let store = store().await;

        let (a, b) = futures::join!(
            store.add_student(student("2001", "A")),
            store.add_student(student("2002", "B")),
        );
        a.unwrap();
        b.unwrap();

        let mut ids: Vec<_> = store.students().await.unwrap().into_iter().map(|s| s.id).collect();
        ids.sort();
        assert_eq!(ids, vec!["2001", "2002"]);
    }

    #[actix_web::test]
    async fn interleaved_duplicates_admit_exactly_one() {
        let store = store().await;

        let (a, b) = futures::join!(
            store.add_student(student("3001", "A")),
            store.add_student(student("3001", "B")),
        );
        let results = [a, b];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(
            results
                .iter()
                .any(|r| matches!(r, Err(StoreError::DuplicateStudent(id)) if id == "3001"))
        );
        assert_eq!(store.students().await.unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn interleaved_appends_keep_every_record() {
        let store = store().await;
        let a = student("1001", "A");
        let b = student("1002", "B");

        let (first, second) = futures::join!(
            store.append_record(NewAttendanceRecord::present(&a, VerificationStatus::Verified)),
            store.append_record(NewAttendanceRecord::present(&b, VerificationStatus::Failed)),
        );
        first.unwrap();
        second.unwrap();

        assert_eq!(store.records().await.unwrap().len(), 2);
    }

    #[actix_web::test]
    async fn ledger_keeps_insertion_order() {
        let store = store().await;
        let a = student("1001", "A");
        let b = student("1002", "B");

        let first = store
            .append_record(NewAttendanceRecord::present(&a, VerificationStatus::NotRequired))
            .await
            .unwrap();
        let second = store
            .append_record(NewAttendanceRecord::present(&b, VerificationStatus::Failed))
            .await
            .unwrap();

        let ledger = store.records().await.unwrap();
        assert_eq!(ledger, vec![first, second]);
        assert_eq!(ledger[1].verification, VerificationStatus::Failed);
    }

    #[actix_web::test]
    async fn corrupt_blob_is_reported() {
        let store = store().await;
        sqlx::query("INSERT INTO kv (key, value) VALUES (?, ?)")
            .bind(ROSTER_KEY)
            .bind("{not json")
            .execute(&store.pool)
            .await
            .unwrap();

        let err = store.students().await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { key, .. } if key == ROSTER_KEY));
    }

    #[actix_web::test]
    async fn operator_emails_are_unique() {
        let store = store().await;
        let operator = Operator {
            id: "op-1".into(),
            email: "operator@school.edu".into(),
            password_hash: "hash".into(),
            created_at: Utc::now(),
        };
        store.add_operator(operator.clone()).await.unwrap();

        let err = store.add_operator(operator).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateOperator(_)));

        let found = store.find_operator(" Operator@School.edu ").await.unwrap();
        assert_eq!(found.map(|o| o.id), Some("op-1".to_string()));
    }

    #[actix_web::test]
    async fn interleaved_registrations_all_land() {
        let store = store().await;
        let operator = |id: &str| Operator {
            id: id.into(),
            email: format!("{id}@school.edu"),
            password_hash: "hash".into(),
            created_at: Utc::now(),
        };

        let (a, b) = futures::join!(
            store.add_operator(operator("op-1")),
            store.add_operator(operator("op-2")),
        );
        a.unwrap();
        b.unwrap();

        assert!(store.find_operator("op-1@school.edu").await.unwrap().is_some());
        assert!(store.find_operator("op-2@school.edu").await.unwrap().is_some());
    }
}
