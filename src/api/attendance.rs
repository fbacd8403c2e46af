use crate::{
    auth::auth::AuthUser, error::AppError, model::attendance::AttendanceRecord, store::Repository,
    store::kv::SqliteStore,
};
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Deserialize, IntoParams)]
pub struct AttendanceFilter {
    /// Only records of this day (`YYYY-MM-DD`)
    #[param(example = "2024-07-20")]
    pub date: Option<NaiveDate>,
    /// Only records of this student
    #[param(example = "1001")]
    pub student_id: Option<String>,
}

impl AttendanceFilter {
    fn matches(&self, record: &AttendanceRecord) -> bool {
        self.date.is_none_or(|date| record.date == date)
            && self
                .student_id
                .as_deref()
                .is_none_or(|id| record.student_id == id)
    }
}

/// Newest day first. Records of the same day keep ledger order.
fn report(mut records: Vec<AttendanceRecord>, filter: &AttendanceFilter) -> Vec<AttendanceRecord> {
    records.retain(|r| filter.matches(r));
    records.sort_by(|a, b| b.date.cmp(&a.date));
    records
}

/// Attendance report
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceFilter),
    responses(
        (status = 200, description = "Ledger entries, newest day first", body = [AttendanceRecord]),
        (status = 400, description = "Malformed filter"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    _auth: AuthUser,
    store: web::Data<SqliteStore>,
    filter: web::Query<AttendanceFilter>,
) -> Result<HttpResponse, AppError> {
    let records = store.records().await?;
    Ok(HttpResponse::Ok().json(report(records, &filter)))
}
