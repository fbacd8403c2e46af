use crate::api::{
    session::{FrameSubmission, ScanStarted},
    students::EnrollStudent,
};
use crate::model::{
    attendance::{AttendanceRecord, AttendanceStatus, ScanStatus, VerificationStatus},
    student::Student,
};
use crate::session::state::{
    Notice, NoticeLevel, PendingVerification, SessionMode, SessionSnapshot, StudentWithStatus,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Guardian Attendance API",
        version = "1.0.0",
        description = r#"
## Classroom attendance with liveness checks

Operators enroll students and run attendance sessions against the roster.

### 🔹 Key Features
- **Roster**
  - Enroll students and list the roster
- **Attendance sessions**
  - Walk the roster one student at a time, with random liveness checks
  - Identify a single student from one camera frame
- **Reports**
  - Ledger of every attendance record, filterable by day and student

### 🔐 Security
Every `/api` endpoint requires a **JWT Bearer** access token from `/auth/login`.

### 📦 Session flow
1. `POST /api/session/scan` starts the walk
2. `GET /api/session/verification` long-polls for a liveness prompt
3. `POST /api/session/verification` answers it with a captured frame
4. `GET /api/session` shows per-student progress and notices

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::students::list_students,
        crate::api::students::enroll_student,

        crate::api::attendance::list_attendance,

        crate::api::session::get_session,
        crate::api::session::start_scan,
        crate::api::session::identify,
        crate::api::session::await_verification,
        crate::api::session::confirm_verification,
        crate::api::session::dismiss_verification,
        crate::api::session::stop_session,
        crate::api::session::reset_session
    ),
    components(
        schemas(
            Student,
            EnrollStudent,
            AttendanceRecord,
            AttendanceStatus,
            VerificationStatus,
            ScanStatus,
            SessionMode,
            SessionSnapshot,
            StudentWithStatus,
            PendingVerification,
            Notice,
            NoticeLevel,
            FrameSubmission,
            ScanStarted
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Students", description = "Roster management APIs"),
        (name = "Attendance", description = "Attendance ledger APIs"),
        (name = "Session", description = "Attendance session control APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_session_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/students",
            "/api/attendance",
            "/api/session",
            "/api/session/scan",
            "/api/session/identify",
            "/api/session/verification",
            "/api/session/stop",
            "/api/session/reset",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing");
        }
        let components = doc.components.unwrap_or_default();
        assert!(components.security_schemes.contains_key("bearer_auth"));
        for schema in ["SessionSnapshot", "PendingVerification", "Student"] {
            assert!(components.schemas.contains_key(schema), "{schema} missing");
        }
    }
}
