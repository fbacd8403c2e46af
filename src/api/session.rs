//! Session control for the dashboard: start, observe, answer the liveness
//! dialog, stop.

use crate::{
    auth::auth::AuthUser,
    config::Config,
    error::AppError,
    model::student::Student,
    oracle::http::HttpOracle,
    photo::PhotoDataUri,
    session::{
        controller::RosterScan,
        gate::RandomGate,
        identify::{Identify, IdentifyOutcome},
        state::SessionHandle,
    },
    store::{Repository, kv::SqliteStore},
};
use actix_web::{HttpResponse, rt, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::time::timeout;
use tracing::{debug, info};
use utoipa::ToSchema;

/// A frame captured by the operator's camera.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FrameSubmission {
    /// Absent when the camera produced no frame.
    #[schema(example = "data:image/jpeg;base64,/9j/4AAQSkZJRg==")]
    pub photo_data_uri: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ScanStarted {
    #[schema(example = "Attendance scan started")]
    pub message: String,
    #[schema(example = 12)]
    pub total: usize,
}

/// Current session view
#[utoipa::path(
    get,
    path = "/api/session",
    responses(
        (status = 200, description = "Session snapshot", body = crate::session::state::SessionSnapshot),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Session"
)]
pub async fn get_session(_auth: AuthUser, session: web::Data<SessionHandle>) -> HttpResponse {
    HttpResponse::Ok().json(session.snapshot())
}

/// Start a roster scan
#[utoipa::path(
    post,
    path = "/api/session/scan",
    responses(
        (status = 202, description = "Scan started in the background", body = ScanStarted),
        (status = 200, description = "Roster is empty, nothing to do", body = Object, example = json!({
            "message": "No students enrolled"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "A session is already running"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Session"
)]
pub async fn start_scan(
    auth: AuthUser,
    store: web::Data<SqliteStore>,
    oracle: web::Data<HttpOracle>,
    session: web::Data<SessionHandle>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let scan = RosterScan::new(
        store.get_ref().clone(),
        oracle.get_ref().clone(),
        RandomGate::from_entropy(config.verification_probability),
        config.session_timing(),
        session.get_ref().clone(),
    );

    let Some(run) = scan.begin().await? else {
        return Ok(HttpResponse::Ok().json(json!({
            "message": "No students enrolled"
        })));
    };

    let total = run.total();
    info!(operator = %auth.email, total, "Roster scan requested");
    rt::spawn(async move {
        let summary = run.run().await;
        debug!(?summary, "Roster scan task done");
    });

    Ok(HttpResponse::Accepted().json(ScanStarted {
        message: "Attendance scan started".into(),
        total,
    }))
}

/// Identify a student from one frame
#[utoipa::path(
    post,
    path = "/api/session/identify",
    request_body = FrameSubmission,
    responses(
        (status = 202, description = "Student matched, liveness check pending", body = Student),
        (status = 200, description = "No enrolled student matched", body = Object, example = json!({
            "message": "No enrolled student matched the captured face."
        })),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Busy, or the match is not on the roster"),
        (status = 422, description = "No usable frame"),
        (status = 502, description = "Verification service failed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Session"
)]
pub async fn identify(
    auth: AuthUser,
    store: web::Data<SqliteStore>,
    oracle: web::Data<HttpOracle>,
    session: web::Data<SessionHandle>,
    payload: web::Json<FrameSubmission>,
) -> Result<HttpResponse, AppError> {
    let frame = PhotoDataUri::from_submission(payload.into_inner().photo_data_uri);
    let flow = Identify::new(
        store.get_ref().clone(),
        oracle.get_ref().clone(),
        session.get_ref().clone(),
    );

    match flow.identify(frame).await? {
        IdentifyOutcome::NoMatch => Ok(HttpResponse::Ok().json(json!({
            "message": "No enrolled student matched the captured face."
        }))),
        IdentifyOutcome::Matched(matched) => {
            let student: Student = matched.student().clone();
            info!(operator = %auth.email, student_id = %student.id, "Identification matched");
            rt::spawn(async move {
                if let Ok(resolution) = matched.verify().await {
                    debug!(?resolution, "Identification resolved");
                }
            });
            Ok(HttpResponse::Accepted().json(student))
        }
    }
}

/// Wait for the next liveness prompt
#[utoipa::path(
    get,
    path = "/api/session/verification",
    responses(
        (status = 200, description = "A prompt is waiting for the operator", body = crate::session::state::PendingVerification),
        (status = 204, description = "No prompt appeared before the wait expired"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Session"
)]
pub async fn await_verification(
    _auth: AuthUser,
    session: web::Data<SessionHandle>,
    config: web::Data<Config>,
) -> HttpResponse {
    match timeout(config.prompt_wait(), session.wait_for_prompt()).await {
        Ok(pending) => HttpResponse::Ok().json(pending),
        Err(_) => HttpResponse::NoContent().finish(),
    }
}

/// Confirm the pending liveness prompt
#[utoipa::path(
    post,
    path = "/api/session/verification",
    request_body = FrameSubmission,
    responses(
        (status = 202, description = "Frame handed to the session"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "No verification is waiting")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Session"
)]
pub async fn confirm_verification(
    _auth: AuthUser,
    session: web::Data<SessionHandle>,
    payload: web::Json<FrameSubmission>,
) -> Result<HttpResponse, AppError> {
    // a missing or malformed frame is still an answer; the session records the failure
    session.confirm(PhotoDataUri::from_submission(
        payload.into_inner().photo_data_uri,
    ))?;

    Ok(HttpResponse::Accepted().json(json!({
        "message": "Frame submitted"
    })))
}

/// Close the liveness dialog without answering
#[utoipa::path(
    delete,
    path = "/api/session/verification",
    responses(
        (status = 204, description = "Dialog dismissed"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "No verification is waiting")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Session"
)]
pub async fn dismiss_verification(
    _auth: AuthUser,
    session: web::Data<SessionHandle>,
) -> Result<HttpResponse, AppError> {
    session.dismiss()?;
    Ok(HttpResponse::NoContent().finish())
}

/// Stop the running session
#[utoipa::path(
    post,
    path = "/api/session/stop",
    responses(
        (status = 202, description = "Stop requested"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "No session is running")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Session"
)]
pub async fn stop_session(
    auth: AuthUser,
    session: web::Data<SessionHandle>,
) -> Result<HttpResponse, AppError> {
    session.stop()?;
    info!(operator = %auth.email, "Session stop requested");

    Ok(HttpResponse::Accepted().json(json!({
        "message": "Stop requested"
    })))
}

/// Clear the finished session view
#[utoipa::path(
    post,
    path = "/api/session/reset",
    responses(
        (status = 200, description = "Fresh, unmarked view of the roster", body = crate::session::state::SessionSnapshot),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "A session is running")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Session"
)]
pub async fn reset_session(
    _auth: AuthUser,
    store: web::Data<SqliteStore>,
    session: web::Data<SessionHandle>,
) -> Result<HttpResponse, AppError> {
    let roster = store.students().await?;
    session.reset(&roster)?;
    Ok(HttpResponse::Ok().json(session.snapshot()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::testing::TestState,
        model::attendance::{AttendanceRecord, VerificationStatus},
        session::{fixtures::roster, state::SessionMode},
    };
    use actix_web::{
        http::StatusCode,
        test::{self, TestRequest},
    };
    use serde_json::Value;
    use std::time::Duration;

    async fn wait_until_idle(session: &SessionHandle) {
        for _ in 0..200 {
            if !session.is_running() {
                return;
            }
            rt::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("session never finished");
    }

    #[actix_web::test]
    async fn scan_records_every_student() {
        let state = TestState::new().await;
        state
            .store
            .set_students(&roster(&[("1001", "A"), ("1002", "B")]))
            .await
            .unwrap();
        let app = test::init_service(state.clone().app()).await;

        let req = state
            .authed(TestRequest::post().uri("/api/session/scan"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::ACCEPTED);

        wait_until_idle(&state.session).await;

        let req = state
            .authed(TestRequest::get().uri("/api/attendance"))
            .to_request();
        let records: Vec<AttendanceRecord> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(records.len(), 2);
        assert!(
            records
                .iter()
                .all(|r| r.verification == VerificationStatus::NotRequired)
        );

        let req = state
            .authed(TestRequest::get().uri("/api/session"))
            .to_request();
        let snapshot: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(snapshot["running"], false);
        assert_eq!(snapshot["progress"], 100.0);
        assert_eq!(snapshot["notices"][0]["title"], "Attendance Complete");
    }

    #[actix_web::test]
    async fn empty_roster_scan_is_a_no_op() {
        let state = TestState::new().await;
        let app = test::init_service(state.clone().app()).await;

        let req = state
            .authed(TestRequest::post().uri("/api/session/scan"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(!state.session.is_running());
    }

    #[actix_web::test]
    async fn busy_session_rejects_new_work() {
        let state = TestState::new().await;
        state
            .session
            .begin(SessionMode::Identification, &roster(&[("1001", "A")]))
            .unwrap();
        state
            .store
            .set_students(&roster(&[("1001", "A")]))
            .await
            .unwrap();
        let app = test::init_service(state.clone().app()).await;

        let req = state
            .authed(TestRequest::post().uri("/api/session/scan"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

        let req = state
            .authed(TestRequest::post().uri("/api/session/reset"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn identify_without_a_frame_is_unprocessable() {
        let state = TestState::new().await;
        let app = test::init_service(state.clone().app()).await;

        let req = state
            .authed(TestRequest::post().uri("/api/session/identify"))
            .set_json(json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(!state.session.is_running());
    }

    #[actix_web::test]
    async fn dialog_endpoints_need_a_pending_prompt() {
        let state = TestState::new().await;
        let app = test::init_service(state.clone().app()).await;

        let req = state
            .authed(TestRequest::post().uri("/api/session/verification"))
            .set_json(json!({"photoDataUri": "data:image/png;base64,iVBORw0KGgo="}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

        let req = state
            .authed(TestRequest::delete().uri("/api/session/verification"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

        // zero wait in tests
        let req = state
            .authed(TestRequest::get().uri("/api/session/verification"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);
    }

    #[actix_web::test]
    async fn stop_requires_a_running_session() {
        let state = TestState::new().await;
        let app = test::init_service(state.clone().app()).await;

        let req = state
            .authed(TestRequest::post().uri("/api/session/stop"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

        state
            .session
            .begin(SessionMode::RosterScan, &roster(&[("1001", "A")]))
            .unwrap();
        let req = state
            .authed(TestRequest::post().uri("/api/session/stop"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::ACCEPTED);
        assert!(state.session.stop_requested());
    }

    #[actix_web::test]
    async fn reset_shows_an_unmarked_roster() {
        let state = TestState::new().await;
        state
            .store
            .set_students(&roster(&[("1001", "A"), ("1002", "B")]))
            .await
            .unwrap();
        let app = test::init_service(state.clone().app()).await;

        let req = state
            .authed(TestRequest::post().uri("/api/session/reset"))
            .to_request();
        let snapshot: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(snapshot["students"].as_array().unwrap().len(), 2);
        assert_eq!(snapshot["students"][0]["attendanceStatus"], "Unmarked");
        assert_eq!(snapshot["students"][0]["verificationStatus"], "Not Required");
    }
}
