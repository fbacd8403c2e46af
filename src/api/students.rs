use crate::{
    auth::auth::AuthUser, error::AppError, model::student::Student, store::Repository,
    store::kv::SqliteStore,
};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;

const MIN_NAME_LEN: usize = 2;
const MIN_ID_LEN: usize = 4;

#[derive(Deserialize, ToSchema)]
pub struct EnrollStudent {
    #[schema(example = "1013")]
    pub id: String,
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    /// Image URL or `data:image/...;base64,` URI.
    #[schema(example = "https://picsum.photos/seed/1013/400/400")]
    pub avatar: String,
}

impl EnrollStudent {
    fn validate(self) -> Result<Student, AppError> {
        let id = self.id.trim();
        let name = self.name.trim();
        let avatar = self.avatar.trim();

        if name.chars().count() < MIN_NAME_LEN {
            return Err(AppError::BadRequest(format!(
                "Name must be at least {MIN_NAME_LEN} characters."
            )));
        }
        if id.chars().count() < MIN_ID_LEN {
            return Err(AppError::BadRequest(format!(
                "Student ID must be at least {MIN_ID_LEN} characters."
            )));
        }
        if avatar.is_empty() {
            return Err(AppError::BadRequest("Please upload an image.".into()));
        }

        Ok(Student {
            id: id.to_string(),
            name: name.to_string(),
            avatar: avatar.to_string(),
        })
    }
}

/// List the enrolled roster
#[utoipa::path(
    get,
    path = "/api/students",
    responses(
        (status = 200, description = "Roster in enrollment order", body = [Student]),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Students"
)]
pub async fn list_students(
    _auth: AuthUser,
    store: web::Data<SqliteStore>,
) -> Result<HttpResponse, AppError> {
    let students = store.students().await?;
    Ok(HttpResponse::Ok().json(students))
}

/// Enroll a student
#[utoipa::path(
    post,
    path = "/api/students",
    request_body = EnrollStudent,
    responses(
        (status = 201, description = "Student enrolled", body = Student),
        (status = 400, description = "Invalid enrollment form", body = Object, example = json!({
            "message": "Student ID must be at least 4 characters."
        })),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Duplicate student id", body = Object, example = json!({
            "message": "A student with this ID already exists."
        })),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Students"
)]
pub async fn enroll_student(
    auth: AuthUser,
    store: web::Data<SqliteStore>,
    payload: web::Json<EnrollStudent>,
) -> Result<HttpResponse, AppError> {
    let student = payload.into_inner().validate()?;
    store.add_student(student.clone()).await?;

    info!(student_id = %student.id, operator = %auth.email, "Student enrolled");
    Ok(HttpResponse::Created().json(student))
}
