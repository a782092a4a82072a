use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::directory::{Directory, OfficeRoster};
use actix_web::{HttpResponse, web};

/// Offices visible to the caller, with their employees
#[utoipa::path(
    get,
    path = "/api/offices",
    responses(
        (status = 200, description = "Office rosters", body = [OfficeRoster]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Offices"
)]
pub async fn list_offices(auth: AuthUser, directory: web::Data<Directory>) -> HttpResponse {
    let visible: Vec<&OfficeRoster> = directory
        .rosters
        .iter()
        .filter(|roster| auth.can_access(&roster.office))
        .collect();

    HttpResponse::Ok().json(visible)
}

/// Employees of one office
#[utoipa::path(
    get,
    path = "/api/offices/{office}/employees",
    params(
        ("office" = String, Path, description = "Office name", example = "Hyderabad")
    ),
    responses(
        (status = 200, description = "Office roster", body = OfficeRoster),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Unknown office")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Offices"
)]
pub async fn get_roster(
    auth: AuthUser,
    directory: web::Data<Directory>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let office = path.into_inner();
    auth.require_office(&office)?;

    let employees = directory
        .roster(&office)
        .ok_or_else(|| ApiError::not_found(format!("Unknown office '{office}'")))?
        .to_vec();

    Ok(HttpResponse::Ok().json(OfficeRoster { office, employees }))
}
