use crate::{
    auth::{auth::AuthUser, jwt::generate_access_token},
    config::Config,
    error::ApiError,
    model::{directory::Directory, role::UserScope},
    models::{LoginReqDto, LoginResponse},
};
use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use tracing::{debug, error, info, instrument};

/// Log in and receive a session token
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Username or password required"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(directory, config, user),
    fields(username = %user.username)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    directory: web::Data<Directory>,
    config: web::Data<Config>,
) -> impl Responder {
    info!("Login request received");

    // 1️⃣ Basic validation
    if user.username.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty username or password");
        return HttpResponse::BadRequest().json(json!({
            "error": "Username or password required"
        }));
    }

    // 2️⃣ Check credentials; unknown user and wrong password look the same
    debug!("Verifying credentials");

    let scope = match directory
        .authenticate(&user.username, &user.password)
        .then(|| directory.resolve_scope(&user.username))
        .flatten()
    {
        Some(scope) => scope,
        None => {
            info!("Invalid credentials");
            return HttpResponse::Unauthorized().json(json!({
                "error": "Invalid credentials"
            }));
        }
    };

    // 3️⃣ Generate access token
    debug!(role = ?scope.role, office = %scope.office, "Generating access token");

    let access_token = match generate_access_token(
        &user.username,
        &scope,
        &config.jwt_secret,
        config.access_token_ttl,
    ) {
        Ok(token) => token,
        Err(e) => {
            error!(error = %e, "Failed to sign access token");
            return HttpResponse::InternalServerError().finish();
        }
    };

    info!("Login successful");

    HttpResponse::Ok().json(LoginResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: config.access_token_ttl,
        role: scope.role,
        office: scope.office,
    })
}

/// Who the current session belongs to
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Current user scope", body = Object, example = json!({
            "username": "hyderabad",
            "role": "office_user",
            "office": "Hyderabad"
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn me(auth: AuthUser) -> Result<HttpResponse, ApiError> {
    let UserScope { role, office } = auth.scope();
    Ok(HttpResponse::Ok().json(json!({
        "username": auth.username,
        "role": role,
        "office": office
    })))
}
