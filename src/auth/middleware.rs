use crate::auth::auth::AuthUser;
use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::error::ApiError;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, ResponseError,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header::AUTHORIZATION,
    web::Data,
};
use tracing::debug;

/// Resolves the bearer token into an [`AuthUser`] stored in the request
/// extensions. Requests without a valid token are answered with 401 here.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?;

    let auth_user = match session_user(&req, &config.jwt_secret) {
        Ok(user) => user,
        Err(e) => {
            let resp = e.error_response();
            return Ok(req.into_response(resp));
        }
    };

    req.extensions_mut().insert(auth_user);

    next.call(req).await
}

fn session_user(req: &ServiceRequest, secret: &str) -> Result<AuthUser, ApiError> {
    let header_value = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".into()))?
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Invalid Authorization header encoding".into()))?;

    let token = header_value.strip_prefix("Bearer ").ok_or_else(|| {
        ApiError::Unauthorized("Authorization header must start with Bearer".into())
    })?;

    // the cause only goes to the log
    let claims = verify_token(token, secret).map_err(|e| {
        debug!(error = %e, path = %req.path(), "Rejected session token");
        ApiError::Unauthorized("Invalid or expired token".into())
    })?;

    Ok(AuthUser {
        username: claims.sub,
        role: claims.role,
        office: claims.office,
    })
}
