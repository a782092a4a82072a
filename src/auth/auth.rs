use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::error::ApiError;
use crate::model::role::{Role, Scope, UserScope};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
    pub role: Role,
    /// "all" for admins, otherwise the one office this user manages
    pub office: Scope,
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // the auth middleware has usually decoded the token already
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ApiError::Unauthorized("Missing token".into()))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => return ready(Err(ApiError::Internal("Config missing".into()))),
        };

        let claims = match verify_token(token, &config.jwt_secret) {
            Ok(c) => c,
            Err(_) => return ready(Err(ApiError::Unauthorized("Invalid token".into()))),
        };

        ready(Ok(AuthUser {
            username: claims.sub,
            role: claims.role,
            office: claims.office,
        }))
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(ApiError::forbidden("Admin only"))
        }
    }

    pub fn can_access(&self, office: &str) -> bool {
        self.scope().can_access(office)
    }

    pub fn require_office(&self, office: &str) -> Result<(), ApiError> {
        if self.can_access(office) {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!("No access to office '{office}'")))
        }
    }

    pub fn scope(&self) -> UserScope {
        UserScope {
            role: self.role,
            office: self.office.clone(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
