use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::role::{Role, Scope};

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "hyderabad")]
    pub username: String,
    #[schema(example = "Hyderabad@123")]
    pub password: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Seconds until the token expires
    #[schema(example = 28800)]
    pub expires_in: usize,
    pub role: Role,
    #[schema(value_type = String, example = "Hyderabad")]
    pub office: Scope,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    /// "all" or the office this session is scoped to
    pub office: Scope,
    pub exp: usize,
    pub jti: String,
}
