use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::Error};
use uuid::Uuid;

use crate::model::role::UserScope;
use crate::models::Claims;

fn now() -> usize {
    Utc::now().timestamp().max(0) as usize
}

pub fn generate_access_token(
    username: &str,
    scope: &UserScope,
    secret: &str,
    ttl: usize,
) -> Result<String, Error> {
    let claims = Claims {
        sub: username.to_string(),
        role: scope.role,
        office: scope.office.clone(),
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}
