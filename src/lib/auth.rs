use serde::{Deserialize, Serialize};
use jsonwebtoken::errors::{Error as JwtError};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use std::env;
use crate::lib::error::{InternalError, ServerError};

/// Bearer-token claims: the authenticated user and the token expiry.
#[derive(Serialize, Deserialize)]
pub struct Claims {
    pub uid: i32,
    pub username: String,
    pub exp: usize,
}

const TOKEN_LIFETIME_SECONDS: i64 = 60 * 60 * 24 * 7;

fn jwt_secret() -> Vec<u8> {
    env::var("JWT_SECRET").unwrap_or_else(|_| String::from("nebula-secret")).into_bytes()
}

impl Claims {
    pub fn new(uid: i32, username: String) -> Self {
        Claims {
            uid,
            username,
            exp: (chrono::Utc::now().timestamp() + TOKEN_LIFETIME_SECONDS) as usize,
        }
    }
}

impl FromRequest for Claims {
    type Error = ServerError;
    type Future = Ready<Result<Self, ServerError>>;
    type Config = ();

    fn from_request(req: &HttpRequest, _: &mut Payload) -> <Self as FromRequest>::Future {
        let result = req.headers().get("Authorization")
            .and_then(|header| header.to_str().ok())
            .and_then(|header| header.split(' ').last())
            .ok_or_else(|| ServerError::from(InternalError::NoAuthorizationGiven))
            .and_then(|token| decode_jwt(token).map_err(ServerError::from));
        ready(result)
    }
}

pub fn create_jwt(claims: &Claims) -> Result<String, JwtError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(&jwt_secret()),
    )
}

pub fn decode_jwt(token: &str) -> Result<Claims, JwtError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(&jwt_secret()),
        &Validation::default()
    ).map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_round_trip() {
        let claims = Claims::new(42, String::from("testuser"));
        let token = create_jwt(&claims).unwrap();
        let decoded = decode_jwt(&token).unwrap();

        assert_eq!(42, decoded.uid);
        assert_eq!("testuser", decoded.username);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert_eq!(true, decode_jwt("invalid.token.here").is_err());
    }
}
