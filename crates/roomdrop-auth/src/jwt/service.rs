//! JWT issuance and validation scoped to rooms.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use roomdrop_core::config::AuthConfig;
use roomdrop_core::traits::TokenService;
use roomdrop_core::types::RoomId;
use roomdrop_core::{ShareError, ShareResult};

use super::claims::Claims;

/// Issues and validates HS256-signed room tokens.
#[derive(Clone)]
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtTokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtTokenService")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtTokenService {
    /// Creates a new token service from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 5; // 5 seconds leeway for clock skew

        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    fn decode_claims(&self, token: &str) -> ShareResult<Claims> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => ShareError::TokenExpired,
                _ => ShareError::InvalidToken,
            }
        })?;
        Ok(data.claims)
    }
}

#[async_trait]
impl TokenService for JwtTokenService {
    async fn issue(&self, room_id: RoomId, ttl: Duration) -> ShareResult<(String, DateTime<Utc>)> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|_| ShareError::internal("Token TTL out of range"))?;
        let now = Utc::now();
        let exp = now + ttl;

        let claims = Claims {
            sub: room_id.into_uuid(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ShareError::internal(format!("Failed to encode token: {e}")))?;

        Ok((token, exp))
    }

    async fn validate(&self, token: &str) -> ShareResult<()> {
        self.decode_claims(token).map(|_| ())
    }

    async fn validate_with_room(&self, room_id: RoomId, token: &str) -> ShareResult<()> {
        let claims = self.decode_claims(token)?;
        if claims.sub != room_id.into_uuid() {
            return Err(ShareError::TokenRoomMismatch);
        }
        Ok(())
    }
}
