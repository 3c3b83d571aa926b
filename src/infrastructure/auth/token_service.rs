//! Token issuance and verification
//!
//! Two HS256 tokens per session: a short-lived access token carrying the
//! permission snapshot and a longer-lived refresh token. Each kind is
//! signed with its own secret. Verification consults the revocation
//! store for both the jti blacklist and the per-user watermark.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::User;
use crate::infrastructure::auth::revocation::RevocationStore;
use crate::shared::config::AuthConfig;
use crate::shared::error::AuthError;

/// Claims carried by the access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: Uuid,
    pub permissions: Vec<String>,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// Claims carried by the refresh token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// A freshly minted access/refresh pair
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

pub struct TokenService {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
    auto_refresh_threshold: Duration,
    revocation: Arc<RevocationStore>,
}

impl TokenService {
    pub fn new(config: &AuthConfig, revocation: Arc<RevocationStore>) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            access_lifetime: Duration::seconds(config.access_lifetime_secs),
            refresh_lifetime: Duration::seconds(config.refresh_lifetime_secs),
            auto_refresh_threshold: Duration::seconds(config.auto_refresh_threshold_secs),
            revocation,
        }
    }

    pub fn revocation(&self) -> &Arc<RevocationStore> {
        &self.revocation
    }

    /// Issues a fresh access/refresh pair for the user.
    pub fn issue_pair(&self, user: &User) -> Result<TokenPair, AuthError> {
        self.reissue(user.id, user.permissions.clone())
    }

    /// Mints a pair for an already-verified session (sliding refresh).
    pub fn reissue(
        &self,
        user_id: Uuid,
        permissions: Vec<String>,
    ) -> Result<TokenPair, AuthError> {
        let now = Utc::now();

        let access_claims = AccessClaims {
            sub: user_id,
            permissions,
            iat: now.timestamp(),
            exp: (now + self.access_lifetime).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };
        let access = encode(
            &Header::new(Algorithm::HS256),
            &access_claims,
            &self.access_encoding,
        )
        .map_err(|e| AuthError::Signing(e.to_string()))?;

        let refresh_claims = RefreshClaims {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + self.refresh_lifetime).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };
        let refresh = encode(
            &Header::new(Algorithm::HS256),
            &refresh_claims,
            &self.refresh_encoding,
        )
        .map_err(|e| AuthError::Signing(e.to_string()))?;

        Ok(TokenPair { access, refresh })
    }

    /// Verifies an access token, including revocation state.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let claims = Self::decode_claims::<AccessClaims>(token, &self.access_decoding)?;
        self.check_revocation(&claims.jti, claims.sub, claims.iat)?;
        Ok(claims)
    }

    /// Verifies a refresh token, including revocation state.
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, AuthError> {
        let claims = Self::decode_claims::<RefreshClaims>(token, &self.refresh_decoding)?;
        self.check_revocation(&claims.jti, claims.sub, claims.iat)?;
        Ok(claims)
    }

    /// True when the access token is close enough to expiry that the
    /// request should mint a fresh pair.
    pub fn needs_refresh(&self, claims: &AccessClaims) -> bool {
        let remaining = claims.exp - Utc::now().timestamp();
        remaining < self.auto_refresh_threshold.num_seconds()
    }

    /// Blacklists both tokens of a session.
    pub fn revoke_pair(&self, access: &AccessClaims, refresh: &RefreshClaims) {
        self.revocation.revoke_token(&access.jti);
        self.revocation.revoke_token(&refresh.jti);
    }

    /// Invalidates every token the user holds that was issued before now.
    pub fn revoke_all_for(&self, user_id: Uuid) {
        self.revocation
            .revoke_all_before(user_id, Utc::now().timestamp());
    }

    fn decode_claims<T: serde::de::DeserializeOwned>(
        token: &str,
        key: &DecodingKey,
    ) -> Result<T, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;

        decode::<T>(token, key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenInvalid,
            })
    }

    fn check_revocation(&self, jti: &str, user_id: Uuid, issued_at: i64) -> Result<(), AuthError> {
        if self.revocation.is_revoked(jti) {
            return Err(AuthError::TokenRevoked);
        }
        if self.revocation.is_before_watermark(user_id, issued_at) {
            return Err(AuthError::TokenRevoked);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::permissions;

    fn test_config() -> AuthConfig {
        AuthConfig {
            access_secret: "access-secret-for-tests".to_string(),
            refresh_secret: "refresh-secret-for-tests".to_string(),
            access_lifetime_secs: 3600,
            refresh_lifetime_secs: 86_400,
            auto_refresh_threshold_secs: 900,
        }
    }

    fn test_user() -> User {
        User::new(
            "alice".to_string(),
            "hash".to_string(),
            vec![permissions::MEDIA_ACCESS.to_string()],
        )
    }

    fn service() -> TokenService {
        TokenService::new(&test_config(), Arc::new(RevocationStore::new()))
    }

    #[test]
    fn issue_and_verify_round_trip() {
        let service = service();
        let user = test_user();
        let pair = service.issue_pair(&user).unwrap();

        let access = service.verify_access(&pair.access).unwrap();
        assert_eq!(access.sub, user.id);
        assert_eq!(access.permissions, user.permissions);

        let refresh = service.verify_refresh(&pair.refresh).unwrap();
        assert_eq!(refresh.sub, user.id);
    }

    #[test]
    fn token_kinds_are_not_interchangeable() {
        let service = service();
        let pair = service.issue_pair(&test_user()).unwrap();

        // A refresh token must not verify as an access token: the kinds
        // are signed with separate secrets
        assert!(service.verify_access(&pair.refresh).is_err());
    }

    #[test]
    fn revoked_jti_fails_verification() {
        let service = service();
        let user = test_user();
        let pair = service.issue_pair(&user).unwrap();

        let access = service.verify_access(&pair.access).unwrap();
        let refresh = service.verify_refresh(&pair.refresh).unwrap();
        service.revoke_pair(&access, &refresh);

        assert!(matches!(
            service.verify_access(&pair.access),
            Err(AuthError::TokenRevoked)
        ));
        assert!(matches!(
            service.verify_refresh(&pair.refresh),
            Err(AuthError::TokenRevoked)
        ));
    }

    #[test]
    fn logout_all_rejects_older_tokens_and_spares_other_users() {
        let service = service();
        let alice = test_user();
        let bob = User::new("bob".to_string(), "hash".to_string(), Vec::new());

        let a1 = service.issue_pair(&alice).unwrap();
        let b1 = service.issue_pair(&bob).unwrap();

        // Watermark strictly after issuance
        service
            .revocation
            .revoke_all_before(alice.id, Utc::now().timestamp() + 1);

        assert!(matches!(
            service.verify_access(&a1.access),
            Err(AuthError::TokenRevoked)
        ));
        assert!(service.verify_access(&b1.access).is_ok());
    }

    #[test]
    fn fresh_token_does_not_need_refresh() {
        let service = service();
        let pair = service.issue_pair(&test_user()).unwrap();
        let claims = service.verify_access(&pair.access).unwrap();
        assert!(!service.needs_refresh(&claims));
    }
}
