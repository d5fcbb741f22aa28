//! Bearer-token handling.
//!
//! Users sign in with the external identity provider, which issues HS256
//! tokens. This server never logs anyone in: it checks the signature and
//! expiry, then reads the user id, role and contact email from [`Claims`].
//! [`generate_access_token`] mints compatible tokens for local tooling and
//! the integration tests.

use estate_core::roles::UserRole;
use estate_core::types::DbId;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Payload of an identity-provider token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id at the identity provider.
    pub sub: DbId,
    /// Role name. Unknown names read as [`UserRole::Guest`].
    pub role: String,
    /// Becomes the billing customer email on subscribe.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn user_role(&self) -> UserRole {
        UserRole::from_claim(&self.role)
    }
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret shared with the identity provider.
    pub secret: String,
    /// Lifetime of tokens minted locally.
    pub access_token_expiry_mins: i64,
}

const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 60;

/// Clock skew tolerated on `exp`, in seconds.
const EXPIRY_LEEWAY_SECS: u64 = 30;

impl JwtConfig {
    /// | Env Var                  | Required | Default |
    /// |--------------------------|----------|---------|
    /// | `JWT_SECRET`             | **yes**  | --      |
    /// | `JWT_ACCESS_EXPIRY_MINS` | no       | `60`    |
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is missing or empty, or the expiry is not an
    /// integer.
    pub fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET").unwrap_or_default();
        assert!(!secret.is_empty(), "JWT_SECRET must be set to a non-empty value");

        let access_token_expiry_mins = match std::env::var("JWT_ACCESS_EXPIRY_MINS") {
            Ok(raw) => raw
                .parse()
                .unwrap_or_else(|_| panic!("JWT_ACCESS_EXPIRY_MINS must be an integer, got '{raw}'")),
            Err(_) => DEFAULT_ACCESS_EXPIRY_MINS,
        };

        Self {
            secret,
            access_token_expiry_mins,
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = EXPIRY_LEEWAY_SECS;
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation
    }
}

/// Mint a token for `user_id` acting as `role`.
pub fn generate_access_token(
    user_id: DbId,
    role: UserRole,
    email: Option<&str>,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let issued_at = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        role: role.as_str().to_string(),
        email: email.map(str::to_string),
        exp: issued_at + config.access_token_expiry_mins * 60,
        iat: issued_at,
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Check signature, algorithm and expiry, and return the claims.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &config.validation(),
    )
    .map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use estate_core::types::new_id;

    use super::*;

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "local-identity-provider-secret".to_string(),
            access_token_expiry_mins: 15,
        }
    }

    fn sign(claims: &Claims, header: Header) -> String {
        jsonwebtoken::encode(
            &header,
            claims,
            &EncodingKey::from_secret(config().secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn minted_dealer_token_carries_role_and_email() {
        let dealer = new_id();
        let token =
            generate_access_token(dealer, UserRole::Dealer, Some("d@example.com"), &config())
                .unwrap();

        let claims = validate_token(&token, &config()).unwrap();
        assert_eq!(claims.sub, dealer);
        assert_eq!(claims.user_role(), UserRole::Dealer);
        assert_eq!(claims.email.as_deref(), Some("d@example.com"));
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn token_expired_beyond_leeway_is_rejected() {
        let now = chrono::Utc::now().timestamp();
        let token = sign(
            &Claims {
                sub: new_id(),
                role: "dealer".to_string(),
                email: None,
                exp: now - 120,
                iat: now - 600,
            },
            Header::new(Algorithm::HS256),
        );

        assert!(validate_token(&token, &config()).is_err());
    }

    #[test]
    fn token_from_another_issuer_is_rejected() {
        let token = generate_access_token(new_id(), UserRole::Guest, None, &config()).unwrap();
        let other = JwtConfig {
            secret: "some-other-provider".to_string(),
            ..config()
        };

        assert!(validate_token(&token, &other).is_err());
    }

    #[test]
    fn other_hmac_algorithms_are_rejected() {
        let now = chrono::Utc::now().timestamp();
        let token = sign(
            &Claims {
                sub: new_id(),
                role: "admin".to_string(),
                email: None,
                exp: now + 600,
                iat: now,
            },
            Header::new(Algorithm::HS512),
        );

        assert!(validate_token(&token, &config()).is_err());
    }

    #[test]
    fn unknown_role_reads_as_guest() {
        let token = generate_access_token(new_id(), UserRole::Admin, None, &config()).unwrap();
        let mut claims = validate_token(&token, &config()).unwrap();
        claims.role = "superuser".to_string();

        assert_eq!(claims.email, None);
        assert_eq!(claims.user_role(), UserRole::Guest);
    }
}
