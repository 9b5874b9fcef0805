use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::configs::settings::Auth;
use crate::models::User;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub id: String,
    pub token: String,
    pub iat: u64,
    pub exp: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: i32,
    pub iat: u64,
    pub exp: u64,
}

#[derive(Clone)]
pub struct TokenService {
    expiration: u64,
    secret: String,
}

impl TokenService {
    pub fn new(auth: Auth) -> Self {
        Self {
            expiration: auth.expiration,
            secret: auth.secret.clone(),
        }
    }

    /// Decode and validate a token. Signature and expiry failures keep their
    /// distinct `jsonwebtoken` error kinds so callers can tell an expired
    /// session apart from a forged or malformed one.
    pub fn retrieve_token_claims(
        &self,
        token: &str,
    ) -> Result<TokenData<TokenClaims>, jsonwebtoken::errors::Error> {
        decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &Validation::default(),
        )
    }

    pub fn generate_token(&self, user: &User) -> Result<Token, jsonwebtoken::errors::Error> {
        let iat = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("Time went backwards")
            .as_secs();
        let exp = iat + self.expiration;

        let claims = TokenClaims {
            sub: user.id,
            iat,
            exp,
        };

        let encoding_key = EncodingKey::from_secret(self.secret.as_ref());

        let token = encode(&Header::default(), &claims, &encoding_key)?;

        Ok(Token {
            id: claims.sub.to_string(),
            token,
            iat,
            exp,
        })
    }
}
