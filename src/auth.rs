use std::sync::OnceLock;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::Rng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::db::{self, DbPool};
use crate::error::AppError;
use crate::models::{AccessToken, ObjectId};

const TOKEN_NAME: &str = "API TOKEN";
const TOKEN_ENTROPY_LEN: usize = 40;

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let mut salt_bytes = [0u8; 16];
    rand::rng().fill(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|err| AppError::Internal(format!("salt encoding failed: {err}")))?;
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AppError::Internal(format!("password hashing failed: {err}")))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

fn dummy_hash() -> Option<&'static str> {
    static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();
    DUMMY_HASH
        .get_or_init(|| hash_password("not a real password").ok())
        .as_deref()
}

/// Spend the same argon2 work as a real check when there is no stored hash,
/// so unknown emails are not told apart by response time.
pub fn verify_dummy_password(password: &str) {
    if let Some(hash) = dummy_hash() {
        let _ = verify_password(password, hash);
    }
}

/// A freshly generated token secret and the digest that gets stored.
pub struct GeneratedToken {
    pub plain: String,
    pub hash: String,
}

/// Random alphanumeric entropy followed by its CRC32 as 8 hex digits.
pub fn generate_token() -> GeneratedToken {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    let entropy: String = (0..TOKEN_ENTROPY_LEN)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect();

    let plain = format!("{entropy}{:08x}", crc32fast::hash(entropy.as_bytes()));
    let hash = hash_token(&plain);
    GeneratedToken { plain, hash }
}

pub fn hash_token(plain: &str) -> String {
    hex::encode(Sha256::digest(plain.as_bytes()))
}

/// Constant-time comparison of a stored digest against a presented secret.
pub fn token_matches(stored_hash: &str, presented: &str) -> bool {
    let presented_hash = hash_token(presented);
    stored_hash.as_bytes().ct_eq(presented_hash.as_bytes()).into()
}

/// Split `<tokenId>|<secret>`. Anything else yields `None`.
pub fn split_token(presented: &str) -> Option<(ObjectId, &str)> {
    let (id, secret) = presented.split_once('|')?;
    if secret.is_empty() || secret.contains('|') {
        return None;
    }
    Some((id.parse().ok()?, secret))
}

/// Resolve a presented bearer token to its stored record.
///
/// Every malformed or unknown token yields `Ok(None)`; only storage failures
/// are errors.
pub fn verify_token(pool: &DbPool, presented: &str) -> Result<Option<AccessToken>, AppError> {
    let Some((token_id, secret)) = split_token(presented) else {
        return Ok(None);
    };

    let Some(token) = db::find_token(pool, &token_id)? else {
        return Ok(None);
    };

    if token_matches(&token.token, secret) {
        Ok(Some(token))
    } else {
        Ok(None)
    }
}

/// Replace every token the user holds with a new one and return the client
/// form `<tokenId>|<secret>`.
pub fn issue_token(pool: &DbPool, user_id: &ObjectId) -> Result<String, AppError> {
    let generated = generate_token();
    let token = AccessToken {
        id: ObjectId::new(),
        name: TOKEN_NAME.to_string(),
        token: generated.hash,
        user_id: *user_id,
        created_at: crate::models::now(),
    };

    db::replace_user_tokens(pool, &token)?;
    Ok(format!("{}|{}", token.id, generated.plain))
}
