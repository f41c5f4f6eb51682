//! Personal access token format.
//!
//! A plaintext token is `<token id>|<80 hex chars>`. Only the SHA-256 digest
//! of the secret half is persisted.

use argon2::password_hash::rand_core::{OsRng, RngCore};
use chrono::Utc;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::models::PersonalAccessToken;

const SECRET_BYTES: usize = 40;

/// A freshly minted token: the row to store and the plaintext to hand out.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub record: PersonalAccessToken,
    pub plaintext: String,
}

pub fn issue(user_id: Uuid, name: &str) -> IssuedToken {
    let mut secret = [0u8; SECRET_BYTES];
    OsRng.fill_bytes(&mut secret);
    let secret = const_hex::encode(secret);

    let record = PersonalAccessToken {
        id: Uuid::now_v7(),
        user_id,
        name: name.to_string(),
        token_hash: digest(&secret),
        last_used_at: None,
        created_at: Utc::now(),
    };
    let plaintext = format!("{}|{}", record.id, secret);

    IssuedToken { record, plaintext }
}

/// SHA-256 of `secret` as lower-case hex.
pub fn digest(secret: &str) -> String {
    const_hex::encode(Sha256::digest(secret.as_bytes()))
}

/// Whether `secret` hashes to `stored_hash`, compared in constant time.
pub fn verify(secret: &str, stored_hash: &str) -> bool {
    digest(secret).as_bytes().ct_eq(stored_hash.as_bytes()).into()
}

/// Split a plaintext token into its id (when present and well-formed) and
/// secret.
pub fn parse(plaintext: &str) -> (Option<Uuid>, &str) {
    match plaintext.split_once('|') {
        Some((id, secret)) => (Uuid::parse_str(id).ok(), secret),
        None => (None, plaintext),
    }
}
