//! Author access keys: issuing, revoking and authenticating tokens.
//!
//! A token reads `bk_<prefix>_<secret>`. The prefix locates the stored key and
//! only a SHA-256 digest of the secret is persisted.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use crate::application::repos::{AuthorKeysRepo, CreateAuthorKeyParams, RepoError};
use crate::domain::entities::AuthorKeyRecord;

const TOKEN_PREFIX: &str = "bk";
const PREFIX_LEN: usize = 12;
const MIN_SECRET_LEN: usize = 32;
const MAX_NAME_LEN: usize = 100;

#[derive(Debug, Error)]
pub enum AuthorKeyError {
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("author name must be between 1 and {MAX_NAME_LEN} characters")]
    InvalidName,
    #[error("no active key with prefix `{0}`")]
    NotFound(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing author token")]
    Missing,
    #[error("invalid author token")]
    Invalid,
    #[error("revoked author token")]
    Revoked,
}

#[derive(Debug, Clone)]
pub struct AuthorKeyIssued {
    pub record: AuthorKeyRecord,
    pub token: String,
}

/// An authenticated author, stored in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorSession {
    pub key_id: Uuid,
    pub name: String,
    pub prefix: String,
}

#[derive(Clone)]
pub struct AuthorKeyService {
    repo: Arc<dyn AuthorKeysRepo>,
}

impl AuthorKeyService {
    pub fn new(repo: Arc<dyn AuthorKeysRepo>) -> Self {
        Self { repo }
    }

    /// Create a key. The returned token is the only copy of the secret.
    pub async fn issue(&self, name: &str) -> Result<AuthorKeyIssued, AuthorKeyError> {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
            return Err(AuthorKeyError::InvalidName);
        }

        let prefix = Self::generate_prefix();
        let secret = Self::generate_secret();
        let token = format!("{TOKEN_PREFIX}_{prefix}_{secret}");

        let record = self
            .repo
            .create_key(CreateAuthorKeyParams {
                name: name.to_string(),
                prefix,
                hashed_secret: Self::hash_secret(&secret),
            })
            .await?;

        info!(
            target = "application::authors::issue",
            key_id = %record.id,
            prefix = %record.prefix,
            "author key issued"
        );
        Ok(AuthorKeyIssued { record, token })
    }

    pub async fn revoke(&self, prefix: &str) -> Result<(), AuthorKeyError> {
        let now = OffsetDateTime::now_utc();
        if !self.repo.revoke_key(prefix, now).await? {
            return Err(AuthorKeyError::NotFound(prefix.to_string()));
        }
        info!(
            target = "application::authors::revoke",
            prefix,
            "author key revoked"
        );
        Ok(())
    }

    pub async fn authenticate(&self, token: &str) -> Result<AuthorSession, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::Missing);
        }
        let parsed = Self::parse_token(token).ok_or(AuthError::Invalid)?;
        let record = self
            .repo
            .find_by_prefix(&parsed.prefix)
            .await
            .map_err(|err| {
                debug!(
                    target = "application::authors::authenticate",
                    error = %err,
                    "author key lookup failed"
                );
                AuthError::Invalid
            })?
            .ok_or(AuthError::Invalid)?;

        if record.is_revoked() {
            return Err(AuthError::Revoked);
        }

        let hashed_input = Self::hash_secret(&parsed.secret);
        if record.hashed_secret.ct_eq(&hashed_input).unwrap_u8() == 0 {
            return Err(AuthError::Invalid);
        }

        // best-effort last_used update; do not block auth
        let repo = self.repo.clone();
        let now = OffsetDateTime::now_utc();
        tokio::spawn(async move {
            let _ = repo.update_last_used(record.id, now).await;
        });

        Ok(AuthorSession {
            key_id: record.id,
            name: record.name,
            prefix: record.prefix,
        })
    }

    fn hash_secret(secret: &str) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(secret.as_bytes());
        hasher.finalize().to_vec()
    }

    fn generate_prefix() -> String {
        Uuid::new_v4().simple().to_string()[..PREFIX_LEN].to_string()
    }

    fn generate_secret() -> String {
        format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
    }

    fn parse_token(token: &str) -> Option<ParsedToken<'_>> {
        let mut parts = token.splitn(3, '_');
        if parts.next()? != TOKEN_PREFIX {
            return None;
        }
        let prefix = parts.next()?;
        let secret = parts.next()?;
        if prefix.len() != PREFIX_LEN || secret.len() < MIN_SECRET_LEN {
            return None;
        }
        Some(ParsedToken { prefix, secret })
    }
}

struct ParsedToken<'a> {
    prefix: &'a str,
    secret: &'a str,
}
