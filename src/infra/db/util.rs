use sqlx::error::ErrorKind;

use crate::application::repos::RepoError;

/// Translate driver errors into repository errors.
///
/// Unique violations keep the constraint name so callers can tell a slug
/// collision apart from other failures.
pub fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    match err {
        sqlx::Error::RowNotFound => RepoError::NotFound,
        sqlx::Error::PoolTimedOut => RepoError::Timeout,
        sqlx::Error::Database(db) => classify_database_error(
            db.kind(),
            db.code().as_deref(),
            db.message(),
            db.constraint(),
        ),
        other => RepoError::from_persistence(other),
    }
}

/// SQLSTATE codes for text the server cannot encode (NUL bytes included).
const UNENCODABLE_TEXT_CODES: [&str; 2] = ["22021", "22P05"];

fn classify_database_error(
    kind: ErrorKind,
    code: Option<&str>,
    message: &str,
    constraint: Option<&str>,
) -> RepoError {
    match kind {
        ErrorKind::UniqueViolation => RepoError::Duplicate {
            constraint: constraint.unwrap_or("unknown").to_string(),
        },
        ErrorKind::ForeignKeyViolation => RepoError::InvalidInput {
            message: message.to_string(),
        },
        ErrorKind::CheckViolation | ErrorKind::NotNullViolation => RepoError::Integrity {
            message: message.to_string(),
        },
        _ if code.is_some_and(|code| UNENCODABLE_TEXT_CODES.contains(&code))
            || message.contains("invalid input syntax") =>
        {
            RepoError::InvalidInput {
                message: message.to_string(),
            }
        }
        _ if message.contains("canceling statement due to user request") => RepoError::Timeout,
        _ => RepoError::from_persistence(message),
    }
}
