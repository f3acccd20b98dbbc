//! Domain entities mirrored from persistent storage.

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::posts;

/// Entities that own a single well-defined detail path.
///
/// Saving an entity redirects here; update and delete paths hang off it.
pub trait CanonicalLocation {
    /// Path segment shared by every location of this entity kind.
    const COLLECTION: &'static str;

    fn slug(&self) -> &str;

    fn canonical_location(&self) -> String {
        format!("/{}/{}/", Self::COLLECTION, self.slug())
    }

    fn update_location(&self) -> String {
        format!("{}update/", self.canonical_location())
    }

    fn delete_location(&self) -> String {
        format!("{}delete/", self.canonical_location())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRecord {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub body: String,
    pub pub_date: OffsetDateTime,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl PostRecord {
    pub fn is_published_at(&self, now: OffsetDateTime) -> bool {
        posts::is_published_at(self.pub_date, now)
    }

    pub fn was_published_recently(&self, now: OffsetDateTime) -> bool {
        posts::was_published_recently(self.pub_date, now)
    }
}

impl CanonicalLocation for PostRecord {
    const COLLECTION: &'static str = "post";

    fn slug(&self) -> &str {
        &self.slug
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagRecord {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl CanonicalLocation for TagRecord {
    const COLLECTION: &'static str = "tags";

    fn slug(&self) -> &str {
        &self.slug
    }
}

/// Stored author credential. Only the SHA-256 digest of the secret is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorKeyRecord {
    pub id: Uuid,
    pub name: String,
    pub prefix: String,
    pub hashed_secret: Vec<u8>,
    pub created_at: OffsetDateTime,
    pub last_used_at: Option<OffsetDateTime>,
    pub revoked_at: Option<OffsetDateTime>,
}

impl AuthorKeyRecord {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }
}
