use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::entities::PostRecord;

pub(super) const POST_COLUMNS: &str =
    "p.id, p.slug, p.title, p.body, p.pub_date, p.created_at, p.updated_at";

#[derive(sqlx::FromRow)]
pub(crate) struct PostRow {
    pub(crate) id: Uuid,
    pub(crate) slug: String,
    pub(crate) title: String,
    pub(crate) body: String,
    pub(crate) pub_date: OffsetDateTime,
    pub(crate) created_at: OffsetDateTime,
    pub(crate) updated_at: OffsetDateTime,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            title: row.title,
            body: row.body,
            pub_date: row.pub_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
