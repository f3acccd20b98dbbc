//! Form binding and field-level validation for posts and tags.
//!
//! Forms hold the raw submitted strings so a rejected submission can be
//! rendered back unchanged. `clean` performs the checks that need no storage
//! access; the resource services add the storage-backed ones (tag existence,
//! slug uniqueness) to the same [`FieldErrors`].

use std::collections::BTreeMap;

use serde::Deserialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::posts::{
    POST_SLUG_MAX, POST_TITLE_MAX, TAG_SLUG_MAX, TAG_TITLE_MAX, format_for_form, parse_pub_date,
};
use crate::domain::slug::{is_reserved_slug, is_storable, is_valid_slug};

pub const REQUIRED: &str = "This field is required.";
pub const SLUG_TAKEN: &str = "This address is already taken. Please choose another.";
pub const SLUG_CHARSET: &str =
    "Enter a valid slug consisting of letters, numbers, underscores or hyphens.";
pub const NUL_CHARACTER: &str = "Null characters are not allowed.";

/// Validation messages keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: BTreeMap<&'static str, Vec<String>>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.errors.keys().copied()
    }

    pub fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub pub_date: String,
}

/// A post submission that passed the storage-independent checks.
#[derive(Debug, Clone, PartialEq)]
pub struct PostDraft {
    pub title: String,
    /// `None` when the author left the slug empty.
    pub slug: Option<String>,
    pub body: String,
    pub tag_ids: Vec<Uuid>,
    /// `None` when the author left the publish date empty.
    pub pub_date: Option<OffsetDateTime>,
}

impl PostForm {
    pub fn from_parts(
        title: &str,
        slug: &str,
        body: &str,
        tag_ids: &[Uuid],
        pub_date: OffsetDateTime,
    ) -> Self {
        Self {
            title: title.to_string(),
            slug: slug.to_string(),
            body: body.to_string(),
            tags: tag_ids.iter().map(Uuid::to_string).collect(),
            pub_date: format_for_form(pub_date),
        }
    }

    pub fn has_tag(&self, id: &Uuid) -> bool {
        let id = id.to_string();
        self.tags.iter().any(|value| value.trim() == id)
    }

    pub fn clean(&self) -> Result<PostDraft, FieldErrors> {
        let mut errors = FieldErrors::new();

        let title = clean_title(&self.title, POST_TITLE_MAX, &mut errors);
        let slug = clean_slug(&self.slug, POST_SLUG_MAX, &mut errors);
        if !is_storable(&self.body) {
            errors.add("body", NUL_CHARACTER);
        }

        let mut tag_ids = Vec::with_capacity(self.tags.len());
        for raw in self.tags.iter().map(|value| value.trim()) {
            if raw.is_empty() {
                continue;
            }
            match Uuid::parse_str(raw) {
                Ok(id) if !tag_ids.contains(&id) => tag_ids.push(id),
                Ok(_) => {}
                Err(_) => errors.add(
                    "tags",
                    format!("Select a valid choice. {raw} is not one of the available choices."),
                ),
            }
        }

        let pub_date = if self.pub_date.trim().is_empty() {
            None
        } else {
            match parse_pub_date(&self.pub_date) {
                Ok(value) => Some(value),
                Err(_) => {
                    errors.add("pub_date", "Enter a valid date/time.");
                    None
                }
            }
        };

        errors.into_result(PostDraft {
            title,
            slug,
            body: self.body.clone(),
            tag_ids,
            pub_date,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TagForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagDraft {
    pub title: String,
    pub slug: Option<String>,
}

impl TagForm {
    pub fn from_parts(title: &str, slug: &str) -> Self {
        Self {
            title: title.to_string(),
            slug: slug.to_string(),
        }
    }

    pub fn clean(&self) -> Result<TagDraft, FieldErrors> {
        let mut errors = FieldErrors::new();
        let title = clean_title(&self.title, TAG_TITLE_MAX, &mut errors);
        let slug = clean_slug(&self.slug, TAG_SLUG_MAX, &mut errors);
        errors.into_result(TagDraft { title, slug })
    }
}

fn clean_title(raw: &str, max: usize, errors: &mut FieldErrors) -> String {
    let title = raw.trim();
    if title.is_empty() {
        errors.add("title", REQUIRED);
    } else if !is_storable(title) {
        errors.add("title", NUL_CHARACTER);
    } else if title.chars().count() > max {
        errors.add("title", too_long(max, title));
    }
    title.to_string()
}

/// Lower-cases the slug and applies the charset, length and reserved-word rules.
fn clean_slug(raw: &str, max: usize, errors: &mut FieldErrors) -> Option<String> {
    let slug = raw.trim().to_lowercase();
    if slug.is_empty() {
        return None;
    }
    if !is_storable(&slug) {
        errors.add("slug", NUL_CHARACTER);
    } else if !is_valid_slug(&slug) {
        errors.add("slug", SLUG_CHARSET);
    } else if slug.chars().count() > max {
        errors.add("slug", too_long(max, &slug));
    } else if is_reserved_slug(&slug) {
        errors.add("slug", SLUG_TAKEN);
    }
    Some(slug)
}

fn too_long(max: usize, value: &str) -> String {
    format!(
        "Ensure this value has at most {max} characters (it has {}).",
        value.chars().count()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post_form(title: &str, slug: &str) -> PostForm {
        PostForm {
            title: title.to_string(),
            slug: slug.to_string(),
            ..PostForm::default()
        }
    }

    #[test]
    fn post_title_is_required() {
        let errors = post_form("   ", "").clean().expect_err("blank title");
        assert_eq!(errors.get("title"), [REQUIRED.to_string()]);
    }

    #[test]
    fn post_slug_is_lowercased() {
        let draft = post_form("Hello", "My-Slug").clean().expect("valid");
        assert_eq!(draft.slug.as_deref(), Some("my-slug"));
        assert_eq!(draft.pub_date, None);
        assert!(draft.tag_ids.is_empty());
    }

    #[test]
    fn reserved_slug_is_rejected_in_any_case() {
        for slug in ["create", "Create", "CREATE"] {
            let errors = post_form("Hello", slug).clean().expect_err("reserved");
            assert_eq!(errors.get("slug"), [SLUG_TAKEN.to_string()]);
        }
        let errors = TagForm::from_parts("Hello", "Create")
            .clean()
            .expect_err("reserved");
        assert!(errors.has("slug"));
    }

    #[test]
    fn empty_slug_is_left_for_generation() {
        let draft = TagForm::from_parts("Rust", "  ").clean().expect("valid");
        assert_eq!(draft.slug, None);
    }

    #[test]
    fn slug_charset_is_enforced() {
        let errors = post_form("Hello", "hello world").clean().expect_err("space");
        assert_eq!(errors.get("slug"), [SLUG_CHARSET.to_string()]);
    }

    #[test]
    fn tag_title_limit_counts_characters() {
        let ok = "я".repeat(TAG_TITLE_MAX);
        assert!(TagForm::from_parts(&ok, "").clean().is_ok());

        let long = "я".repeat(TAG_TITLE_MAX + 1);
        let errors = TagForm::from_parts(&long, "").clean().expect_err("too long");
        assert!(errors.has("title"));
    }

    #[test]
    fn tags_and_pub_date_are_parsed() {
        let id = Uuid::new_v4();
        let form = PostForm {
            title: "Hello".to_string(),
            tags: vec![id.to_string(), id.to_string(), String::new()],
            pub_date: "2024-03-09T08:15".to_string(),
            ..PostForm::default()
        };
        let draft = form.clean().expect("valid");
        assert_eq!(draft.tag_ids, vec![id]);
        assert_eq!(draft.pub_date, Some(time::macros::datetime!(2024-03-09 08:15 UTC)));
        assert!(form.has_tag(&id));
    }

    #[test]
    fn malformed_tag_and_date_are_collected() {
        let form = PostForm {
            title: "Hello".to_string(),
            tags: vec!["nope".to_string()],
            pub_date: "tomorrow".to_string(),
            ..PostForm::default()
        };
        let errors = form.clean().expect_err("invalid");
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["pub_date", "tags"]);
    }

    #[test]
    fn nul_characters_are_field_errors() {
        let form = PostForm {
            title: "a\0b".to_string(),
            slug: "x\0".to_string(),
            body: "body\0".to_string(),
            ..PostForm::default()
        };
        let errors = form.clean().expect_err("nul");
        for field in ["title", "slug", "body"] {
            assert_eq!(errors.get(field), [NUL_CHARACTER.to_string()], "{field}");
        }

        let errors = TagForm::from_parts("t\0", "").clean().expect_err("nul");
        assert_eq!(errors.get("title"), [NUL_CHARACTER.to_string()]);
    }
}
