//! Utilities for generating URL-safe, collision-resistant slugs.
//!
//! The helpers here bridge ASCII slugification (`slug` crate) with Chinese
//! transliteration (`pinyin` crate) so inputs like “基线对齐” become
//! `ji-xian-dui-qi`. Generated slugs carry the Unix timestamp of the save as a
//! suffix, so the same title saved twice produces two distinct slugs. Callers
//! provide their own uniqueness predicate to avoid persistence conflicts while
//! keeping the slug generation logic pure.

use std::future::Future;

use pinyin::{Pinyin, ToPinyin};
use slug::slugify;
use thiserror::Error;

const MAX_SUFFIX_ATTEMPTS: usize = 32;

/// Slug that would collide with the `create` routes of every resource.
pub const RESERVED_SLUG: &str = "create";

/// Errors that can occur while generating a slug.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
    #[error("exhausted attempts to find a unique slug for `{base}`")]
    Exhausted { base: String },
}

/// Errors that can occur while generating a slug via an async uniqueness check.
#[derive(Debug, Error)]
pub enum SlugAsyncError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    #[error(transparent)]
    Slug(#[from] SlugError),
    #[error(transparent)]
    Predicate(E),
}

/// Inputs for a timestamped slug.
#[derive(Debug, Clone, Copy)]
pub struct SlugSpec<'a> {
    /// Human-readable title the slug is derived from.
    pub title: &'a str,
    /// Used as the base when the title has no representable characters.
    pub fallback: &'a str,
    /// Unix timestamp (seconds) appended to the base.
    pub timestamp: i64,
    /// Maximum length of the final slug, suffixes included.
    pub max_len: usize,
}

/// Derive a base slug from the provided human-readable text.
pub fn derive_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let transliterated = transliterate_to_ascii(input);
    let candidate = slugify(&transliterated);

    if candidate.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    Ok(candidate)
}

/// Derive `<title-slug>-<timestamp>`, trimmed to fit `spec.max_len`.
///
/// Titles that produce no slug characters fall back to `spec.fallback`.
pub fn timestamped_slug(spec: SlugSpec<'_>) -> String {
    let base = match derive_slug(spec.title) {
        Ok(base) => base,
        Err(_) => spec.fallback.to_string(),
    };
    let suffix = format!("-{}", spec.timestamp);
    // Leave room for a `-NN` collision counter.
    let budget = spec.max_len.saturating_sub(suffix.len() + 3);
    let base = truncate_at_hyphen(&base, budget);

    if base.is_empty() {
        spec.timestamp.to_string()
    } else {
        format!("{base}{suffix}")
    }
}

/// Whether the slug is the reserved literal (case-insensitive).
pub fn is_reserved_slug(slug: &str) -> bool {
    slug.trim().eq_ignore_ascii_case(RESERVED_SLUG)
}

/// Whether every character is one of `[a-z0-9_-]`.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}

/// Whether the text can be stored in, or matched against, a Postgres `text`
/// column, which rejects NUL characters.
pub fn is_storable(value: &str) -> bool {
    !value.contains('\0')
}

/// Produce a timestamped slug that the supplied predicate reports as unused.
///
/// `is_unique` resolves to `true` when no stored entity holds the candidate.
/// On collision a counter is appended (`-2`, `-3`, …) up to a fixed bound.
pub async fn generate_unique_slug<F, Fut, E>(
    spec: SlugSpec<'_>,
    mut is_unique: F,
) -> Result<String, SlugAsyncError<E>>
where
    F: FnMut(&str) -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let base = timestamped_slug(spec);

    if is_unique(&base).await.map_err(SlugAsyncError::Predicate)? {
        return Ok(base);
    }

    for attempt in 2..=MAX_SUFFIX_ATTEMPTS + 1 {
        let candidate = format!("{base}-{attempt}");
        if is_unique(&candidate)
            .await
            .map_err(SlugAsyncError::Predicate)?
        {
            return Ok(candidate);
        }
    }

    Err(SlugAsyncError::Slug(SlugError::Exhausted { base }))
}

fn truncate_at_hyphen(base: &str, budget: usize) -> &str {
    if base.len() <= budget {
        return base;
    }
    // slugify output is ASCII, so byte slicing is safe.
    let cut = &base[..budget];
    match cut.rfind('-') {
        Some(index) if index > 0 => &cut[..index],
        _ => cut.trim_end_matches('-'),
    }
}

fn transliterate_to_ascii(input: &str) -> String {
    let mut output = String::with_capacity(input.len());

    for ch in input.chars() {
        if ch.is_ascii() {
            output.push(ch);
            continue;
        }

        match ch.to_pinyin() {
            Some(py) => append_pinyin(&mut output, py),
            None if ch.is_whitespace() => output.push(' '),
            None => {
                // Preserve unhandled characters so slugify can decide how to filter them.
                output.push(ch);
            }
        }
    }

    output
}

fn append_pinyin(buffer: &mut String, pinyin: Pinyin) {
    if !buffer.is_empty() && !buffer.ends_with(' ') {
        buffer.push(' ');
    }
    buffer.push_str(pinyin.plain());
}
