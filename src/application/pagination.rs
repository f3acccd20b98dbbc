//! Page-number pagination helpers.
//!
//! Bad input never fails: a page value that is not an integer resolves to the
//! first page, and any integer outside `1..=num_pages` resolves to the last,
//! including integers too large to parse.

use std::num::{IntErrorKind, NonZeroU32};

use url::form_urlencoded;

use crate::application::search::SearchQuery;

/// Offset/limit slice handed to repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    total: u64,
    per_page: u64,
}

impl Paginator {
    pub fn new(total: u64, per_page: NonZeroU32) -> Self {
        Self {
            total,
            per_page: u64::from(per_page.get()),
        }
    }

    /// An empty collection still has one (empty) page.
    pub fn num_pages(&self) -> u64 {
        self.total.div_ceil(self.per_page).max(1)
    }

    pub fn resolve(&self, raw: Option<&str>) -> u64 {
        let Some(raw) = raw else {
            return 1;
        };
        match raw.trim().parse::<i64>() {
            Ok(number) if number >= 1 && (number as u64) <= self.num_pages() => number as u64,
            Ok(_) => self.num_pages(),
            Err(err)
                if matches!(
                    err.kind(),
                    IntErrorKind::PosOverflow | IntErrorKind::NegOverflow
                ) =>
            {
                self.num_pages()
            }
            Err(_) => 1,
        }
    }

    pub fn window(&self, number: u64) -> PageWindow {
        PageWindow {
            offset: (number.saturating_sub(1)).saturating_mul(self.per_page),
            limit: self.per_page,
        }
    }

    pub fn page<T>(&self, number: u64, items: Vec<T>) -> Page<T> {
        Page {
            items,
            number,
            num_pages: self.num_pages(),
            total: self.total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn is_paginated(&self) -> bool {
        self.num_pages > 1
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }
}

/// Prev/next query strings for a page, carrying the active search term.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageLinks {
    pub previous: String,
    pub next: String,
}

impl PageLinks {
    pub fn for_page<T>(page: &Page<T>, search: &SearchQuery) -> Self {
        let previous = if page.has_previous() {
            page_link(page.number - 1, search)
        } else {
            String::new()
        };
        let next = if page.has_next() {
            page_link(page.number + 1, search)
        } else {
            String::new()
        };
        Self { previous, next }
    }
}

pub fn page_link(number: u64, search: &SearchQuery) -> String {
    match search.term() {
        Some(term) => {
            let encoded: String = form_urlencoded::byte_serialize(term.as_bytes()).collect();
            format!("?page={number}&search={encoded}")
        }
        None => format!("?page={number}"),
    }
}
