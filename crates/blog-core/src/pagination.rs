//! Page-number pagination for feeds.
//!
//! Pages are 1-based. An empty feed still has a first (empty) page, and any
//! request past the last page is treated as not found.

use std::str::FromStr;

use serde::Serialize;

use crate::error::DomainError;

/// Fixed feed page size.
pub const POSTS_PER_PAGE: u64 = 10;

/// Requested page, as given in the `page` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageNumber {
    #[default]
    First,
    Number(u64),
    Last,
}

impl FromStr for PageNumber {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "last" {
            return Ok(Self::Last);
        }
        match s.parse::<u64>() {
            Ok(0) | Err(_) => Err(DomainError::not_found("page", s)),
            Ok(1) => Ok(Self::First),
            Ok(n) => Ok(Self::Number(n)),
        }
    }
}

impl PageNumber {
    /// Parse an optional query value; a missing value means the first page.
    pub fn parse(raw: Option<&str>) -> Result<Self, DomainError> {
        raw.map_or(Ok(Self::First), |s| s.parse())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: PageNumber,
    pub per_page: u64,
}

impl PageRequest {
    pub fn new(number: PageNumber) -> Self {
        Self {
            number,
            per_page: POSTS_PER_PAGE,
        }
    }

    pub fn total_pages(&self, total_items: u64) -> u64 {
        total_items.div_ceil(self.per_page).max(1)
    }

    /// Resolve to a 1-based page number, or `None` if past the end.
    pub fn resolve(&self, total_items: u64) -> Option<u64> {
        let total_pages = self.total_pages(total_items);
        match self.number {
            PageNumber::First => Some(1),
            PageNumber::Last => Some(total_pages),
            PageNumber::Number(n) if n <= total_pages => Some(n),
            PageNumber::Number(_) => None,
        }
    }

    /// Cut one page out of an already ordered list.
    pub fn slice<T>(&self, items: Vec<T>) -> Option<Page<T>> {
        let total_items = items.len() as u64;
        let number = self.resolve(total_items)?;
        let offset = ((number - 1) * self.per_page) as usize;
        let items = items
            .into_iter()
            .skip(offset)
            .take(self.per_page as usize)
            .collect();
        Some(Page {
            items,
            number,
            per_page: self.per_page,
            total_items,
            total_pages: self.total_pages(total_items),
        })
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(PageNumber::First)
    }
}

/// One page of a feed.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub per_page: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            per_page: self.per_page,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}
