//! Page requests and page results.

use serde::Serialize;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = PageRequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(SortDirection::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(SortDirection::Desc)
        } else {
            Err(PageRequestError::InvalidDirection(s.to_string()))
        }
    }
}

/// A sort key an entity exposes to callers.
pub trait SortField: Copy + Sized {
    fn from_key(key: &str) -> Option<Self>;
    /// Trusted column reference rendered into `ORDER BY`.
    fn column(self) -> &'static str;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageRequestError {
    #[error("direction must be ASC or DESC, got '{0}'")]
    InvalidDirection(String),

    #[error("unknown sort key '{0}'")]
    UnknownSort(String),
}

/// Paging and ordering for one list query.
///
/// `page` is 1-based. Out-of-range values are tolerated: `page < 1` reads from
/// offset 0 and `size <= 0` returns no rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub size: i64,
    /// Overrides the entity's default sort column when set.
    pub sort: Option<&'static str>,
    /// Overrides the entity's default direction when set.
    pub direction: Option<SortDirection>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PAGE, Self::DEFAULT_SIZE)
    }
}

impl PageRequest {
    pub const DEFAULT_PAGE: i64 = 1;
    pub const DEFAULT_SIZE: i64 = 10;

    pub fn new(page: i64, size: i64) -> Self {
        Self {
            page,
            size,
            sort: None,
            direction: None,
        }
    }

    /// Build from raw query parameters, resolving the sort key through `S`.
    pub fn parse<S: SortField>(
        page: Option<i64>,
        size: Option<i64>,
        sort: Option<&str>,
        direction: Option<&str>,
    ) -> Result<Self, PageRequestError> {
        let sort = match sort.filter(|s| !s.is_empty()) {
            Some(key) => Some(
                S::from_key(key)
                    .ok_or_else(|| PageRequestError::UnknownSort(key.to_string()))?
                    .column(),
            ),
            None => None,
        };

        let direction = match direction.filter(|d| !d.is_empty()) {
            Some(d) => Some(d.parse()?),
            None => None,
        };

        Ok(Self {
            page: page.unwrap_or(Self::DEFAULT_PAGE),
            size: size.unwrap_or(Self::DEFAULT_SIZE),
            sort,
            direction,
        })
    }

    pub fn limit(&self) -> i64 {
        self.size.max(0)
    }

    pub fn offset(&self) -> i64 {
        if self.page < 1 || self.size <= 0 {
            0
        } else {
            (self.page - 1).saturating_mul(self.size)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageResult<T> {
    pub content: Vec<T>,
    pub page: i64,
    pub size: i64,
    pub total_elements: i64,
    pub total_pages: i64,
    pub number_of_elements: i64,
    pub is_last: bool,
    pub is_first: bool,
    pub is_empty: bool,
}

impl<T> PageResult<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: i64) -> Self {
        let total_elements = total_elements.max(0);
        let total_pages = Self::total_pages(total_elements, request.size);
        let number_of_elements = content.len() as i64;

        Self {
            content,
            page: request.page,
            size: request.size,
            total_elements,
            total_pages,
            number_of_elements,
            is_last: request.page >= total_pages,
            is_first: request.page <= 1,
            is_empty: number_of_elements == 0,
        }
    }

    /// `ceil(total / size)`, or 1 when `size <= 0`.
    pub fn total_pages(total_elements: i64, size: i64) -> i64 {
        if size <= 0 {
            return 1;
        }
        let total = total_elements.max(0);
        total / size + i64::from(total % size != 0)
    }

    /// Convert the content while keeping the page metadata.
    pub fn try_map<U, E, F>(self, f: F) -> Result<PageResult<U>, E>
    where
        F: FnMut(T) -> Result<U, E>,
    {
        let content = self.content.into_iter().map(f).collect::<Result<Vec<_>, E>>()?;
        Ok(PageResult {
            content,
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            number_of_elements: self.number_of_elements,
            is_last: self.is_last,
            is_first: self.is_first,
            is_empty: self.is_empty,
        })
    }
}
