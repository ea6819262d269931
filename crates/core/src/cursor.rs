//! Page cursors and pagination arithmetic
//!
//! Two loading strategies share one cursor type: replace mode walks 1-based
//! pages (`skip = (page - 1) * limit`), append mode accumulates everything
//! fetched so far (`skip = count`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Companies shown per page in the listing grid
pub const DEFAULT_PAGE_SIZE: usize = 9;

/// How a fetched page is merged into the visible result set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadMode {
    /// Classic pagination: each page replaces the visible set
    #[default]
    Replace,
    /// Infinite scroll: each page is appended to the visible set
    Append,
}

impl fmt::Display for LoadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadMode::Replace => f.write_str("replace"),
            LoadMode::Append => f.write_str("append"),
        }
    }
}

impl FromStr for LoadMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "replace" | "pages" => Ok(LoadMode::Replace),
            "append" | "scroll" => Ok(LoadMode::Append),
            other => Err(format!(
                "Invalid load mode: {other}. Valid modes: replace, append"
            )),
        }
    }
}

/// Position of the next fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PageCursor {
    Page { page: usize, limit: usize },
    Accumulated { count: usize, limit: usize },
}

impl PageCursor {
    /// Cursor a fresh listing (or a listing whose filter just changed) starts from
    pub fn initial(mode: LoadMode, limit: usize) -> Self {
        match mode {
            LoadMode::Replace => PageCursor::Page { page: 1, limit },
            LoadMode::Append => PageCursor::Accumulated { count: 0, limit },
        }
    }

    pub fn skip(&self) -> usize {
        match *self {
            PageCursor::Page { page, limit } => page_skip(page, limit).unwrap_or(usize::MAX),
            PageCursor::Accumulated { count, .. } => count,
        }
    }

    pub fn limit(&self) -> usize {
        match *self {
            PageCursor::Page { limit, .. } | PageCursor::Accumulated { limit, .. } => limit,
        }
    }

    /// 1-based page number, only meaningful in replace mode
    pub fn page(&self) -> Option<usize> {
        match *self {
            PageCursor::Page { page, .. } => Some(page),
            PageCursor::Accumulated { .. } => None,
        }
    }

    pub fn is_initial(&self) -> bool {
        self.skip() == 0
    }
}

/// Errors produced when validating a requested page
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    #[error("Pages are numbered from 1")]
    Zero,

    #[error("Page {page} is out of range. Only {page_count} pages available.")]
    OutOfRange { page: usize, page_count: usize },

    #[error("Page {page} is out of range for {limit} companies per page")]
    TooLarge { page: usize, limit: usize },
}

/// Offset of the first item on `page`, `None` when it does not fit in a `usize`
pub fn page_skip(page: usize, limit: usize) -> Option<usize> {
    page.saturating_sub(1).checked_mul(limit)
}

/// Number of pages needed to show `total` items, `limit` at a time
pub fn page_count(total: usize, limit: usize) -> usize {
    if limit == 0 {
        return 0;
    }
    total.div_ceil(limit)
}

/// The page control is only rendered when there is more than one page
pub fn pagination_visible(total: usize, limit: usize) -> bool {
    total > limit
}

/// Check `page` against `[1, page_count]`
///
/// An unknown page count (the backend sent no total) only enforces the lower bound
/// and that the page's offset is representable.
pub fn validate_page(
    page: usize,
    limit: usize,
    page_count: Option<usize>,
) -> Result<usize, PageError> {
    if page == 0 {
        return Err(PageError::Zero);
    }
    if page_skip(page, limit).is_none() {
        return Err(PageError::TooLarge { page, limit });
    }

    match page_count {
        Some(page_count) if page > page_count => Err(PageError::OutOfRange { page, page_count }),
        _ => Ok(page),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_cursor_starts_at_zero() {
        assert_eq!(PageCursor::initial(LoadMode::Replace, 9).skip(), 0);
        assert_eq!(PageCursor::initial(LoadMode::Append, 20).skip(), 0);
        assert_eq!(PageCursor::initial(LoadMode::Replace, 9).page(), Some(1));
        assert_eq!(PageCursor::initial(LoadMode::Append, 20).page(), None);
    }

    #[test]
    fn test_page_translates_to_skip() {
        let cursor = PageCursor::Page { page: 3, limit: 9 };
        assert_eq!(cursor.skip(), 18);
        assert_eq!(cursor.limit(), 9);
    }

    #[test]
    fn test_accumulated_skip_is_count() {
        let cursor = PageCursor::Accumulated {
            count: 30,
            limit: 10,
        };
        assert_eq!(cursor.skip(), 30);
        assert!(!cursor.is_initial());
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(25, 9), 3);
        assert_eq!(page_count(27, 9), 3);
        assert_eq!(page_count(28, 9), 4);
        assert_eq!(page_count(0, 9), 0);
        assert_eq!(page_count(10, 0), 0);
    }

    #[test]
    fn test_pagination_hidden_for_single_page() {
        assert!(!pagination_visible(9, 9));
        assert!(!pagination_visible(3, 9));
        assert!(pagination_visible(10, 9));
    }

    #[test]
    fn test_validate_page() {
        assert_eq!(validate_page(1, 9, Some(3)), Ok(1));
        assert_eq!(validate_page(3, 9, Some(3)), Ok(3));
        assert_eq!(validate_page(0, 9, Some(3)), Err(PageError::Zero));
        assert_eq!(
            validate_page(4, 9, Some(3)),
            Err(PageError::OutOfRange {
                page: 4,
                page_count: 3
            })
        );
        assert_eq!(validate_page(42, 9, None), Ok(42));
    }

    #[test]
    fn test_page_offset_overflow_is_rejected() {
        let page = usize::MAX / 2;
        assert_eq!(
            validate_page(page, 9, None),
            Err(PageError::TooLarge { page, limit: 9 })
        );
        assert_eq!(page_skip(page, 9), None);
        assert_eq!(page_skip(3, 9), Some(18));
        assert_eq!(PageCursor::Page { page, limit: 9 }.skip(), usize::MAX);
    }

    #[test]
    fn test_parse_load_mode() {
        assert_eq!("append".parse::<LoadMode>(), Ok(LoadMode::Append));
        assert_eq!("Replace".parse::<LoadMode>(), Ok(LoadMode::Replace));
        assert!("sideways".parse::<LoadMode>().is_err());
    }
}
