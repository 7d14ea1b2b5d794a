//! Pagination types for windowed query results.
//!
//! This module provides [`PageRequest`] for specifying a pagination window
//! and [`Page`] for the materialized result of one window. Unlike the lazy
//! row streams of unpaged selects, a page is a closed, finite snapshot.

use serde::{Deserialize, Serialize};

use crate::error::{TemplateError, TemplateResult};

/// Total result count across all pages, as reported by the store.
///
/// Stores that cannot report a total say so explicitly; an unknown total is
/// never silently reported as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TotalElements {
    /// The store reported an exact total.
    Known(u64),
    /// The store cannot report a total for this query.
    Unknown,
}

impl TotalElements {
    /// Returns the total if the store reported one.
    pub fn known(&self) -> Option<u64> {
        match self {
            TotalElements::Known(total) => Some(*total),
            TotalElements::Unknown => None,
        }
    }
}

/// A validated request for one pagination window.
///
/// Pages are 1-indexed and sizes must be positive; both are enforced at
/// construction so an invalid window cannot reach the store.
///
/// # Example
///
/// ```ignore
/// use docmap::page::PageRequest;
///
/// let request = PageRequest::new(2, 50)?;
/// assert_eq!(request.offset(), 50);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: u64,
    size: u64,
}

impl PageRequest {
    /// Creates a pagination request.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::InvalidArgument`] if `page` is zero (pages
    /// are 1-indexed) or `size` is zero.
    pub fn new(page: u64, size: u64) -> TemplateResult<Self> {
        if page == 0 {
            return Err(TemplateError::InvalidArgument(
                "page numbers are 1-indexed; page 0 is not a valid page".to_string(),
            ));
        }
        if size == 0 {
            return Err(TemplateError::InvalidArgument(
                "page size must be greater than zero".to_string(),
            ));
        }

        Ok(Self { page, size })
    }

    /// Returns the 1-indexed page number.
    pub fn page(&self) -> u64 {
        self.page
    }

    /// Returns the number of items per page.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Returns the number of rows to skip for this window.
    ///
    /// Saturates at `u64::MAX` rather than overflowing for extreme windows.
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.size)
    }

    /// Returns the request for the following page.
    pub fn next(&self) -> Self {
        Self { page: self.page + 1, size: self.size }
    }
}

/// A single materialized page of results.
///
/// Holds a snapshot copy of the result entities for one window plus the
/// metadata needed to retrieve the neighboring windows. Immutable once
/// returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// The items in this window, at most the requested page size.
    pub items: Vec<T>,
    /// The 1-indexed page number of this window.
    pub page: u64,
    /// The requested page size.
    pub size: u64,
    /// Total count across all pages, if the store reported it.
    pub total_elements: TotalElements,
    /// The next page number, if more results may exist.
    pub next_page: Option<u64>,
    /// The previous page number, if this is not the first page.
    pub previous_page: Option<u64>,
}

impl<T> Page<T> {
    /// Assembles a page from a window of items and the request it answers.
    ///
    /// The next-page pointer is present when the window came back full and
    /// the total (when known) says more rows remain; with an unknown total a
    /// full window is assumed continuable.
    pub fn from_window(items: Vec<T>, request: PageRequest, total: TotalElements) -> Self {
        let window_full = items.len() as u64 == request.size();
        let next_page = match total {
            TotalElements::Known(total) => {
                let consumed = request.offset() + items.len() as u64;
                (window_full && consumed < total).then(|| request.page() + 1)
            }
            TotalElements::Unknown => window_full.then(|| request.page() + 1),
        };

        Self {
            items,
            page: request.page(),
            size: request.size(),
            total_elements: total,
            next_page,
            previous_page: (request.page() > 1).then(|| request.page() - 1),
        }
    }

    /// Returns whether this page holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of items in this page.
    pub fn len(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_page_and_zero_size_are_rejected() {
        assert!(matches!(
            PageRequest::new(0, 10),
            Err(TemplateError::InvalidArgument(_))
        ));
        assert!(matches!(
            PageRequest::new(1, 0),
            Err(TemplateError::InvalidArgument(_))
        ));
    }

    #[test]
    fn offset_follows_one_indexed_pages() {
        let request = PageRequest::new(3, 20).unwrap();
        assert_eq!(request.offset(), 40);
        assert_eq!(request.next().page(), 4);
    }

    #[test]
    fn extreme_windows_saturate_instead_of_overflowing() {
        let request = PageRequest::new(u64::MAX, u64::MAX).unwrap();
        assert_eq!(request.offset(), u64::MAX);
    }

    #[test]
    fn full_window_with_known_remainder_points_to_next_page() {
        let request = PageRequest::new(1, 2).unwrap();
        let page = Page::from_window(vec![1, 2], request, TotalElements::Known(3));

        assert_eq!(page.next_page, Some(2));
        assert_eq!(page.previous_page, None);
    }

    #[test]
    fn exact_final_window_has_no_next_page() {
        let request = PageRequest::new(2, 2).unwrap();
        let page = Page::from_window(vec![3, 4], request, TotalElements::Known(4));

        assert_eq!(page.next_page, None);
        assert_eq!(page.previous_page, Some(1));
    }

    #[test]
    fn unknown_total_is_explicit_not_zero() {
        let request = PageRequest::new(1, 5).unwrap();
        let page = Page::from_window(vec![1], request, TotalElements::Unknown);

        assert_eq!(page.total_elements.known(), None);
        assert_eq!(page.next_page, None);
    }
}
