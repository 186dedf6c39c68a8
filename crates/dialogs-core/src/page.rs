//! Offset pagination arithmetic.
//!
//! Everything here is a pure function of `(start, limit, total)`, so a page
//! envelope can be recomputed on any request without server-side state.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A requested window over an ordered result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
  pub start: usize,
  pub limit: usize,
}

impl PageRequest {
  pub const DEFAULT_LIMIT: usize = 5;
  pub const MAX_LIMIT: usize = 1000;

  pub fn new(start: usize, limit: usize) -> Result<Self> {
    if limit == 0 {
      return Err(Error::ZeroLimit);
    }
    if limit > Self::MAX_LIMIT {
      return Err(Error::LimitTooLarge { limit, max: Self::MAX_LIMIT });
    }
    Ok(Self { start, limit })
  }
}

impl Default for PageRequest {
  fn default() -> Self { Self { start: 0, limit: Self::DEFAULT_LIMIT } }
}

/// Navigation metadata for one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
  /// 1-based page number containing `start`.
  pub page:        usize,
  pub start:       usize,
  pub limit:       usize,
  pub total_pages: usize,
  pub total_items: usize,
  /// Start offset of the following page, if any items remain after this one.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub next:        Option<usize>,
  /// Start offset of the preceding page, present whenever `start > 0`.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub prev:        Option<usize>,
}

impl Pagination {
  /// Defined for every `(start, limit, total)`, including windows that reach
  /// past `usize::MAX`. A zero limit is treated as one.
  pub fn compute(request: PageRequest, total: usize) -> Self {
    let PageRequest { start, limit } = request;
    let step = limit.max(1);
    let next = start.checked_add(limit).filter(|&end| end < total);
    let prev = (start > 0).then(|| start.saturating_sub(limit));
    Self {
      page: (start / step).saturating_add(1),
      start,
      limit,
      total_pages: total.div_ceil(step),
      total_items: total,
      next,
      prev,
    }
  }

  /// Like [`Pagination::compute`], but rejects a `start` that lies beyond
  /// the last item of a non-empty result set.
  pub fn checked(request: PageRequest, total: usize) -> Result<Self> {
    if total > 0 && request.start >= total {
      return Err(Error::StartOutOfRange { start: request.start, total });
    }
    Ok(Self::compute(request, total))
  }

  /// Number of items on this page.
  pub fn count(&self) -> usize {
    self
      .total_items
      .saturating_sub(self.start)
      .min(self.limit)
  }
}

/// An ordered page of results with its navigation metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
  pub results: Vec<T>,
  pub meta:    Pagination,
}

impl<T> Page<T> {
  pub fn empty(request: PageRequest) -> Self {
    Self { results: Vec::new(), meta: Pagination::compute(request, 0) }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn page(start: usize, limit: usize, total: usize) -> Pagination {
    Pagination::compute(PageRequest::new(start, limit).unwrap(), total)
  }

  #[test]
  fn first_page_has_next_but_no_prev() {
    let p = page(0, 5, 20);
    assert_eq!(p.next, Some(5));
    assert_eq!(p.prev, None);
    assert_eq!(p.page, 1);
    assert_eq!(p.total_pages, 4);
    assert_eq!(p.count(), 5);
  }

  #[test]
  fn last_page_has_prev_but_no_next() {
    let p = page(15, 5, 20);
    assert_eq!(p.next, None);
    assert_eq!(p.prev, Some(10));
    assert_eq!(p.page, 4);
  }

  #[test]
  fn links_follow_start_limit_total_everywhere() {
    for total in 0..12 {
      for limit in 1..6 {
        for start in 0..14 {
          let p = page(start, limit, total);
          assert_eq!(p.next.is_some(), start + limit < total);
          assert_eq!(p.prev.is_some(), start > 0);
          assert_eq!((p.start, p.limit), (start, limit));
        }
      }
    }
  }

  #[test]
  fn partial_last_page_counts_remaining_items() {
    assert_eq!(page(35, 10, 37).count(), 2);
    assert_eq!(page(0, 10, 0).count(), 0);
  }

  #[test]
  fn unaligned_start_prev_clamps_to_zero() {
    assert_eq!(page(2, 5, 20).prev, Some(0));
  }

  #[test]
  fn checked_rejects_start_past_end() {
    let req = PageRequest::new(20, 5).unwrap();
    assert!(matches!(
      Pagination::checked(req, 20),
      Err(Error::StartOutOfRange { start: 20, total: 20 })
    ));
    assert!(Pagination::checked(req, 0).is_ok());
  }

  #[test]
  fn zero_limit_is_rejected() {
    assert!(matches!(PageRequest::new(0, 0), Err(Error::ZeroLimit)));
  }

  #[test]
  fn oversized_limit_is_rejected() {
    assert!(PageRequest::new(0, PageRequest::MAX_LIMIT).is_ok());
    assert!(matches!(
      PageRequest::new(1, usize::MAX),
      Err(Error::LimitTooLarge { limit: usize::MAX, max: PageRequest::MAX_LIMIT })
    ));
  }

  #[test]
  fn extreme_windows_do_not_overflow() {
    let huge = |start, limit| Pagination::compute(PageRequest { start, limit }, 10);

    let p = huge(1, usize::MAX);
    assert_eq!(p.next, None);
    assert_eq!(p.prev, Some(0));
    assert_eq!(p.page, 1);
    assert_eq!(p.total_pages, 1);

    let p = huge(usize::MAX, usize::MAX);
    assert_eq!(p.next, None);
    assert_eq!(p.prev, Some(0));
    assert_eq!(p.count(), 0);

    let p = huge(usize::MAX, 1);
    assert_eq!(p.next, None);
    assert_eq!(p.page, usize::MAX);

    assert!(matches!(
      Pagination::checked(PageRequest::new(usize::MAX, 5).unwrap(), 10),
      Err(Error::StartOutOfRange { .. })
    ));
  }
}
