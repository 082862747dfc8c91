//! Pagination.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// A 1-based page of a totally ordered result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
  page:      u32,
  page_size: u32,
}

impl Default for PageRequest {
  fn default() -> Self {
    Self { page: DEFAULT_PAGE, page_size: DEFAULT_PAGE_SIZE }
  }
}

impl PageRequest {
  /// Returns [`Error::InvalidPage`] when either value is zero.
  pub fn new(page: u32, page_size: u32) -> Result<Self> {
    if page == 0 {
      return Err(Error::InvalidPage("page must be at least 1".into()));
    }
    if page_size == 0 {
      return Err(Error::InvalidPage("page_size must be at least 1".into()));
    }
    Ok(Self { page, page_size })
  }

  pub fn page(&self) -> u32 { self.page }

  pub fn page_size(&self) -> u32 { self.page_size }

  /// Rows skipped before this page.
  pub fn offset(&self) -> u64 {
    u64::from(self.page - 1) * u64::from(self.page_size)
  }

  pub fn limit(&self) -> u64 { u64::from(self.page_size) }

  /// Cut this page out of an already ordered, unpaged result set.
  pub fn slice<T>(&self, rows: Vec<T>) -> Page<T> {
    let total = rows.len() as u64;
    let offset = usize::try_from(self.offset()).unwrap_or(usize::MAX);
    let results = rows
      .into_iter()
      .skip(offset)
      .take(self.page_size as usize)
      .collect();
    self.wrap(total, results)
  }

  /// Wrap rows that were already paged by the store.
  pub fn wrap<T>(&self, total: u64, results: Vec<T>) -> Page<T> {
    Page {
      total,
      page: self.page,
      page_size: self.page_size,
      results,
    }
  }
}

/// One page of results plus the size of the full result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
  pub total:     u64,
  pub page:      u32,
  pub page_size: u32,
  pub results:   Vec<T>,
}

impl<T> Page<T> {
  pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
    Page {
      total:     self.total,
      page:      self.page,
      page_size: self.page_size,
      results:   self.results.into_iter().map(f).collect(),
    }
  }
}
