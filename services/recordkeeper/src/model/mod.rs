//! Recordkeeper data model.
//!
//! # Purpose
//! Officer and report records as stored and served, plus the read-side views
//! and paging types shared by the store backends and HTTP handlers.
mod officer;
mod report;

pub use officer::{Officer, OfficerRef, OfficerSummary, OfficerUpdate};
pub use report::{Report, ReportDigest, ReportFields, ReportFilter, ReportView};

/// A 1-based page request.
///
/// # Invariants
/// - `page >= 1` and `per_page >= 1`; [`PageRequest::new`] clamps both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.per_page)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.per_page)
    }
}

/// One page of results plus the unpaged total.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: u64,
}

impl<T> Page<T> {
    pub fn total_pages(&self, per_page: u32) -> u64 {
        self.total_count.div_ceil(u64::from(per_page.max(1)))
    }

    /// Slice an already ordered result set.
    pub(crate) fn from_sorted(items: Vec<T>, request: PageRequest) -> Self {
        let total_count = items.len() as u64;
        let items = items
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.limit() as usize)
            .collect();
        Self { items, total_count }
    }
}
