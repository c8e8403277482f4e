use serde::{Deserialize, Serialize};

/// Paging information supplied by an external pager.
///
/// The assembler only renders these numbers; it never computes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub size: u64,
    pub total_elements: u64,
    pub total_pages: u64,
    pub number: u64,
}

impl PageMetadata {
    pub fn new(size: u64, number: u64, total_elements: u64, total_pages: u64) -> Self {
        Self {
            size,
            total_elements,
            total_pages,
            number,
        }
    }

    /// Returns true if a page precedes this one.
    pub fn has_previous(&self) -> bool {
        self.number > 0
    }

    /// Returns true if a page follows this one.
    pub fn has_next(&self) -> bool {
        self.number
            .checked_add(1)
            .is_some_and(|next| next < self.total_pages)
    }
}
