//! Pagination state for GitHub list responses.

/// Position within a paginated listing.
///
/// The end of pagination is an explicit signal (`has_next` turning false),
/// never an error path or an empty-page sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    /// Current page number (1-based).
    current_page: u32,
    /// Items per page.
    per_page: u8,
    /// Whether more pages exist after the current one.
    has_next: bool,
}

impl PageInfo {
    /// Creates a new page info instance.
    #[must_use]
    pub const fn new(current_page: u32, per_page: u8, has_next: bool) -> Self {
        Self {
            current_page,
            per_page,
            has_next,
        }
    }

    /// Returns the current page number (1-based).
    #[must_use]
    pub const fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Returns the number of items per page.
    #[must_use]
    pub const fn per_page(&self) -> u8 {
        self.per_page
    }

    /// Returns true if more pages exist after the current one.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.has_next
    }

    /// Returns true if this is the last page.
    #[must_use]
    pub const fn is_last_page(&self) -> bool {
        !self.has_next
    }
}

impl Default for PageInfo {
    fn default() -> Self {
        Self {
            current_page: 1,
            per_page: 100,
            has_next: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PageInfo;

    #[test]
    fn final_page_reports_end_of_pagination() {
        let info = PageInfo::new(3, 100, false);
        assert!(info.is_last_page());
        assert!(!info.has_next());
        assert_eq!(info.current_page(), 3);
        assert_eq!(info.per_page(), 100);
    }

    #[test]
    fn intermediate_page_signals_more() {
        let info = PageInfo::new(1, 100, true);
        assert!(!info.is_last_page());
    }
}
