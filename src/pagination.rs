//! Page envelope returned by every list endpoint.

use serde::{Deserialize, Serialize};

pub const DEFAULT_ITEMS_PER_PAGE: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Paginated<T> {
    /// Number of matching records across all pages.
    pub total: usize,
    pub page: usize,
    /// Number of pages, zero when nothing matched.
    pub pages: usize,
    pub items: Vec<T>,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: usize, current_page: usize, per_page: usize) -> Self {
        let current_page = if current_page == 0 { 1 } else { current_page };
        Self {
            total,
            page: current_page,
            pages: total.div_ceil(per_page.max(1)),
            items,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            total: self.total,
            page: self.page,
            pages: self.pages,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}

impl<T> Default for Paginated<T> {
    fn default() -> Self {
        Self {
            total: 0,
            page: 1,
            pages: 0,
            items: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_round_up() {
        let page = Paginated::new(vec![1, 2], 41, 0, 20);
        assert_eq!(page.page, 1);
        assert_eq!(page.pages, 3);
        assert_eq!(Paginated::<i32>::new(vec![], 0, 1, 20).pages, 0);
    }
}
