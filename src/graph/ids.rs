//! Stable, reproducible node identity assignment.

use std::collections::HashMap;

/// Allocates structural node ids of the form `{page_id}_{tag_name}_{index}`.
///
/// Maintains per-page, per-tag-name monotonic counters seeded at zero on
/// first use. Ids are reproducible across rebuilds only when the element
/// tree is walked in the same deterministic order (pre-order, document
/// order), so callers must visit children in source document order.
///
/// External-page and data-link nodes are keyed by other rules and do not
/// consume these counters.
#[derive(Debug, Default)]
pub struct IdAllocator {
    counters: HashMap<(String, String), usize>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the next id for this page/tag pair and advance its counter.
    pub fn allocate(&mut self, page_id: &str, tag_name: &str) -> String {
        let counter = self
            .counters
            .entry((page_id.to_string(), tag_name.to_string()))
            .or_insert(0);
        let id = format!("{}_{}_{}", page_id, tag_name, *counter);
        *counter += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero_and_increment() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.allocate("a.html", "p"), "a.html_p_0");
        assert_eq!(ids.allocate("a.html", "p"), "a.html_p_1");
        assert_eq!(ids.allocate("a.html", "p"), "a.html_p_2");
    }

    #[test]
    fn test_counters_independent_per_tag() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.allocate("a.html", "h1"), "a.html_h1_0");
        assert_eq!(ids.allocate("a.html", "p"), "a.html_p_0");
        assert_eq!(ids.allocate("a.html", "h1"), "a.html_h1_1");
    }

    #[test]
    fn test_counters_independent_per_page() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.allocate("a.html", "div"), "a.html_div_0");
        assert_eq!(ids.allocate("b.html", "div"), "b.html_div_0");
        assert_eq!(ids.allocate("a.html", "div"), "a.html_div_1");
    }

    #[test]
    fn test_fresh_allocator_reproduces_ids() {
        let sequence = ["div", "p", "p", "a", "div"];
        let run = |mut ids: IdAllocator| -> Vec<String> {
            sequence.iter().map(|t| ids.allocate("x.html", t)).collect()
        };
        assert_eq!(run(IdAllocator::new()), run(IdAllocator::new()));
    }
}
