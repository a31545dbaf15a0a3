//! Wrapping cursor over a fixed list of memory graph paths.

use std::path::{Path, PathBuf};

/// Ordered graph paths plus the index of the graph being analyzed.
///
/// The list is fixed at construction and never empty, so `index < len` holds
/// after every `advance`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphCursor {
    graphs: Vec<PathBuf>,
    index: usize,
}

impl GraphCursor {
    /// Returns `None` for an empty list.
    pub fn new(graphs: Vec<PathBuf>) -> Option<Self> {
        if graphs.is_empty() {
            return None;
        }
        Some(Self { graphs, index: 0 })
    }

    pub fn current(&self) -> &Path {
        &self.graphs[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    pub fn graphs(&self) -> &[PathBuf] {
        &self.graphs
    }

    /// Move to the next graph, wrapping to zero past the last one.
    ///
    /// Returns the new index; zero means the cursor wrapped (or the list holds
    /// a single graph).
    pub fn advance(&mut self) -> usize {
        self.index += 1;
        if self.index >= self.graphs.len() {
            self.index = 0;
        }
        self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor(len: usize) -> GraphCursor {
        let graphs = (0..len)
            .map(|i| PathBuf::from(format!("{i}.memgraph")))
            .collect();
        GraphCursor::new(graphs).expect("non-empty")
    }

    #[test]
    fn empty_list_has_no_cursor() {
        assert!(GraphCursor::new(Vec::new()).is_none());
    }

    #[test]
    fn advancing_len_times_returns_to_zero() {
        for len in 1..=5 {
            let mut cursor = cursor(len);
            for _ in 0..len {
                cursor.advance();
            }
            assert_eq!(cursor.index(), 0, "len={len}");
        }
    }

    #[test]
    fn advance_walks_in_order_then_wraps() {
        let mut cursor = cursor(3);
        assert_eq!(cursor.current(), Path::new("0.memgraph"));
        assert_eq!(cursor.advance(), 1);
        assert_eq!(cursor.current(), Path::new("1.memgraph"));
        assert_eq!(cursor.advance(), 2);
        assert_eq!(cursor.advance(), 0);
        assert_eq!(cursor.current(), Path::new("0.memgraph"));
    }

    #[test]
    fn single_graph_wraps_immediately() {
        let mut cursor = cursor(1);
        assert_eq!(cursor.advance(), 0);
    }
}
