//! Sorted, disjoint column-interval bookkeeping.
//!
//! The frame records which screen columns have been fully written by
//! solid walls as half-open `[start, end)` intervals.  Inserting merges
//! overlapping and adjacent intervals, so the list stays sorted and
//! disjoint; a vector is plenty for screen widths of a few thousand
//! columns and hundreds of segs per frame.

use smallvec::SmallVec;

/// A half-open column interval `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// The set of occluded columns in the current frame.
#[derive(Clone, Debug, Default)]
pub struct SpanSet {
    spans: Vec<Span>,
}

impl SpanSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.spans.clear();
    }

    /// Insert an interval, merging with any overlapping or adjacent ones.
    pub fn insert(&mut self, span: Span) {
        if span.is_empty() {
            return;
        }
        // First existing span that could merge with `span`, and first
        // that is strictly to its right.
        let lo = self.spans.partition_point(|s| s.end < span.start);
        let hi = self.spans.partition_point(|s| s.start <= span.end);
        if lo == hi {
            self.spans.insert(lo, span);
            return;
        }
        let merged = Span {
            start: span.start.min(self.spans[lo].start),
            end: span.end.max(self.spans[hi - 1].end),
        };
        self.spans.splice(lo..hi, std::iter::once(merged));
    }

    /// The sub-intervals of `within` *not* covered by the set, in order.
    pub fn gaps_within(&self, within: Span) -> SmallVec<[Span; 8]> {
        let mut out = SmallVec::new();
        if within.is_empty() {
            return out;
        }
        let mut cursor = within.start;
        for s in &self.spans {
            if s.end <= within.start {
                continue;
            }
            if s.start >= within.end {
                break;
            }
            if s.start > cursor {
                out.push(Span::new(cursor, s.start.min(within.end)));
            }
            cursor = cursor.max(s.end);
            if cursor >= within.end {
                break;
            }
        }
        if cursor < within.end {
            out.push(Span::new(cursor, within.end));
        }
        out
    }

    /// True once a single interval covers `[0, width)`.
    pub fn is_full(&self, width: u32) -> bool {
        self.spans.len() == 1 && self.spans[0] == Span::new(0, width)
    }

    pub fn iter(&self) -> impl Iterator<Item = Span> + '_ {
        self.spans.iter().copied()
    }

    #[cfg(test)]
    fn assert_sorted_disjoint(&self) {
        for pair in self.spans.windows(2) {
            assert!(pair[0].end < pair[1].start, "spans touch or overlap: {pair:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_of(spans: &[(u32, u32)]) -> SpanSet {
        let mut set = SpanSet::new();
        for &(s, e) in spans {
            set.insert(Span::new(s, e));
            set.assert_sorted_disjoint();
        }
        set
    }

    #[test]
    fn inserts_merge_overlaps_and_adjacency() {
        let set = set_of(&[(10, 20), (15, 25), (30, 40), (5, 12)]);
        let spans: Vec<Span> = set.iter().collect();
        assert_eq!(spans, vec![Span::new(5, 25), Span::new(30, 40)]);
    }

    #[test]
    fn adjacent_spans_fuse() {
        let set = set_of(&[(0, 10), (10, 20)]);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Span::new(0, 20)]);
    }

    #[test]
    fn insert_bridging_many() {
        let set = set_of(&[(0, 2), (4, 6), (8, 10), (1, 9)]);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Span::new(0, 10)]);
    }

    #[test]
    fn empty_spans_ignored() {
        let set = set_of(&[(5, 5), (7, 3)]);
        assert_eq!(set.iter().count(), 0);
    }

    #[test]
    fn gaps_between_spans() {
        let set = set_of(&[(10, 20), (30, 40)]);
        let gaps = set.gaps_within(Span::new(0, 50));
        assert_eq!(
            gaps.as_slice(),
            &[Span::new(0, 10), Span::new(20, 30), Span::new(40, 50)]
        );
    }

    #[test]
    fn gaps_of_fully_covered_query_are_empty() {
        let set = set_of(&[(0, 100)]);
        assert!(set.gaps_within(Span::new(25, 75)).is_empty());
    }

    #[test]
    fn gaps_of_untouched_query_is_query() {
        let set = set_of(&[(10, 20)]);
        let gaps = set.gaps_within(Span::new(40, 60));
        assert_eq!(gaps.as_slice(), &[Span::new(40, 60)]);
    }

    #[test]
    fn gap_clipped_to_query_bounds() {
        let set = set_of(&[(10, 20)]);
        let gaps = set.gaps_within(Span::new(15, 25));
        assert_eq!(gaps.as_slice(), &[Span::new(20, 25)]);
    }

    #[test]
    fn full_detection() {
        let mut set = set_of(&[(0, 300), (300, 640)]);
        assert!(set.is_full(640));
        assert!(!set.is_full(641));
        set.clear();
        assert!(!set.is_full(640));
    }
}
