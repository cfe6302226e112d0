//! Exact block search over line sequences.
//!
//! A Knuth-Morris-Pratt matcher generalized from characters to arbitrary
//! elements. Used with `String` lines it locates a multi-line block inside a
//! document in O(|haystack| + |needle|) time without backtracking over the
//! haystack.
//!
//! Matching is exact: two elements match iff `==` says so. No whitespace or
//! case normalization is ever applied.

/// A needle with its precomputed failure table.
///
/// Building a `Pattern` once lets the same block be searched for repeatedly
/// (e.g. to detect a second occurrence) without rebuilding the table.
#[derive(Debug, Clone)]
pub struct Pattern<'a, T> {
    needle: &'a [T],
    failure: Vec<usize>,
}

impl<'a, T: PartialEq> Pattern<'a, T> {
    /// Compile `needle` into a pattern. Returns `None` for an empty needle,
    /// which never matches.
    pub fn new(needle: &'a [T]) -> Option<Self> {
        if needle.is_empty() {
            return None;
        }
        Some(Self {
            needle,
            failure: failure_table(needle),
        })
    }

    /// First occurrence at or after `start`.
    pub fn find_from(&self, haystack: &[T], start: usize) -> Option<usize> {
        let m = self.needle.len();
        if start > haystack.len() || haystack.len() - start < m {
            return None;
        }

        let mut matched = 0;
        for (i, item) in haystack.iter().enumerate().skip(start) {
            while matched > 0 && *item != self.needle[matched] {
                matched = self.failure[matched - 1];
            }
            if *item == self.needle[matched] {
                matched += 1;
            }
            if matched == m {
                return Some(i + 1 - m);
            }
        }
        None
    }

    pub fn find(&self, haystack: &[T]) -> Option<usize> {
        self.find_from(haystack, 0)
    }

    /// Number of occurrences in `haystack`, overlapping ones included.
    pub fn count_matches(&self, haystack: &[T]) -> usize {
        let mut count = 0;
        let mut from = 0;
        while let Some(idx) = self.find_from(haystack, from) {
            count += 1;
            from = idx + 1;
        }
        count
    }
}

/// Standard KMP partial-match table: `table[i]` is the length of the longest
/// proper prefix of `needle[..=i]` that is also a suffix of it.
fn failure_table<T: PartialEq>(needle: &[T]) -> Vec<usize> {
    let mut table = vec![0; needle.len()];
    let mut k = 0;
    for i in 1..needle.len() {
        while k > 0 && needle[i] != needle[k] {
            k = table[k - 1];
        }
        if needle[i] == needle[k] {
            k += 1;
        }
        table[i] = k;
    }
    table
}

/// Starting index of the first occurrence of `needle` in `haystack`.
///
/// Returns `None` when `needle` is empty or does not occur as a contiguous
/// run. When the needle occurs more than once the lowest index wins, so
/// later duplicates stay addressable by subsequent changes.
pub fn find<T: PartialEq>(haystack: &[T], needle: &[T]) -> Option<usize> {
    Pattern::new(needle)?.find(haystack)
}

/// Like [`find`], but starts searching at `start`.
pub fn find_from<T: PartialEq>(haystack: &[T], needle: &[T], start: usize) -> Option<usize> {
    Pattern::new(needle)?.find_from(haystack, start)
}

/// Number of (possibly overlapping) occurrences of `needle`. Zero for an
/// empty needle.
pub fn count_matches<T: PartialEq>(haystack: &[T], needle: &[T]) -> usize {
    Pattern::new(needle).map_or(0, |p| p.count_matches(haystack))
}
