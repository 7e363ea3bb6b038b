//! Case-insensitive pattern search over base calls.
//!
//! Overlapping occurrences are all reported: after a hit at `i` the scan
//! resumes at `i + 1`, so `AA` occurs three times in `AAAA`.

/// Inclusive base range of one occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchMatch {
    pub start: usize,
    pub end: usize,
}

/// Every occurrence of `pattern` in `sequence`, ordered by start.
pub fn find_all(sequence: &str, pattern: &str) -> Vec<SearchMatch> {
    let needle = pattern.to_ascii_uppercase();
    if needle.is_empty() || !sequence.is_ascii() {
        return Vec::new();
    }
    let haystack = sequence.to_ascii_uppercase();

    let mut matches = Vec::new();
    let mut from = 0;
    while from < haystack.len() {
        let Some(pos) = haystack[from..].find(&needle) else {
            break;
        };
        let start = from + pos;
        matches.push(SearchMatch {
            start,
            end: start + needle.len() - 1,
        });
        from = start + 1;
    }
    matches
}

/// Matches of the last search and which one is current.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    pattern: String,
    matches: Vec<SearchMatch>,
    current: Option<usize>,
}

impl SearchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs a new search. The first match becomes current.
    pub fn search(&mut self, sequence: &str, pattern: &str) -> usize {
        self.pattern = pattern.to_string();
        self.matches = find_all(sequence, pattern);
        self.current = if self.matches.is_empty() { None } else { Some(0) };
        self.matches.len()
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn matches(&self) -> &[SearchMatch] {
        &self.matches
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current(&self) -> Option<SearchMatch> {
        self.current.map(|i| self.matches[i])
    }

    /// Advances circularly to the next match.
    pub fn next_match(&mut self) -> Option<SearchMatch> {
        let n = self.matches.len();
        let i = self.current?;
        self.current = Some((i + 1) % n);
        self.current()
    }

    /// Steps circularly to the previous match.
    pub fn previous_match(&mut self) -> Option<SearchMatch> {
        let n = self.matches.len();
        let i = self.current?;
        self.current = Some((i + n - 1) % n);
        self.current()
    }

    /// Makes the first match starting at or after `index` current, wrapping.
    pub fn seek(&mut self, index: usize) -> Option<SearchMatch> {
        if self.matches.is_empty() {
            return None;
        }
        let i = self.matches.partition_point(|m| m.start < index);
        self.current = Some(i % self.matches.len());
        self.current()
    }

    /// True if any match covers `index`.
    pub fn covers(&self, index: usize) -> bool {
        // Equal-length matches: ends are sorted like starts.
        let i = self.matches.partition_point(|m| m.start <= index);
        i > 0 && self.matches[i - 1].end >= index
    }

    pub fn clear(&mut self) {
        self.pattern.clear();
        self.matches.clear();
        self.current = None;
    }
}
