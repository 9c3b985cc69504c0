//! Table of contents model
//!
//! Headings arrive as a flat, document ordered list and are nested into a
//! tree by level. The tree is shared by the HTML table of contents and the
//! TOC side panel.

/// Deepest heading level shown in a table of contents.
pub const MAX_LEVEL: u8 = 6;

// ─────────────────────────────────────────────────────────────────────────────
// TocEntry
// ─────────────────────────────────────────────────────────────────────────────

/// A heading in the table of contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    /// Heading level (1-6 for H1-H6)
    pub level: u8,
    /// Anchor id of the heading
    pub id: String,
    /// Heading text (stripped of markdown formatting)
    pub text: String,
    /// 0-based source line, when known
    pub line: Option<usize>,
    /// Nested lower-level headings
    pub children: Vec<TocEntry>,
}

impl TocEntry {
    pub fn new(level: u8, id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            level: level.clamp(1, MAX_LEVEL),
            id: id.into(),
            text: text.into(),
            line: None,
            children: Vec::new(),
        }
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Get the indentation level (0 for H1, 1 for H2, etc.)
    pub fn indent_level(&self) -> usize {
        self.level.saturating_sub(1) as usize
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Nesting
// ─────────────────────────────────────────────────────────────────────────────

/// Nest a flat list of headings by level.
///
/// Each heading becomes a child of the closest preceding heading with a
/// smaller level. Skipped levels (`#` followed by `###`) nest directly.
pub fn nest_headings(flat: impl IntoIterator<Item = TocEntry>) -> Vec<TocEntry> {
    let mut roots = Vec::new();
    let mut stack: Vec<TocEntry> = Vec::new();

    for entry in flat {
        while stack.last().is_some_and(|top| top.level >= entry.level) {
            close_top(&mut stack, &mut roots);
        }
        stack.push(entry);
    }
    while !stack.is_empty() {
        close_top(&mut stack, &mut roots);
    }

    roots
}

fn close_top(stack: &mut Vec<TocEntry>, roots: &mut Vec<TocEntry>) {
    if let Some(done) = stack.pop() {
        match stack.last_mut() {
            Some(parent) => parent.children.push(done),
            None => roots.push(done),
        }
    }
}

/// Depth-first walk over a nested table of contents.
pub fn flatten(entries: &[TocEntry]) -> Vec<&TocEntry> {
    let mut out = Vec::new();
    fn walk<'a>(entries: &'a [TocEntry], out: &mut Vec<&'a TocEntry>) {
        for entry in entries {
            out.push(entry);
            walk(&entry.children, out);
        }
    }
    walk(entries, &mut out);
    out
}

/// Find the id of the heading whose section contains `line`: the last
/// heading starting at or before it.
pub fn find_current_section(entries: &[TocEntry], line: usize) -> Option<&str> {
    flatten(entries)
        .into_iter()
        .filter(|e| e.line.is_some_and(|l| l <= line))
        .last()
        .map(|e| e.id.as_str())
}

/// Get a summary string like "1 H1, 2 H2"
pub fn summary(entries: &[TocEntry]) -> String {
    let mut counts = [0usize; MAX_LEVEL as usize];
    for entry in flatten(entries) {
        counts[entry.indent_level()] += 1;
    }
    let parts: Vec<String> = counts
        .iter()
        .enumerate()
        .filter(|&(_, &count)| count > 0)
        .map(|(i, count)| format!("{} H{}", count, i + 1))
        .collect();
    if parts.is_empty() {
        "No headings".to_string()
    } else {
        parts.join(", ")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(level: u8, id: &str, line: usize) -> TocEntry {
        TocEntry::new(level, id, id).with_line(line)
    }

    #[test]
    fn test_nest_simple_hierarchy() {
        let tree = nest_headings(vec![
            entry(1, "intro", 0),
            entry(2, "setup", 2),
            entry(2, "usage", 4),
            entry(1, "appendix", 6),
        ]);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].id, "intro");
        assert_eq!(tree[0].children.len(), 2);
        assert_eq!(tree[0].children[1].id, "usage");
        assert!(tree[1].children.is_empty());
    }

    #[test]
    fn test_nest_skipped_levels() {
        let tree = nest_headings(vec![entry(1, "a", 0), entry(3, "b", 1), entry(2, "c", 2)]);
        assert_eq!(tree.len(), 1);
        let ids: Vec<_> = tree[0].children.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn test_nest_starting_below_top_level() {
        let tree = nest_headings(vec![entry(3, "deep", 0), entry(1, "top", 1)]);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].id, "deep");
    }

    #[test]
    fn test_nest_empty() {
        assert!(nest_headings(Vec::new()).is_empty());
    }

    #[test]
    fn test_level_is_clamped() {
        assert_eq!(TocEntry::new(9, "x", "x").level, MAX_LEVEL);
        assert_eq!(TocEntry::new(0, "x", "x").level, 1);
    }

    #[test]
    fn test_flatten_preserves_document_order() {
        let tree = nest_headings(vec![entry(1, "a", 0), entry(2, "b", 1), entry(1, "c", 2)]);
        let ids: Vec<_> = flatten(&tree).iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_find_current_section() {
        let tree = nest_headings(vec![entry(1, "a", 2), entry(2, "b", 5), entry(1, "c", 9)]);
        assert_eq!(find_current_section(&tree, 0), None);
        assert_eq!(find_current_section(&tree, 2), Some("a"));
        assert_eq!(find_current_section(&tree, 7), Some("b"));
        assert_eq!(find_current_section(&tree, 20), Some("c"));
    }

    #[test]
    fn test_summary() {
        let tree = nest_headings(vec![entry(1, "a", 0), entry(2, "b", 1), entry(2, "c", 2)]);
        assert_eq!(summary(&tree), "1 H1, 2 H2");
        assert_eq!(summary(&[]), "No headings");
    }
}
