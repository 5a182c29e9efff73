//! Counted nouns for summary lines.

/// `count` followed by `noun`, with an `s` unless the count is one.
///
/// `plural_count(3, "diagram")` gives `"3 diagrams"`.
#[inline]
pub fn plural_count(count: usize, noun: &str) -> String {
    let suffix = if count == 1 { "" } else { "s" };
    format!("{count} {noun}{suffix}")
}
