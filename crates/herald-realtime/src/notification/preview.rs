//! Short preview text attached to notifications.

const ELLIPSIS: &str = "...";

/// Collapse whitespace and cut `text` to at most `max_chars` characters,
/// ending in an ellipsis when shortened. Limits too small to fit the
/// ellipsis get a bare cut.
pub fn truncate_preview(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    if max_chars <= ELLIPSIS.len() {
        return collapsed.chars().take(max_chars).collect();
    }
    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    let mut out: String = collapsed.chars().take(keep).collect();
    out.truncate(out.trim_end().len());
    out.push_str(ELLIPSIS);
    out
}
