//! Dot-notation task identifiers.
//!
//! A task ID encodes its full ancestor path: `"1.2.3"` is the third child of
//! `"1.2"`, which is the second child of root `"1"`. IDs are assigned once
//! from the sibling count at insertion time and never reused.

use std::cmp::Ordering;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Result, TrackerError};

fn task_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[1-9][0-9]*(\.[1-9][0-9]*)*$").expect("task id pattern is a valid regex")
    })
}

/// Compute the ID of a new node.
///
/// `sibling_count` is the length of the sibling sequence before insertion.
///
/// # Example
///
/// ```
/// use tasktree::registry::id::assign_task_id;
///
/// assert_eq!(assign_task_id(None, 0), "1");
/// assert_eq!(assign_task_id(Some("1.2"), 2), "1.2.3");
/// ```
#[must_use]
pub fn assign_task_id(parent_id: Option<&str>, sibling_count: usize) -> String {
    match parent_id {
        None => (sibling_count + 1).to_string(),
        Some(parent) => format!("{}.{}", parent, sibling_count + 1),
    }
}

/// Check that a string is a well-formed dot-notation ID.
#[must_use]
pub fn is_valid_task_id(task_id: &str) -> bool {
    task_id_pattern().is_match(task_id)
}

/// Reject malformed IDs with `InvalidArgument`.
pub fn validate_task_id(task_id: &str) -> Result<()> {
    if is_valid_task_id(task_id) {
        Ok(())
    } else {
        Err(TrackerError::invalid_argument(
            "task_id",
            format!("'{}' is not a dot-notation task ID", task_id),
        ))
    }
}

/// Order IDs segment by segment numerically, so `"2" < "10"` and `"1.2" < "1.10"`.
///
/// Segments that do not parse as numbers fall back to string order.
#[must_use]
pub fn compare_task_ids(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ord = match (l.parse::<u64>(), r.parse::<u64>()) {
                    (Ok(l), Ok(r)) => l.cmp(&r),
                    _ => l.cmp(r),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_ids_are_one_based() {
        let ids: Vec<String> = (0..4).map(|k| assign_task_id(None, k)).collect();
        assert_eq!(ids, ["1", "2", "3", "4"]);
    }

    #[test]
    fn test_child_ids_extend_parent() {
        assert_eq!(assign_task_id(Some("1"), 0), "1.1");
        assert_eq!(assign_task_id(Some("3.4"), 9), "3.4.10");
    }

    #[test]
    fn test_validation() {
        assert!(is_valid_task_id("1"));
        assert!(is_valid_task_id("12.3.40"));
        assert!(!is_valid_task_id(""));
        assert!(!is_valid_task_id("0"));
        assert!(!is_valid_task_id("1..2"));
        assert!(!is_valid_task_id("1.a"));
        assert!(!is_valid_task_id("1.2."));
        assert!(validate_task_id("x").is_err());
    }

    #[test]
    fn test_natural_ordering() {
        let mut ids = vec!["10", "2", "1.10", "1.2", "1"];
        ids.sort_by(|a, b| compare_task_ids(a, b));
        assert_eq!(ids, ["1", "1.2", "1.10", "2", "10"]);
    }
}
