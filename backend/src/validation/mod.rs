//! Sort-order guard.
//!
//! Grouping relies on rows with the same key being adjacent. Neither grouping
//! pass checks this. These functions find the first row whose key already
//! belonged to a group that was closed earlier, which is exactly the case in
//! which grouping splits one group into several.
//!
//! # Example
//!
//! ```rust,ignore
//! use survey_results::validation::check_contiguous;
//!
//! check_contiguous(&rows)?; // Err(EngineError::UnsortedInput { index })
//! ```

use std::collections::HashSet;
use std::hash::Hash;

use crate::error::{EngineError, EngineResult};
use crate::models::ResponseRow;
use crate::transform::time::to_utc;

/// Index of the first key that reappears after its run ended.
pub fn first_reappearance<K, I>(keys: I) -> Option<usize>
where
    K: Eq + Hash,
    I: IntoIterator<Item = K>,
{
    let mut closed: HashSet<K> = HashSet::new();
    let mut current: Option<K> = None;

    for (index, key) in keys.into_iter().enumerate() {
        if current.as_ref() == Some(&key) {
            continue;
        }
        if closed.contains(&key) {
            return Some(index);
        }
        if let Some(previous) = current.replace(key) {
            closed.insert(previous);
        }
    }
    None
}

/// Fail when survey instance keys are not contiguous.
pub fn check_contiguous(rows: &[ResponseRow]) -> EngineResult<()> {
    match first_reappearance(rows.iter().map(ResponseRow::instance_key)) {
        Some(index) => Err(EngineError::UnsortedInput { index }),
        None => Ok(()),
    }
}

/// Fail when (survey id, UTC timestamp) groups are not contiguous.
pub fn check_attach_order(rows: &[ResponseRow]) -> EngineResult<()> {
    let keys = rows
        .iter()
        .map(|r| -> EngineResult<(String, String)> {
            Ok((r.survey_id.clone(), to_utc(&r.timestamp, &r.timezone)?))
        })
        .collect::<EngineResult<Vec<_>>>()?;
    match first_reappearance(keys) {
        Some(index) => Err(EngineError::UnsortedInput { index }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(user: &str, survey: &str, ts: &str) -> ResponseRow {
        ResponseRow {
            user: user.into(),
            survey_id: survey.into(),
            timestamp: ts.into(),
            timezone: "UTC".into(),
            prompt_id: "p".into(),
            ..Default::default()
        }
    }

    const T1: &str = "2012-01-01 00:00:00";
    const T2: &str = "2012-01-01 00:05:00";

    #[test]
    fn test_first_reappearance() {
        assert_eq!(first_reappearance(Vec::<u8>::new()), None);
        assert_eq!(first_reappearance([1, 1, 2, 2, 3]), None);
        assert_eq!(first_reappearance([1, 2, 1]), Some(2));
        assert_eq!(first_reappearance([1, 1, 2, 3, 2, 1]), Some(4));
    }

    #[test]
    fn test_check_contiguous() {
        let sorted = vec![row("u1", "s1", T1), row("u1", "s1", T1), row("u2", "s1", T1)];
        assert!(check_contiguous(&sorted).is_ok());

        let unsorted = vec![row("u1", "s1", T1), row("u2", "s1", T1), row("u1", "s1", T1)];
        assert!(matches!(
            check_contiguous(&unsorted),
            Err(EngineError::UnsortedInput { index: 2 })
        ));
    }

    #[test]
    fn test_check_attach_order() {
        let sorted = vec![row("u1", "s1", T1), row("u2", "s1", T1), row("u1", "s1", T2)];
        assert!(check_attach_order(&sorted).is_ok());

        let unsorted = vec![row("u1", "s1", T1), row("u1", "s1", T2), row("u1", "s1", T1)];
        assert!(matches!(
            check_attach_order(&unsorted),
            Err(EngineError::UnsortedInput { index: 2 })
        ));
    }
}
