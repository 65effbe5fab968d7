//! Round-robin work distribution across sessions.

use crate::error::ChatgrepError;

/// Splits `items` into `buckets` subsets: item `i` goes to bucket `i % buckets`.
///
/// Order inside each bucket follows input order. Every bucket receives
/// `floor(n / m)` or `ceil(n / m)` items.
///
/// # Errors
///
/// Returns [`ChatgrepError::NoActiveSessions`] when `buckets == 0`.
///
/// # Example
///
/// ```
/// use chatgrep::core::distribute::distribute;
///
/// let buckets = distribute(vec!["a", "b", "c", "d", "e"], 2)?;
/// assert_eq!(buckets, vec![vec!["a", "c", "e"], vec!["b", "d"]]);
/// # Ok::<(), chatgrep::ChatgrepError>(())
/// ```
pub fn distribute<T>(items: Vec<T>, buckets: usize) -> Result<Vec<Vec<T>>, ChatgrepError> {
    if buckets == 0 {
        return Err(ChatgrepError::NoActiveSessions);
    }

    let per_bucket = items.len().div_ceil(buckets);
    let mut result: Vec<Vec<T>> = (0..buckets).map(|_| Vec::with_capacity(per_bucket)).collect();
    for (i, item) in items.into_iter().enumerate() {
        result[i % buckets].push(item);
    }
    Ok(result)
}
