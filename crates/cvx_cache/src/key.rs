//! Cache key derivation.

use sha2::{Digest, Sha256};

/// Length of a cache key: a hex-encoded SHA-256 digest.
pub const KEY_LEN: usize = 64;

/// Compute the cache key for a set of build inputs.
///
/// The key is the lowercase hex SHA-256 of the inputs concatenated in this
/// order with no separators: the issue number in decimal, the job posting,
/// the CV, the letter, the schema, and the model name. CV and letter are
/// expected in canonical JSON form.
///
/// Both the order and the lack of delimiters are part of the on-disk format.
/// Inputs that concatenate to the same bytes share a key.
///
/// # Example
///
/// ```
/// use cvx_cache::cache_key;
///
/// let a = cache_key(42, "posting", "{}", "{}", "{}", "claude-sonnet-4");
/// let b = cache_key(42, "posting", "{}", "{}", "{}", "claude-sonnet-4");
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 64);
/// ```
pub fn cache_key(
    issue_number: u64,
    job_posting: &str,
    cv: &str,
    letter: &str,
    schema: &str,
    model: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(issue_number.to_string().as_bytes());
    hasher.update(job_posting.as_bytes());
    hasher.update(cv.as_bytes());
    hasher.update(letter.as_bytes());
    hasher.update(schema.as_bytes());
    hasher.update(model.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_plain_sha256_of_concatenation() {
        let mut hasher = Sha256::new();
        hasher.update(b"7jobcvlettersschemamodel");
        let expected = format!("{:x}", hasher.finalize());

        assert_eq!(cache_key(7, "job", "cv", "letters", "schema", "model"), expected);
    }

    #[test]
    fn test_empty_inputs_hash_issue_number_only() {
        // sha256("0")
        assert_eq!(
            cache_key(0, "", "", "", "", ""),
            "5feceb66ffc86f38d952786c6d696c79c2dbc239dd4e91b46729d73a27fb57e9"
        );
    }
}
