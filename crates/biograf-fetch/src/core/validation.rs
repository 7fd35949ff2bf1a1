/// Returns `true` for 2xx statuses.
pub fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Statuses worth retrying: server errors and rate limiting.
///
/// ```
/// use biograf_fetch::core::is_retryable_status;
///
/// assert!(is_retryable_status(503));
/// assert!(is_retryable_status(429));
/// assert!(!is_retryable_status(404));
/// ```
pub fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

/// `Range` header value for the half-open interval `[start, end)`.
///
/// HTTP ranges are inclusive, so the last byte is `end - 1`.
pub fn range_header(start: u64, end: u64) -> String {
    debug_assert!(start < end, "empty range [{start}, {end})");
    format!("bytes={}-{}", start, end - 1)
}
