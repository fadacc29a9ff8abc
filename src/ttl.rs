//! Time-to-live resolution for writes.

/// Pick the TTL for a write.
///
/// Precedence: explicit argument, then the session's last lifetime, then the
/// codec-declared lifetime, then the configured default. A last lifetime of `0`
/// counts as unset. The result is in seconds; `0` stores without expiry.
pub fn resolve_lifetime(
    explicit: Option<u64>,
    last: Option<u64>,
    codec: Option<u64>,
    fallback: u64,
) -> u64 {
    explicit
        .or(last.filter(|&secs| secs > 0))
        .or(codec)
        .unwrap_or(fallback)
}
