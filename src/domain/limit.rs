/// Page size used when the caller asks for nothing sensible.
pub const DEFAULT_LIMIT: i64 = 10;

/// Largest page any listing returns.
pub const MAX_LIMIT: i64 = 100;

/// Clamp a caller-supplied listing limit.
///
/// Values below 1 fall back to [`DEFAULT_LIMIT`]; values above [`MAX_LIMIT`]
/// are capped. Applied to every listing so transaction history and account
/// listings page the same way.
pub fn clamp_limit(limit: i64) -> i64 {
    if limit < 1 {
        DEFAULT_LIMIT
    } else {
        limit.min(MAX_LIMIT)
    }
}
