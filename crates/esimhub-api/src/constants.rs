//! API-wide constants.

/// Version segment of the public API.
pub const API_VERSION: &str = "v1";

/// Prefix every versioned route is nested under.
pub const API_PREFIX: &str = "/api/v1";

/// Maximum accepted request body, in bytes. Payloads here are small JSON
/// documents; anything larger is a client error.
pub const MAX_BODY_BYTES: usize = 64 * 1024;
