//! Constants shared across the tag engine.
//!
//! Defaults for tag arguments, the names used when talking to the host, and
//! the log prefix the original plugin used for its console output.

/// Name under which the template tag is registered with the host.
pub const TAG_NAME: &str = "responseRegex";

/// Key of the render-context extra info entry holding the request chain.
///
/// The host hands this entry back to nested renders triggered by a resend, so
/// the name must stay stable across versions.
pub const REQUEST_CHAIN_KEY: &str = "requestChain";

/// Maximum response age in seconds used when the tag does not specify one.
pub const DEFAULT_MAX_AGE_SECONDS: u64 = 60;

/// Charset assumed when the response content type does not declare one.
pub const DEFAULT_CHARSET: &str = "utf-8";

/// Environment variable overriding the configuration file location.
pub const CONFIG_PATH_ENV: &str = "RESPONSE_REGEX_CONFIG";

/// Tracing target for engine events.
pub const LOG_TARGET: &str = "response_regex";
