//! Response body decoding.
//!
//! The charset comes from the `charset=` parameter of the response's content
//! type and defaults to UTF-8. Decoding never fails:
//!
//! - malformed sequences in a known charset become U+FFFD, the rest of the
//!   body decodes normally
//! - an unknown charset label maps every byte to the character with the same
//!   code point (ISO-8859-1 style)
//! - `iso-8859-1` and its aliases use that same byte mapping rather than the
//!   windows-1252 table web browsers substitute for them, so `0x80` decodes to
//!   U+0080, not `€`
//!
//! Problems are logged with `warn!` and never returned as errors.

use encoding_rs::Encoding;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::constants::{DEFAULT_CHARSET, LOG_TARGET};

static CHARSET_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"charset=([\w-]+)").expect("charset regex must compile"));

/// Labels decoded as true ISO-8859-1.
const LATIN1_LABELS: &[&str] =
    &["iso-8859-1", "iso8859-1", "iso88591", "iso_8859-1", "latin1", "l1", "binary", "cp819", "ibm819"];

/// Extract the charset token from a content type, defaulting to `utf-8`.
///
/// The `charset=` key is matched case-sensitively and the token may only
/// contain word characters and hyphens.
///
/// # Examples
///
/// ```rust
/// use response_regex::decode::charset_from_content_type;
///
/// assert_eq!(charset_from_content_type(Some("text/html; charset=ISO-8859-1")), "ISO-8859-1");
/// assert_eq!(charset_from_content_type(Some("application/json")), "utf-8");
/// assert_eq!(charset_from_content_type(None), "utf-8");
/// ```
#[must_use]
pub fn charset_from_content_type(content_type: Option<&str>) -> &str {
    content_type
        .and_then(|ct| CHARSET_PATTERN.captures(ct))
        .and_then(|caps| caps.get(1))
        .map_or(DEFAULT_CHARSET, |m| m.as_str())
}

/// Decode a response body according to its declared content type.
///
/// A byte-order mark matching the charset is stripped. Malformed sequences
/// are replaced with U+FFFD; unknown charsets fall back to [`decode_latin1`].
#[must_use]
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> String {
    let charset = charset_from_content_type(content_type);

    if LATIN1_LABELS.iter().any(|label| label.eq_ignore_ascii_case(charset)) {
        debug!(target: LOG_TARGET, charset, len = bytes.len(), "Decoded response body as latin1");
        return decode_latin1(bytes);
    }

    let Some(encoding) = Encoding::for_label(charset.as_bytes()) else {
        warn!(target: LOG_TARGET, charset, "Failed to decode body: unknown charset, using byte mapping");
        return decode_latin1(bytes);
    };

    let (text, had_errors) = encoding.decode_with_bom_removal(bytes);
    if had_errors {
        warn!(
            target: LOG_TARGET,
            charset,
            encoding = encoding.name(),
            "Malformed input in body, replaced with U+FFFD"
        );
    } else {
        debug!(target: LOG_TARGET, encoding = encoding.name(), len = bytes.len(), "Decoded response body");
    }
    text.into_owned()
}

/// Map each byte to the character with the same code point.
#[must_use]
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().copied().map(char::from).collect()
}
