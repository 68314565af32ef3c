//! Identification of the terminal's text encoding and transcoding of raw
//! argument bytes into UTF-8 before they are percent-encoded.

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8};
use log::debug;

use crate::error::{Result, WebSearchError};

/// Explicit charset override, checked before any locale variable.
pub const ENCODING_ENV: &str = "WEB_SEARCH_ENCODING";

/// Locale variables consulted for a codeset, highest precedence first.
pub const LOCALE_VARS: [&str; 3] = ["LC_ALL", "LC_CTYPE", "LANG"];

/// Extracts the codeset of a POSIX locale name such as
/// `en_US.ISO-8859-1@euro`. Locales without a codeset (including `C` and
/// `POSIX`) yield `None`, which callers treat as UTF-8.
pub fn codeset_from_locale(locale: &str) -> Option<&str> {
    let (_, rest) = locale.split_once('.')?;
    let codeset = rest.split('@').next().unwrap_or(rest);
    if codeset.is_empty() {
        None
    } else {
        Some(codeset)
    }
}

/// Picks the charset label from an explicit override or the first
/// non-empty locale variable. The first set locale variable wins even
/// when it carries no codeset.
pub fn detect<'a, I>(explicit: Option<&'a str>, locale_values: I) -> Option<&'a str>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    if let Some(label) = explicit.filter(|l| !l.trim().is_empty()) {
        return Some(label.trim());
    }

    locale_values
        .into_iter()
        .flatten()
        .find(|value| !value.is_empty())
        .and_then(codeset_from_locale)
}

/// Converts `bytes` from `charset` into UTF-8. Already-UTF-8 input is
/// borrowed, not copied.
pub fn to_utf8<'a>(bytes: &'a [u8], charset: Option<&str>) -> Result<Cow<'a, str>> {
    let label = charset.unwrap_or("UTF-8");
    let encoding = Encoding::for_label(label.as_bytes()).ok_or_else(|| {
        WebSearchError::EncodingConversion {
            charset: label.to_string(),
            reason: "unsupported source encoding".to_string(),
        }
    })?;

    if encoding != UTF_8 {
        debug!("Transcoding {} query bytes from {}", bytes.len(), encoding.name());
    }

    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .ok_or_else(|| WebSearchError::EncodingConversion {
            charset: encoding.name().to_string(),
            reason: "invalid byte sequence".to_string(),
        })
}
