//! Percent-encoding of free text into a URL query component.
//!
//! Classification follows RFC 2396: ASCII letters and digits always pass
//! through, the *reserved* and *mark* punctuation sets pass through only on
//! request, and every other byte of the UTF-8 form becomes `%XX` with
//! uppercase hex digits.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::charset;
use crate::error::Result;

/// RFC 2396 `reserved`.
pub const RESERVED: &[u8] = b";/?:@&=+$,";

/// RFC 2396 `mark`.
pub const MARK: &[u8] = b"_.!~*'()-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingOptions {
    pub preserve_reserved: bool,
    pub preserve_mark: bool,
    pub spaces_as_plus: bool,
}

impl Default for EncodingOptions {
    fn default() -> Self {
        Self {
            preserve_reserved: false,
            preserve_mark: false,
            spaces_as_plus: true,
        }
    }
}

impl EncodingOptions {
    /// Options used for search queries: reserved punctuation stays literal
    /// so operators like `site:` or `a+b` keep their meaning.
    pub fn query() -> Self {
        Self {
            preserve_reserved: true,
            ..Self::default()
        }
    }

    fn escape_set(&self) -> &'static AsciiSet {
        let index = usize::from(self.preserve_reserved)
            | usize::from(self.preserve_mark) << 1
            | usize::from(self.spaces_as_plus) << 2;
        &ESCAPE_SETS[index]
    }
}

/// Every flag combination, indexed by `reserved | mark << 1 | plus << 2`.
static ESCAPE_SETS: [AsciiSet; 8] = [
    build_set(false, false, false),
    build_set(true, false, false),
    build_set(false, true, false),
    build_set(true, true, false),
    build_set(false, false, true),
    build_set(true, false, true),
    build_set(false, true, true),
    build_set(true, true, true),
];

const fn build_set(preserve_reserved: bool, preserve_mark: bool, spaces_as_plus: bool) -> AsciiSet {
    let mut set = NON_ALPHANUMERIC.add(b' ');
    if spaces_as_plus {
        set = set.remove(b' ');
    }
    if preserve_reserved {
        set = without(set, RESERVED);
    }
    if preserve_mark {
        set = without(set, MARK);
    }
    set
}

const fn without(mut set: AsciiSet, bytes: &[u8]) -> AsciiSet {
    let mut i = 0;
    while i < bytes.len() {
        set = set.remove(bytes[i]);
        i += 1;
    }
    set
}

/// Percent-encodes `input`. Empty input gives empty output.
pub fn encode(input: &str, options: &EncodingOptions) -> String {
    let set = options.escape_set();
    let encoded = utf8_percent_encode(input, set).to_string();

    // Space is the only byte left unescaped that is not URL-safe; with
    // `spaces_as_plus` every raw space in the output came from the input.
    if options.spaces_as_plus {
        encoded.replace(' ', "+")
    } else {
        encoded
    }
}

/// Transcodes `input` from `charset` (UTF-8 when `None`) and percent-encodes
/// the result.
pub fn encode_bytes(input: &[u8], charset: Option<&str>, options: &EncodingOptions) -> Result<String> {
    let text = charset::to_utf8(input, charset)?;
    Ok(encode(&text, options))
}
