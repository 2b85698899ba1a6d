// ==============================================================================
// RFC 3986 Percent-Encoding
// ==============================================================================
//
// Everything outside the unreserved set `A-Z a-z 0-9 - . _ ~` is encoded as
// UTF-8 bytes with uppercase hex. This includes `! ' ( ) *`, which some
// component encoders leave alone even though RFC 3986 reserves them.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters encoded by [`encode_rfc3986`]: every ASCII byte except the
/// unreserved marks. Non-ASCII bytes are always encoded.
const RFC3986: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encodes `input` so that only RFC 3986 unreserved characters
/// remain.
///
/// Already-encoded input is encoded again (`%20` becomes `%2520`).
///
/// ```
/// use url_template::encode_rfc3986;
///
/// assert_eq!(encode_rfc3986("a b!"), "a%20b%21");
/// assert_eq!(encode_rfc3986("🐹"), "%F0%9F%90%B9");
/// ```
#[must_use]
pub fn encode_rfc3986(input: &str) -> String {
    utf8_percent_encode(input, RFC3986).to_string()
}

/// Encodes a single character, appending the result to `out`.
#[allow(clippy::redundant_pub_crate)] // Explicit crate visibility on private-module item.
pub(crate) fn push_encoded_char(out: &mut String, ch: char) {
    let mut buf = [0; 4];
    out.extend(utf8_percent_encode(ch.encode_utf8(&mut buf), RFC3986));
}

/// Returns `true` for RFC 3986 unreserved characters.
#[allow(clippy::redundant_pub_crate)] // Explicit crate visibility on private-module item.
pub(crate) const fn is_unreserved(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '-' | '.' | '_' | '~')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreserved_is_untouched() {
        let text = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";
        assert_eq!(encode_rfc3986(text), text);
    }

    #[test]
    fn empty_string() {
        assert_eq!(encode_rfc3986(""), "");
    }

    #[test]
    fn sub_delims_are_encoded() {
        assert_eq!(encode_rfc3986("!'()*"), "%21%27%28%29%2A");
    }

    #[test]
    fn reserved_delimiters_are_encoded() {
        assert_eq!(encode_rfc3986(":/?#[]@"), "%3A%2F%3F%23%5B%5D%40");
        assert_eq!(encode_rfc3986("$&+,;="), "%24%26%2B%2C%3B%3D");
    }

    #[test]
    fn multibyte_characters() {
        assert_eq!(encode_rfc3986("é"), "%C3%A9");
        assert_eq!(encode_rfc3986("🐹"), "%F0%9F%90%B9");
    }

    #[test]
    fn encoding_is_not_idempotent() {
        assert_eq!(encode_rfc3986("%20"), "%2520");
    }

    #[test]
    fn single_char_matches_string_encoding() {
        let mut out = String::new();
        for ch in ['a', ' ', '%', '🐹', '~'] {
            push_encoded_char(&mut out, ch);
        }
        assert_eq!(out, encode_rfc3986("a %🐹~"));
    }
}
