// ==============================================================================
// Path Normalizer & URL Validator
// ==============================================================================
//
// Collapses repeated slashes outside the scheme delimiter, keeps relative
// templates relative, and checks anything that starts with a scheme (or a
// protocol-relative `//`) with the WHATWG parser from the `url` crate. The
// parser's canonical form also decides how many slashes follow the scheme.

use url::Url;

use crate::{Error, diagnostics::Diagnostics};

const RELATIVE_TO_ROOT: &str = "It is dangerous to try to generate a root path from a template that assumes a relative path.\nplease improve `${\"foo?\"}/bar` to `${\"foo?/\"}bar`.";
const SLASH_COMPLETED: &str =
    "Slash in front of the authority component was missing and has been completed.";

/// How the template starts, decided once at construction.
#[allow(clippy::redundant_pub_crate)] // Explicit crate visibility on private-module item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Format {
    /// The first literal starts with a single `/`.
    pub(crate) root_path: bool,
    /// The output may start with `//`: the first literal does, or the first
    /// placeholder is an optional scheme or a `scheme://` form.
    pub(crate) possibly_protocol_relative: bool,
}

impl Format {
    /// `first_literal` is the encoded first literal; `first_placeholder` the
    /// raw syntax of the first placeholder, if it has one.
    pub(crate) fn new(first_literal: &str, first_placeholder: Option<&str>) -> Self {
        let protocol_relative = first_literal.starts_with("//");
        let scheme_first = first_placeholder.is_some_and(|raw| {
            ["scheme:?", "scheme://host", "scheme://authority"]
                .iter()
                .any(|prefix| raw.starts_with(prefix))
        });
        Self {
            root_path: !protocol_relative && first_literal.starts_with('/'),
            possibly_protocol_relative: protocol_relative || scheme_first,
        }
    }
}

/// Normalizes an assembled URL without its query operation applied.
///
/// # Errors
///
/// Returns [`Error::InvalidUrl`] when a URL with a scheme or a leading `//`
/// does not parse.
#[allow(clippy::redundant_pub_crate)] // Explicit crate visibility on private-module item.
pub(crate) fn normalize(
    path: &str,
    format: Format,
    diagnostics: &Diagnostics,
) -> Result<String, Error> {
    let left = left_part(path, format.possibly_protocol_relative);
    let right = collapse_slashes(&path[left.len()..]);
    let right = if left.ends_with('/') {
        right.trim_start_matches('/')
    } else {
        &right
    };
    let mut url = format!("{left}{right}");

    if !format.possibly_protocol_relative && !format.root_path && url.starts_with('/') {
        diagnostics.warn(RELATIVE_TO_ROOT);
        url = url.trim_start_matches('/').to_owned();
    }

    if left.is_empty() {
        return Ok(url);
    }

    let invalid = |url: &str| Error::InvalidUrl {
        url: url.to_owned(),
    };
    if url.starts_with("//") {
        Url::parse(&format!("https:{url}")).map_err(|_| invalid(&url))?;
        return Ok(url);
    }

    let parsed = Url::parse(&url).map_err(|_| invalid(&url))?;
    let canonical = scheme_delimiter(parsed.as_str());
    let written = scheme_delimiter(&url);
    if canonical == written {
        return Ok(url);
    }
    diagnostics.warn(SLASH_COMPLETED);
    let start = url.find(':').unwrap_or_default();
    Ok(format!(
        "{}{canonical}{}",
        &url[..start],
        &url[start + written.len()..]
    ))
}

/// The prefix that is never collapsed: `file:` with up to three slashes,
/// `<scheme>:` with up to two, or `//` when the URL may be
/// protocol-relative.
fn left_part(path: &str, possibly_protocol_relative: bool) -> &str {
    let with_slashes = |prefix_len: usize, max: usize| {
        let slashes = path[prefix_len..]
            .bytes()
            .take(max)
            .take_while(|&b| b == b'/')
            .count();
        &path[..prefix_len + slashes]
    };

    if path.starts_with("file:") {
        return with_slashes("file:".len(), 3);
    }
    if let Some(colon) = path.find(':')
        && colon > 0
        && !path[..colon].contains('/')
    {
        return with_slashes(colon + 1, 2);
    }
    if possibly_protocol_relative && path.starts_with("//") {
        return &path[..2];
    }
    ""
}

fn collapse_slashes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if !(ch == '/' && out.ends_with('/')) {
            out.push(ch);
        }
    }
    out
}

/// The first `:` and the slashes after it.
fn scheme_delimiter(url: &str) -> &str {
    url.find(':').map_or("", |colon| {
        let slashes = url[colon + 1..].bytes().take_while(|&b| b == b'/').count();
        &url[colon..=colon + slashes]
    })
}
