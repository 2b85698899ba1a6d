// ==============================================================================
// Placeholder Resolver
// ==============================================================================
//
// Turns one bound value into URL text for one placeholder. Every value goes
// through the same gate first: `NaN` is reported, required placeholders
// reject skip values, and optional placeholders with a skip value produce
// nothing. Then the placeholder kind decides how the value is rendered.

use crate::{
    Error,
    diagnostics::Diagnostics,
    encode::{encode_rfc3986, is_unreserved},
    params::{Params, Value},
    sanitize::Assembly,
    syntax::{Placeholder, PlaceholderKind},
};

/// Appends the output of `placeholder` for `params` to `out`.
///
/// # Errors
///
/// Returns the bind-time error for the first invalid value.
#[allow(clippy::redundant_pub_crate)] // Explicit crate visibility on private-module item.
pub(crate) fn resolve(
    placeholder: &Placeholder,
    params: &Params,
    out: &mut Assembly,
    diagnostics: &Diagnostics,
) -> Result<(), Error> {
    let name = placeholder.name();
    let param = params.param(placeholder.key());
    let separator = param.and_then(|param| param.separator.as_deref());

    let Some(value) = gate(placeholder, param.map(|param| &param.value), diagnostics)? else {
        return Ok(());
    };

    let part = match placeholder.kind() {
        PlaceholderKind::SchemeAuthority
        | PlaceholderKind::SchemeHost
        | PlaceholderKind::SchemeAuthorityPath
        | PlaceholderKind::SchemeHostPath => {
            Some(scheme_authority(placeholder, value, diagnostics)?)
        }
        PlaceholderKind::Scheme => Some(scheme(value)?),
        PlaceholderKind::Userinfo => userinfo(value)?,
        PlaceholderKind::Port => Some(port(value)?),
        PlaceholderKind::Subdomain => {
            let joined = join(name, "subdomain", value, separator, ".", diagnostics)?;
            (!joined.is_empty()).then(|| format!("{joined}."))
        }
        PlaceholderKind::Spread => {
            let joined = join(name, "spread", value, separator, "/", diagnostics)?;
            (!joined.is_empty()).then_some(joined)
        }
        PlaceholderKind::Primitive => {
            let text = value.path_text().ok_or_else(|| Error::InvalidPathValue {
                name: name.to_owned(),
                received: match value {
                    Value::List(_) => "Array".to_owned(),
                    other => other.received(),
                },
            })?;
            Some(encode_rfc3986(&text))
        }
    };

    if let Some(part) = part {
        if placeholder.before_slash() {
            out.push_embedded("/");
        }
        out.push_embedded(&part);
        if placeholder.after_slash() {
            out.push_embedded("/");
        }
    }
    Ok(())
}

/// Checks a value against the placeholder's optionality. Returns `None`
/// when the placeholder produces nothing.
fn gate<'a>(
    placeholder: &Placeholder,
    value: Option<&'a Value>,
    diagnostics: &Diagnostics,
) -> Result<Option<&'a Value>, Error> {
    let name = placeholder.name();
    if value.is_some_and(Value::is_nan) {
        if placeholder.kind() == PlaceholderKind::Port {
            return Err(Error::NotANumber {
                name: name.to_owned(),
            });
        }
        diagnostics.warn(format!("The value NaN was passed to the placeholder \"{name}\"."));
        return Ok(value);
    }
    required(name, placeholder.is_optional(), value)
}

/// Drops skip values, failing when the placeholder is required.
#[allow(clippy::redundant_pub_crate)] // Explicit crate visibility on private-module item.
pub(crate) fn required<'a>(
    name: &str,
    optional: bool,
    value: Option<&'a Value>,
) -> Result<Option<&'a Value>, Error> {
    if let Some(value) = value.filter(|value| !value.is_skip()) {
        return Ok(Some(value));
    }
    if optional {
        return Ok(None);
    }
    Err(match value {
        Some(Value::Str(_)) => Error::RequiredEmpty {
            name: name.to_owned(),
        },
        other => Error::RequiredMissing {
            name: name.to_owned(),
            received: other.map_or_else(|| "undefined".to_owned(), Value::json),
        },
    })
}

// ==============================================================================
// Arrays
// ==============================================================================

/// Joins the path values of an array, dropping skip elements. A custom
/// separator is encoded; the default one is used as is.
fn join(
    name: &str,
    kind: &'static str,
    value: &Value,
    separator: Option<&str>,
    default_separator: &str,
    diagnostics: &Diagnostics,
) -> Result<String, Error> {
    let Value::List(items) = value else {
        return Err(Error::ExpectedArray {
            name: name.to_owned(),
            received: value.received(),
        });
    };

    let mut parts = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let text = item.path_text();
        if text.is_none() && !item.is_skip() {
            return Err(Error::InvalidElement {
                kind,
                index,
                received: item.received(),
            });
        }
        if item.is_nan() {
            diagnostics.warn(format!(
                "The value NaN was passed to the index {index} at placeholder \"{name}\"."
            ));
        }
        parts.extend(text.map(|text| encode_rfc3986(&text)));
    }

    let separator = separator.map_or_else(|| default_separator.to_owned(), encode_rfc3986);
    Ok(parts.join(&separator))
}

// ==============================================================================
// Reserved placeholders
// ==============================================================================

fn scheme(value: &Value) -> Result<String, Error> {
    match value {
        Value::Str(scheme) if is_scheme(scheme) => Ok(format!("{scheme}:")),
        other => Err(Error::InvalidScheme {
            received: other.received(),
        }),
    }
}

/// `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`
fn is_scheme(text: &str) -> bool {
    scheme_len(text) == text.len() && !text.is_empty()
}

/// Length of the longest scheme prefix of `text`.
fn scheme_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    if !bytes.first().is_some_and(u8::is_ascii_alphabetic) {
        return 0;
    }
    bytes
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.'))
        .count()
}

fn userinfo(value: &Value) -> Result<Option<String>, Error> {
    let Value::Userinfo(userinfo) = value else {
        return Err(Error::InvalidUserinfo {
            received: value.received(),
        });
    };
    let Some(user) = &userinfo.user else {
        return Ok(None);
    };
    let user = encode_rfc3986(user);
    Ok(Some(
        match userinfo.password.as_deref().filter(|password| !password.is_empty()) {
            Some(password) => format!("{user}:{}@", encode_rfc3986(password)),
            None => format!("{user}@"),
        },
    ))
}

#[allow(clippy::float_cmp, clippy::cast_possible_truncation)] // Only integral floats in range reach the cast.
fn port(value: &Value) -> Result<String, Error> {
    let port = match *value {
        Value::Int(port) => u16::try_from(port).ok(),
        Value::Float(port) if (0.0..=65535.0).contains(&port) && port.fract() == 0.0 => {
            Some(port as u16)
        }
        _ => None,
    };
    port.map(|port| format!(":{port}"))
        .ok_or_else(|| Error::InvalidPort {
            received: value.received(),
        })
}

// ==============================================================================
// Scheme and authority
// ==============================================================================

/// Renders `scheme://authority[/path]` values.
///
/// The value must start with `<scheme>://` or `//`. A query or fragment is
/// dropped, unsafe path characters are encoded, and the authority is
/// checked for stray `@` and `:` delimiters and an invalid host.
fn scheme_authority(
    placeholder: &Placeholder,
    value: &Value,
    diagnostics: &Diagnostics,
) -> Result<String, Error> {
    let name = placeholder.name();
    let received = value.received();
    let error = |make: fn(String, String) -> Error| make(name.to_owned(), received.clone());

    let Value::Str(text) = value else {
        return Err(error(missing_scheme_authority));
    };

    let scheme_len = match scheme_len(text) {
        len if len > 0 && text[len..].starts_with("://") => len + 1,
        _ => 0,
    };
    let (scheme, rest) = text.split_at(scheme_len);
    let rest = rest
        .strip_prefix("//")
        .ok_or_else(|| error(missing_scheme_authority))?;
    let (authority, mut after) = rest.split_at(rest.find(['/', '?', '#']).unwrap_or(rest.len()));

    if let Some(cut) = after.find(['?', '#']) {
        diagnostics.warn(format!(
            "The value of the placeholder \"{name}\" cannot contain a query string or fragment. Received: {text}"
        ));
        after = &after[..cut];
    }
    let after = encode_path_runs(name, text, after, diagnostics);

    let mut authority = authority.strip_suffix(':').unwrap_or(authority);
    if authority.contains('@') {
        authority = authority
            .strip_prefix(":@")
            .or_else(|| authority.strip_prefix('@'))
            .unwrap_or(authority);
        if authority.matches('@').count() > 1 {
            return Err(error(|name, received| Error::DuplicateAt { name, received }));
        }
        if let Some((userinfo, _)) = authority.split_once('@')
            && userinfo.matches(':').count() > 1
        {
            return Err(error(|name, received| Error::DuplicateColon { name, received }));
        }
    }

    let host_and_port = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
    let host = match host_and_port.rsplit_once(':') {
        Some((host, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => host,
        _ => host_and_port,
    };
    if host.is_empty() && scheme != "file:" {
        return Err(error(|name, received| Error::EmptyHost { name, received }));
    }
    if let Some(ch) = host.chars().find(|&ch| !is_unreserved(ch) && ch != '/') {
        return Err(Error::InvalidHostChar {
            name: name.to_owned(),
            ch,
            received,
        });
    }

    let base = format!("{scheme}//{authority}{after}");
    if placeholder.kind().includes_path() {
        return Ok(base.trim_end_matches('/').to_owned());
    }

    if !after.is_empty() && after != "/" {
        diagnostics.warn(format!(
            "The value of the placeholder \"{name}\" cannot contain a path.\nUse the placeholder \"{name}/path\" to include paths. Received: {text}"
        ));
    }
    Ok(if base.ends_with('/') {
        base
    } else {
        format!("{base}/")
    })
}

const fn missing_scheme_authority(name: String, received: String) -> Error {
    Error::MissingSchemeAuthority { name, received }
}

/// Encodes runs of characters that cannot appear in a path, warning about
/// the first one. `%` is kept so encoded input passes through.
fn encode_path_runs(name: &str, text: &str, path: &str, diagnostics: &Diagnostics) -> String {
    let keep = |ch: char| is_unreserved(ch) || matches!(ch, '%' | '/');
    let mut out = String::with_capacity(path.len());
    let mut rest = path;
    let mut warned = false;

    while let Some(start) = rest.find(|ch| !keep(ch)) {
        let end = rest[start..].find(keep).map_or(rest.len(), |len| start + len);
        let run = &rest[start..end];
        if !warned {
            diagnostics.warn(format!(
                "The placeholder \"{name}\" value contain \"{run}\". Percent encoding is required. Received: {text}"
            ));
            warned = true;
        }
        out.push_str(&rest[..start]);
        out.push_str(&encode_rfc3986(run));
        rest = &rest[end..];
    }
    out.push_str(rest);
    out
}
