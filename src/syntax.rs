// ==============================================================================
// Placeholder Syntax
// ==============================================================================
//
// A placeholder is written as a short string: a reserved form such as
// `"scheme:"` or `":port?"`, or a custom name with affixes such as
// `"...paths?:number[]"` or `"/userId?/"`. Parsing happens once, when the
// template is built. Brace templates (`"https://{host}/users/{id}"`) are
// split into literals and placeholder strings by the same pass.

use crate::Error;

// ==============================================================================
// PlaceholderKind
// ==============================================================================

/// What a placeholder produces, derived from its syntax.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlaceholderKind {
    /// A single path value (`"userId"`).
    Primitive,
    /// An array joined with `/` (`"...paths"`).
    Spread,
    /// An array joined with `.` plus a trailing `.` (`"subdomain."`).
    Subdomain,
    /// `user[:password]@` (`"userinfo@"`).
    Userinfo,
    /// `:<port>` (`":port"`).
    Port,
    /// `<scheme>:` (`"scheme:"`).
    Scheme,
    /// `"scheme://authority"`.
    SchemeAuthority,
    /// `"scheme://host"`.
    SchemeHost,
    /// `"scheme://authority/path"`.
    SchemeAuthorityPath,
    /// `"scheme://host/path"`.
    SchemeHostPath,
}

/// Reserved placeholder forms, without the optional `?`.
const RESERVED: [(&str, PlaceholderKind); 8] = [
    ("scheme:", PlaceholderKind::Scheme),
    (":port", PlaceholderKind::Port),
    ("userinfo@", PlaceholderKind::Userinfo),
    ("subdomain.", PlaceholderKind::Subdomain),
    ("scheme://host", PlaceholderKind::SchemeHost),
    ("scheme://authority", PlaceholderKind::SchemeAuthority),
    ("scheme://host/path", PlaceholderKind::SchemeHostPath),
    ("scheme://authority/path", PlaceholderKind::SchemeAuthorityPath),
];

fn reserved(body: &str) -> Option<PlaceholderKind> {
    RESERVED
        .iter()
        .find_map(|&(form, kind)| (form == body).then_some(kind))
}

impl PlaceholderKind {
    /// `true` for the placeholders that start with a scheme.
    #[must_use]
    pub const fn starts_with_scheme(self) -> bool {
        matches!(
            self,
            Self::Scheme
                | Self::SchemeAuthority
                | Self::SchemeHost
                | Self::SchemeAuthorityPath
                | Self::SchemeHostPath
        )
    }

    /// `true` for the `scheme://...` family.
    #[must_use]
    pub const fn is_scheme_authority(self) -> bool {
        matches!(
            self,
            Self::SchemeAuthority
                | Self::SchemeHost
                | Self::SchemeAuthorityPath
                | Self::SchemeHostPath
        )
    }

    /// `true` for `scheme://host/path` and `scheme://authority/path`.
    #[must_use]
    pub const fn includes_path(self) -> bool {
        matches!(self, Self::SchemeAuthorityPath | Self::SchemeHostPath)
    }
}

/// A declared `:type` annotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// `:string` or `:string[]`.
    String,
    /// `:number` or `:number[]`.
    Number,
}

// ==============================================================================
// Placeholder
// ==============================================================================

/// A parsed placeholder.
///
/// ```
/// use url_template::{Placeholder, PlaceholderKind};
///
/// let placeholder = Placeholder::parse("/...paths?:number[]/")?;
/// assert_eq!(placeholder.kind(), PlaceholderKind::Spread);
/// assert_eq!(placeholder.name(), "...paths");
/// assert_eq!(placeholder.key(), "paths");
/// assert!(placeholder.is_optional());
/// # Ok::<(), url_template::Error>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Placeholder {
    raw: String,
    name: String,
    kind: PlaceholderKind,
    optional: bool,
    before_slash: bool,
    after_slash: bool,
    value_type: Option<ValueType>,
}

impl Placeholder {
    /// Parses placeholder syntax.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPlaceholder`] for empty names, names
    /// containing `# . / : ? @`, unknown types, `[]` without `...`, or
    /// conditional slashes around a reserved form.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let invalid = |reason| Error::InvalidPlaceholder {
            raw: raw.to_owned(),
            reason,
        };

        let (body, optional) = raw
            .strip_suffix('?')
            .map_or((raw, false), |body| (body, true));
        if let Some(kind) = reserved(body) {
            return Ok(Self {
                raw: raw.to_owned(),
                name: body.to_owned(),
                kind,
                optional,
                before_slash: false,
                after_slash: false,
                value_type: None,
            });
        }

        let before_slash = raw.starts_with('/');
        let inner = raw.strip_prefix('/').unwrap_or(raw);
        let after_slash = inner.ends_with('/');
        let inner = inner.strip_suffix('/').unwrap_or(inner);
        if inner.starts_with('/') || inner.ends_with('/') {
            return Err(invalid("only one conditional slash is allowed on each side"));
        }
        if reserved(inner.strip_suffix('?').unwrap_or(inner)).is_some() {
            return Err(invalid("reserved placeholders do not take conditional slashes"));
        }

        let (spread, rest) = inner
            .strip_prefix("...")
            .map_or((false, inner), |rest| (true, rest));
        let (head, annotation) = rest
            .split_once(':')
            .map_or((rest, None), |(head, annotation)| (head, Some(annotation)));
        let (bare, optional) = head
            .strip_suffix('?')
            .map_or((head, false), |bare| (bare, true));

        if bare.is_empty() {
            return Err(invalid("the name is empty"));
        }
        if bare.contains(['#', '.', '/', ':', '?', '@']) {
            return Err(invalid("names cannot contain `# . / : ? @`"));
        }

        let value_type = match (annotation, spread) {
            (None, _) => None,
            (Some("string"), false) | (Some("string[]"), true) => Some(ValueType::String),
            (Some("number"), false) | (Some("number[]"), true) => Some(ValueType::Number),
            (Some("string[]" | "number[]"), false) => {
                return Err(invalid("`[]` types are only allowed on `...` placeholders"));
            }
            (Some("string" | "number"), true) => {
                return Err(invalid("`...` placeholders take `[]` types"));
            }
            (Some(_), _) => return Err(invalid("the type must be `string` or `number`")),
        };

        Ok(Self {
            raw: raw.to_owned(),
            name: if spread {
                format!("...{bare}")
            } else {
                bare.to_owned()
            },
            kind: if spread {
                PlaceholderKind::Spread
            } else {
                PlaceholderKind::Primitive
            },
            optional,
            before_slash,
            after_slash,
            value_type,
        })
    }

    /// The syntax as written.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The name used in messages: the reserved form, or the custom name
    /// including a leading `...`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The key this placeholder reads from [`Params`](crate::Params).
    #[must_use]
    pub fn key(&self) -> &str {
        self.name.strip_prefix("...").unwrap_or(&self.name)
    }

    /// The kind of placeholder.
    #[must_use]
    pub const fn kind(&self) -> PlaceholderKind {
        self.kind
    }

    /// `true` when skip values are accepted.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.optional
    }

    /// `true` when a `/` is emitted before non-empty output.
    #[must_use]
    pub const fn before_slash(&self) -> bool {
        self.before_slash
    }

    /// `true` when a `/` is emitted after non-empty output.
    #[must_use]
    pub const fn after_slash(&self) -> bool {
        self.after_slash
    }

    /// The declared `:type`, if any.
    #[must_use]
    pub const fn value_type(&self) -> Option<ValueType> {
        self.value_type
    }
}

// ==============================================================================
// Brace templates
// ==============================================================================

/// Splits `https://{host}/users/{id}` into literals and placeholder syntax.
///
/// The literal list is always one longer than the placeholder list.
#[allow(clippy::redundant_pub_crate)] // Explicit crate visibility on private-module item.
pub(crate) fn split_braces(template: &str) -> Result<(Vec<String>, Vec<String>), Error> {
    let mut literals = vec![String::new()];
    let mut placeholders = Vec::new();
    let mut chars = template.chars();

    while let Some(ch) = chars.next() {
        if ch == '{' {
            let mut inner = String::new();
            let mut closed = false;
            for next in chars.by_ref() {
                if next == '}' {
                    closed = true;
                    break;
                }
                inner.push(next);
            }
            if !closed {
                return Err(Error::UnclosedBrace {
                    template: template.to_owned(),
                });
            }
            placeholders.push(inner);
            literals.push(String::new());
        } else if ch == '}' {
            return Err(Error::UnmatchedBrace {
                template: template.to_owned(),
            });
        } else if let Some(literal) = literals.last_mut() {
            literal.push(ch);
        }
    }

    Ok((literals, placeholders))
}
