// ==============================================================================
// Query Merge Engine
// ==============================================================================
//
// Rewrites the query and fragment of a URL (or bare path) in place. The base
// query is parsed into ordered key/value pairs, the operation sets, appends
// or deletes pairs, and the result is serialized again. Base pairs keep
// their encoded text; new keys and values are encoded exactly once.

use std::collections::HashSet;

use crate::{
    diagnostics::Diagnostics,
    encode::encode_rfc3986,
    params::format_number,
};

// ==============================================================================
// QueryValue
// ==============================================================================

/// The value of one key in a [`Query`] operation.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryValue {
    /// Removes every existing pair for the key.
    Delete,
    /// Ignored.
    Skip,
    /// Serialized as a bare key without `=`.
    Null,
    /// Serialized as `true` or `false`.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A number. `NaN` is serialized as `NaN` with a warning.
    Float(f64),
    /// A string, percent-encoded on output. `""` yields `key=`.
    Str(String),
    /// Each element is applied in order under the same key.
    List(Vec<Self>),
}

macro_rules! query_value_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for QueryValue {
                fn from(value: $ty) -> Self {
                    Self::Int(i64::from(value))
                }
            }
        )*
    };
}

query_value_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f64> for QueryValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for QueryValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Skip, Into::into)
    }
}

impl<T: Into<Self>> From<Vec<T>> for QueryValue {
    fn from(value: Vec<T>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Self>, const N: usize> From<[T; N]> for QueryValue {
    fn from(value: [T; N]) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

// ==============================================================================
// Query
// ==============================================================================

/// An operation on the query string of a URL.
///
/// ```
/// use url_template::{Query, QueryValue, replace_query};
///
/// let query = Query::map([("bar", QueryValue::from(20)), ("foo", QueryValue::Delete)]);
/// assert_eq!(replace_query("/path?foo=1&bar=2", Some(&query), None), "/path?bar=20");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Query {
    /// Removes the whole query.
    Delete,
    /// Keys in order. The first occurrence of a key replaces existing pairs,
    /// later occurrences append.
    Map(Vec<(String, QueryValue)>),
    /// Always appends. `None` entries are ignored.
    Tuples(Vec<Option<(String, QueryValue)>>),
    /// An already-encoded query string such as `"?foo=1&bar=2"`.
    Raw(String),
    /// Decoded key/value pairs, merged like [`Query::Map`].
    Pairs(Vec<(String, String)>),
}

impl Query {
    /// Builds a [`Query::Map`].
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<QueryValue>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    /// Builds a [`Query::Tuples`] with no ignored entries.
    pub fn tuples<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<QueryValue>,
    {
        Self::Tuples(
            entries
                .into_iter()
                .map(|(key, value)| Some((key.into(), value.into())))
                .collect(),
        )
    }

    /// Builds a [`Query::Raw`].
    pub fn raw(query: impl Into<String>) -> Self {
        Self::Raw(query.into())
    }

    /// Builds a [`Query::Pairs`].
    pub fn pairs<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Pairs(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

// ==============================================================================
// Public operations
// ==============================================================================

/// Replaces the query and fragment of `url`, logging warnings through
/// [`Diagnostics::default`].
///
/// `None` leaves that part untouched (a lone trailing `?` is still removed),
/// [`Query::Delete`] drops the query and an empty fragment drops the
/// fragment.
///
/// ```
/// use url_template::{Query, replace_query};
///
/// let url = replace_query("https://example.com/?a=1", Some(&Query::map([("b", 2)])), Some("top"));
/// assert_eq!(url, "https://example.com/?a=1&b=2#top");
/// ```
#[must_use]
pub fn replace_query(url: &str, query: Option<&Query>, fragment: Option<&str>) -> String {
    replace_query_with(url, query, fragment, &Diagnostics::default())
}

/// [`replace_query`] with an explicit warning sink.
#[must_use]
pub fn replace_query_with(
    url: &str,
    query: Option<&Query>,
    fragment: Option<&str>,
    diagnostics: &Diagnostics,
) -> String {
    let split = Split::new(url);
    let mut url = match query {
        Some(Query::Delete) => format!("{}{}", split.head, split.tail),
        None if split.query.is_empty() => url.to_owned(),
        _ => format!(
            "{}{}{}",
            split.head,
            merge(split.query, query, diagnostics),
            split.tail
        ),
    };

    if let Some(fragment) = fragment {
        if let Some(hash) = url.find('#') {
            url.truncate(hash);
        }
        if !fragment.is_empty() {
            url.push('#');
            url.push_str(&encode_rfc3986(fragment));
        }
    }
    url
}

/// Renders a query operation on its own. The result always starts with
/// `?`, and is just `"?"` when nothing remains.
///
/// ```
/// use url_template::{Query, stringify_query};
///
/// assert_eq!(stringify_query(None, None), "?");
/// assert_eq!(stringify_query(Some(&Query::map([("foo", [1, 2])])), None), "?foo=1&foo=2");
/// ```
#[must_use]
pub fn stringify_query(query: Option<&Query>, fragment: Option<&str>) -> String {
    stringify_query_with(query, fragment, &Diagnostics::default())
}

/// [`stringify_query`] with an explicit warning sink.
#[must_use]
pub fn stringify_query_with(
    query: Option<&Query>,
    fragment: Option<&str>,
    diagnostics: &Diagnostics,
) -> String {
    let replaced = replace_query_with("", query, fragment, diagnostics);
    format!("?{}", replaced.strip_prefix('?').unwrap_or(&replaced))
}

// ==============================================================================
// Split
// ==============================================================================

/// A URL cut around its query. The query starts at the first `?` that comes
/// before any `#`, and runs up to the `#` or the end.
struct Split<'a> {
    head: &'a str,
    query: &'a str,
    tail: &'a str,
}

impl<'a> Split<'a> {
    fn new(url: &'a str) -> Self {
        let Some(start) = url.find(['?', '#']) else {
            return Self {
                head: url,
                query: "",
                tail: "",
            };
        };
        let (head, rest) = url.split_at(start);
        if rest.starts_with('#') {
            return Self {
                head,
                query: "",
                tail: rest,
            };
        }
        let (query, tail) = rest.split_at(rest.find('#').unwrap_or(rest.len()));
        Self { head, query, tail }
    }
}

// ==============================================================================
// Merge
// ==============================================================================

fn merge(base: &str, query: Option<&Query>, diagnostics: &Diagnostics) -> String {
    let operation = match query {
        None => return bare(base),
        Some(Query::Raw(raw)) if raw.is_empty() || raw == "?" => return bare(base),
        Some(Query::Delete) => return String::new(),
        Some(operation) => operation,
    };

    let mut pairs = QueryPairs::parse(base);
    let mut appeared = HashSet::new();
    match operation {
        Query::Raw(raw) => {
            let encoded = encode_raw(raw, diagnostics);
            let repaired = repair_equals(&encoded, diagnostics);
            for (key, value) in QueryPairs::parse(&repaired).0 {
                pairs.put(&mut appeared, key, value, false);
            }
        }
        Query::Map(entries) => {
            for (key, value) in entries {
                apply(&mut pairs, &mut appeared, key, value, false, diagnostics);
            }
        }
        Query::Tuples(entries) => {
            for (key, value) in entries.iter().flatten() {
                apply(&mut pairs, &mut appeared, key, value, true, diagnostics);
            }
        }
        Query::Pairs(entries) => {
            for (key, value) in entries {
                pairs.put(
                    &mut appeared,
                    encode_rfc3986(key),
                    Some(encode_rfc3986(value)),
                    false,
                );
            }
        }
        Query::Delete => {}
    }

    pairs.serialize()
}

/// The base query unchanged, except that a lone `?` disappears.
fn bare(base: &str) -> String {
    if base == "?" {
        String::new()
    } else {
        base.to_owned()
    }
}

fn apply(
    pairs: &mut QueryPairs,
    appeared: &mut HashSet<String>,
    key: &str,
    value: &QueryValue,
    append: bool,
    diagnostics: &Diagnostics,
) {
    let encoded_key = || encode_rfc3986(key);
    let text = match value {
        QueryValue::Skip => return,
        QueryValue::Delete => {
            pairs.delete(&encoded_key());
            return;
        }
        QueryValue::List(items) => {
            for item in items {
                apply(pairs, appeared, key, item, append, diagnostics);
            }
            return;
        }
        QueryValue::Null => None,
        QueryValue::Bool(b) => Some(b.to_string()),
        QueryValue::Int(i) => Some(i.to_string()),
        QueryValue::Float(f) => {
            if f.is_nan() {
                diagnostics.warn(format!(
                    "Invalid query value for key \"{key}\". Received: NaN"
                ));
            }
            Some(encode_rfc3986(&format_number(*f)))
        }
        QueryValue::Str(s) => Some(encode_rfc3986(s)),
    };
    pairs.put(appeared, encoded_key(), text, append);
}

// ==============================================================================
// Raw query strings
// ==============================================================================

/// Characters a raw query string may contain as-is.
const fn is_query_safe(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '%' | '&' | '=' | '-' | '.' | '~')
}

/// Encodes every run of unsafe characters, warning once per run. A leading
/// `?` is the query delimiter and stays.
fn encode_raw(raw: &str, diagnostics: &Diagnostics) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut run = String::new();
    let mut run_start = 0;
    let mut offset = 0;

    let flush = |run: &mut String, run_start: usize, out: &mut String| {
        if !run.is_empty() {
            diagnostics.warn(format!(
                "The encoding of the string type QueryString is incorrect; pass an RFC3986 compliant QueryString. \"{raw}\" index: {run_start} \"{run}\""
            ));
            out.push_str(&encode_rfc3986(run));
            run.clear();
        }
    };

    for ch in raw.chars() {
        if is_query_safe(ch) || (offset == 0 && ch == '?') {
            flush(&mut run, run_start, &mut out);
            out.push(ch);
        } else {
            if run.is_empty() {
                run_start = offset;
            }
            run.push(ch);
        }
        offset += ch.len_utf16();
    }
    flush(&mut run, run_start, &mut out);
    out
}

/// Drops pairs with an empty key and collapses `==` runs, warning about the
/// first suspicious `&=`, `?=` or `==`.
fn repair_equals(query: &str, diagnostics: &Diagnostics) -> String {
    let suspicious = query
        .as_bytes()
        .windows(2)
        .position(|pair| matches!(pair, [b'?' | b'&' | b'=', b'=']));
    let Some(index) = suspicious else {
        return query.to_owned();
    };
    diagnostics.warn(format!(
        "Incorrect encoding for string type QueryString. Possible encoding omission. \"{query}\" index: {index} \"{}\"",
        query.get(index..index + 2).unwrap_or_default()
    ));

    let mut cleaned = String::with_capacity(query.len());
    let mut chars = query.chars().peekable();
    while let Some(ch) = chars.next() {
        cleaned.push(ch);
        if matches!(ch, '?' | '&') && chars.peek() == Some(&'=') {
            while chars.next_if(|&next| next != '&').is_some() {}
        }
    }

    let mut collapsed = String::with_capacity(cleaned.len());
    let mut previous_equals = false;
    for ch in cleaned.chars() {
        if !(ch == '=' && previous_equals) {
            collapsed.push(ch);
        }
        previous_equals = ch == '=';
    }
    collapsed
}

// ==============================================================================
// QueryPairs
// ==============================================================================

/// Ordered, encoded key/value pairs. `None` is a key without `=`.
#[derive(Debug, Default)]
struct QueryPairs(Vec<(String, Option<String>)>);

impl QueryPairs {
    /// Parses an encoded query. Empty segments vanish and a segment without
    /// `=` gets an empty value.
    fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self(
            query
                .split('&')
                .filter(|segment| !segment.is_empty())
                .map(|segment| match segment.split_once('=') {
                    Some((key, value)) => (key.to_owned(), Some(value.to_owned())),
                    None => (segment.to_owned(), Some(String::new())),
                })
                .collect(),
        )
    }

    /// Sets the first time a key shows up in one operation, appends after.
    fn put(
        &mut self,
        appeared: &mut HashSet<String>,
        key: String,
        value: Option<String>,
        append: bool,
    ) {
        if append || appeared.contains(&key) {
            self.0.push((key, value));
        } else {
            appeared.insert(key.clone());
            self.set(key, value);
        }
    }

    /// Replaces the first pair for `key` and drops the rest, or appends.
    fn set(&mut self, key: String, value: Option<String>) {
        let mut pending = Some(value);
        self.0.retain_mut(|(existing, slot)| {
            if *existing != key {
                return true;
            }
            pending.take().is_some_and(|value| {
                *slot = value;
                true
            })
        });
        if let Some(value) = pending {
            self.0.push((key, value));
        }
    }

    fn delete(&mut self, key: &str) {
        self.0.retain(|(existing, _)| existing != key);
    }

    fn serialize(&self) -> String {
        if self.0.is_empty() {
            return String::new();
        }
        let body = self
            .0
            .iter()
            .map(|(key, value)| match value {
                Some(value) => format!("{key}={value}"),
                None => key.clone(),
            })
            .collect::<Vec<_>>()
            .join("&");
        format!("?{body}")
    }
}
