// ==============================================================================
// Bind Parameters
// ==============================================================================
//
// Values supplied at bind time, keyed by placeholder bind key. A key that is
// not present behaves like an unset value; `Null`, `false` and `""` are skip
// values that make optional placeholders produce nothing.

mod json;

use std::collections::HashMap;

use crate::query::Query;

// ==============================================================================
// Value
// ==============================================================================

/// A value bound to one placeholder.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// An explicit empty value.
    Null,
    /// A boolean. `false` is a skip value; `true` is never a valid path value.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A floating point number, possibly `NaN`.
    Float(f64),
    /// A string. The empty string is a skip value.
    Str(String),
    /// An array of values for spread and subdomain placeholders.
    List(Vec<Self>),
    /// Credentials for the `userinfo@` placeholder.
    Userinfo(Userinfo),
}

impl Value {
    /// Returns `true` for values that make a placeholder produce nothing.
    #[must_use]
    pub fn is_skip(&self) -> bool {
        match self {
            Self::Null | Self::Bool(false) => true,
            Self::Str(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Returns `true` for `Float(NaN)`.
    #[must_use]
    pub const fn is_nan(&self) -> bool {
        matches!(self, Self::Float(f) if f.is_nan())
    }

    /// Renders a non-empty string or a number as path text, before encoding.
    pub(crate) fn path_text(&self) -> Option<String> {
        match self {
            Self::Str(s) if !s.is_empty() => Some(s.clone()),
            Self::Int(i) => Some(i.to_string()),
            Self::Float(f) => Some(format_number(*f)),
            _ => None,
        }
    }

    /// Renders the value the way it appears after `Received:` in messages.
    pub(crate) fn received(&self) -> String {
        match self {
            Self::Null => "null".to_owned(),
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => format_number(*f),
            Self::Str(s) => s.clone(),
            Self::List(items) => items
                .iter()
                .map(|item| match item {
                    Self::Null => String::new(),
                    other => other.received(),
                })
                .collect::<Vec<_>>()
                .join(","),
            Self::Userinfo(_) => "[object Object]".to_owned(),
        }
    }

    /// Renders the value as a JSON literal, for skip-value messages.
    pub(crate) fn json(&self) -> String {
        match self {
            Self::Str(s) => serde_json::Value::from(s.as_str()).to_string(),
            Self::List(items) => format!(
                "[{}]",
                items.iter().map(Self::json).collect::<Vec<_>>().join(",")
            ),
            Self::Userinfo(_) => "{}".to_owned(),
            Self::Float(f) if !f.is_finite() => "null".to_owned(),
            other => other.received(),
        }
    }
}

/// Formats a float like a script runtime prints numbers: no trailing `.0`
/// for integral values, `NaN` and `Infinity` spelled out, and exponent
/// notation (`1e+21`, `1e-7`) outside `1e-6..1e21`.
#[allow(clippy::redundant_pub_crate)] // Explicit crate visibility on private-module item.
pub(crate) fn format_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_owned()
    } else if value.is_infinite() {
        if value > 0.0 { "Infinity" } else { "-Infinity" }.to_owned()
    } else if value == 0.0 {
        "0".to_owned()
    } else if (1e-6..1e21).contains(&value.abs()) {
        value.to_string()
    } else {
        let exponent = format!("{value:e}");
        match exponent.split_once('e') {
            Some((mantissa, power)) if !power.starts_with('-') => format!("{mantissa}e+{power}"),
            _ => exponent,
        }
    }
}

macro_rules! value_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::Int(i64::from(value))
                }
            }
        )*
    };
}

value_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Value {
    #[allow(clippy::cast_precision_loss)] // Values beyond i64 lose precision like any script number.
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or(Self::Float(value as f64), Self::Int)
    }
}

impl From<usize> for Value {
    #[allow(clippy::cast_precision_loss)] // Values beyond i64 lose precision like any script number.
    fn from(value: usize) -> Self {
        i64::try_from(value).map_or(Self::Float(value as f64), Self::Int)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Self::Float(f64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Self::Str(value.clone())
    }
}

impl From<Userinfo> for Value {
    fn from(value: Userinfo) -> Self {
        Self::Userinfo(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Self>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Self>, const N: usize> From<[T; N]> for Value {
    fn from(value: [T; N]) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

// ==============================================================================
// Userinfo
// ==============================================================================

/// Credentials bound to the `userinfo@` placeholder.
///
/// Nothing is emitted without a user; the password is emitted only when
/// non-empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Userinfo {
    pub(crate) user: Option<String>,
    pub(crate) password: Option<String>,
}

impl Userinfo {
    /// Credentials with a user name and no password.
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: Some(user.into()),
            password: None,
        }
    }

    /// Sets the password.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}

// ==============================================================================
// Params
// ==============================================================================

#[allow(clippy::redundant_pub_crate)] // Explicit crate visibility on private-module item.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Param {
    pub(crate) value: Value,
    pub(crate) separator: Option<String>,
}

/// The values bound into a template, plus the query operation and fragment
/// applied after assembly.
///
/// Custom placeholders are keyed by their bare name (`"userId"` for
/// `"/userId?"`, `"paths"` for `"...paths:number[]"`); reserved placeholders
/// by their reserved form (`"scheme:"`, `":port"`, `"userinfo@"`,
/// `"subdomain."`, `"scheme://host"`, ...).
///
/// ```
/// use url_template::{Params, Query, Userinfo};
///
/// let params = Params::new()
///     .set("userinfo@", Userinfo::new("user").password("secret"))
///     .set("userId", 279_642)
///     .set_with_separator("paths", [2002, 5, 10], "-")
///     .query(Query::map([("key", [1, 2])]))
///     .fragment("hash");
/// # let _ = params;
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Params {
    values: HashMap<String, Param>,
    query: Option<Query>,
    fragment: Option<String>,
}

impl Params {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `value` to `key`, replacing any earlier value.
    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(
            key.into(),
            Param {
                value: value.into(),
                separator: None,
            },
        );
        self
    }

    /// Binds an array value to `key`, joined with `separator` instead of the
    /// placeholder's default separator.
    #[must_use]
    pub fn set_with_separator(
        mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
        separator: impl Into<String>,
    ) -> Self {
        self.values.insert(
            key.into(),
            Param {
                value: value.into(),
                separator: Some(separator.into()),
            },
        );
        self
    }

    /// Sets the query operation applied to the assembled URL.
    #[must_use]
    pub fn query(mut self, query: Query) -> Self {
        self.query = Some(query);
        self
    }

    /// Sets the fragment. An empty fragment removes any existing one.
    #[must_use]
    pub fn fragment(mut self, fragment: impl Into<String>) -> Self {
        self.fragment = Some(fragment.into());
        self
    }

    /// Builds parameters from any value that serializes to an object.
    ///
    /// `"?query"` and `"#fragment"` set the query operation and fragment,
    /// `{ "value": .., "separator": .. }` objects carry a join separator and
    /// `{ "user": .., "password": .. }` objects become a [`Userinfo`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParams`](crate::Error::InvalidParams) if the
    /// value does not serialize to an object of supported shapes.
    pub fn from_serialize<T>(input: &T) -> Result<Self, crate::Error>
    where
        T: serde::Serialize + ?Sized,
    {
        json::params_from_serialize(input)
    }

    /// Returns the value bound to `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key).map(|param| &param.value)
    }

    /// Iterates over the bound keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub(crate) fn param(&self, key: &str) -> Option<&Param> {
        self.values.get(key)
    }

    pub(crate) const fn query_operation(&self) -> Option<&Query> {
        self.query.as_ref()
    }

    pub(crate) fn fragment_text(&self) -> Option<&str> {
        self.fragment.as_deref()
    }
}
