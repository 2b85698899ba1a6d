// ==============================================================================
// Schema
// ==============================================================================
//
// The parameter shape a template accepts, derived from its placeholders:
// one entry per bind key in template order. Binding never consults the
// schema; `Schema::validate` is an explicit, stricter check that callers
// can run before binding.

use indexmap::IndexMap;

use crate::{
    Error,
    params::{Params, Value},
    resolve::required,
    syntax::{Placeholder, PlaceholderKind, ValueType},
};

/// One bind key of a template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaEntry {
    key: String,
    name: String,
    kind: PlaceholderKind,
    optional: bool,
    value_type: Option<ValueType>,
}

impl SchemaEntry {
    fn new(placeholder: &Placeholder) -> Self {
        Self {
            key: placeholder.key().to_owned(),
            name: placeholder.name().to_owned(),
            kind: placeholder.kind(),
            optional: placeholder.is_optional(),
            value_type: placeholder.value_type(),
        }
    }

    /// The key read from [`Params`].
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The placeholder name used in messages.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// What the placeholder produces.
    #[must_use]
    pub const fn kind(&self) -> PlaceholderKind {
        self.kind
    }

    /// Whether a skip value or a missing key is accepted.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.optional
    }

    /// The declared `:string` or `:number` type, if any.
    #[must_use]
    pub const fn value_type(&self) -> Option<ValueType> {
        self.value_type
    }

    fn expected(&self) -> &'static str {
        match (self.kind, self.value_type) {
            (PlaceholderKind::Primitive, Some(ValueType::String)) => "a string",
            (PlaceholderKind::Primitive, Some(ValueType::Number)) => "a number",
            (PlaceholderKind::Primitive, None) => "a string or a number",
            (PlaceholderKind::Spread | PlaceholderKind::Subdomain, Some(ValueType::String)) => {
                "an array of strings"
            }
            (PlaceholderKind::Spread | PlaceholderKind::Subdomain, Some(ValueType::Number)) => {
                "an array of numbers"
            }
            (PlaceholderKind::Spread | PlaceholderKind::Subdomain, None) => {
                "an array of strings or numbers"
            }
            (PlaceholderKind::Port, _) => "a number",
            (PlaceholderKind::Userinfo, _) => "a userinfo",
            _ => "a string",
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self.kind {
            PlaceholderKind::Primitive => scalar_matches(self.value_type, value),
            PlaceholderKind::Spread | PlaceholderKind::Subdomain => match value {
                Value::List(items) => items
                    .iter()
                    .all(|item| item.is_skip() || scalar_matches(self.value_type, item)),
                _ => false,
            },
            PlaceholderKind::Port => matches!(value, Value::Int(_) | Value::Float(_)),
            PlaceholderKind::Userinfo => matches!(value, Value::Userinfo(_)),
            PlaceholderKind::Scheme
            | PlaceholderKind::SchemeAuthority
            | PlaceholderKind::SchemeHost
            | PlaceholderKind::SchemeAuthorityPath
            | PlaceholderKind::SchemeHostPath => matches!(value, Value::Str(_)),
        }
    }
}

fn scalar_matches(value_type: Option<ValueType>, value: &Value) -> bool {
    match (value_type, value) {
        (Some(ValueType::String) | None, Value::Str(_))
        | (Some(ValueType::Number) | None, Value::Int(_) | Value::Float(_)) => true,
        _ => false,
    }
}

/// The bind keys of a template.
///
/// ```
/// use url_template::{Params, Template};
///
/// let template = Template::parse("/users/{userId:number}/{...paths?:string[]}")?;
/// let schema = template.schema();
/// assert_eq!(schema.len(), 2);
///
/// assert!(schema.validate(&Params::new().set("userId", 1)).is_ok());
/// assert!(schema.validate(&Params::new().set("userId", "1")).is_err());
/// assert!(schema.validate(&Params::new().set("userId", 1).set("other", 2)).is_err());
/// # Ok::<(), url_template::Error>(())
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Schema {
    entries: IndexMap<String, SchemaEntry>,
}

impl Schema {
    /// Collects the entries of `placeholders`. A key may repeat only with
    /// the same shape.
    pub(crate) fn from_placeholders<'a, I>(placeholders: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = &'a Placeholder>,
    {
        let mut entries: IndexMap<String, SchemaEntry> = IndexMap::new();
        for placeholder in placeholders {
            let entry = SchemaEntry::new(placeholder);
            match entries.get(&entry.key) {
                Some(existing) if *existing != entry => {
                    return Err(Error::ConflictingPlaceholder { name: entry.key });
                }
                Some(_) => {}
                None => {
                    entries.insert(entry.key.clone(), entry);
                }
            }
        }
        Ok(Self { entries })
    }

    /// Looks up the entry for a bind key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&SchemaEntry> {
        self.entries.get(key)
    }

    /// Iterates over the entries in template order.
    pub fn entries(&self) -> impl Iterator<Item = &SchemaEntry> {
        self.entries.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Checks `params` against the declared placeholders.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownParam`] for a key no placeholder reads (the first
    ///   in lexical order).
    /// - [`Error::RequiredEmpty`] or [`Error::RequiredMissing`] for a
    ///   required placeholder without a value.
    /// - [`Error::TypeMismatch`] for a value of the wrong shape.
    pub fn validate(&self, params: &Params) -> Result<(), Error> {
        let mut unknown: Vec<&str> = params
            .keys()
            .filter(|key| !self.entries.contains_key(*key))
            .collect();
        unknown.sort_unstable();
        if let Some(name) = unknown.first() {
            return Err(Error::UnknownParam {
                name: (*name).to_owned(),
            });
        }

        for entry in self.entries.values() {
            let Some(value) = required(&entry.name, entry.optional, params.get(&entry.key))? else {
                continue;
            };
            if !entry.accepts(value) {
                return Err(Error::TypeMismatch {
                    name: entry.name.clone(),
                    expected: entry.expected(),
                    received: value.received(),
                });
            }
        }
        Ok(())
    }
}
