// ==============================================================================
// Template
// ==============================================================================
//
// A compiled URL template. Construction parses every placeholder, encodes
// the literal fragments for the component they sit in, and derives the
// schema; all of it is cached behind an `Arc` so clones are cheap and a
// template can be shared across threads. Binding only resolves values,
// sanitizes, normalizes and applies the query operation.

use std::{fmt, str::FromStr, sync::Arc};

use crate::{
    Error,
    classify::{Lookahead, classify},
    diagnostics::Diagnostics,
    encode::encode_rfc3986,
    normalize::{Format, normalize},
    params::{Params, Value},
    query::replace_query_with,
    resolve::resolve,
    sanitize::Assembly,
    schema::Schema,
    syntax::{Placeholder, split_braces},
};

// ==============================================================================
// Slot
// ==============================================================================

/// A placeholder argument: syntax parsed into a [`Placeholder`], or a value
/// embedded as is.
#[derive(Clone, Debug, PartialEq)]
pub enum Slot {
    /// Placeholder syntax such as `"userId"` or `"scheme://host?"`.
    Syntax(String),
    /// A string or number encoded into the URL on every bind.
    Direct(Value),
}

impl Slot {
    /// A direct value.
    pub fn direct(value: impl Into<Value>) -> Self {
        Self::Direct(value.into())
    }
}

impl From<&str> for Slot {
    fn from(raw: &str) -> Self {
        Self::Syntax(raw.to_owned())
    }
}

impl From<String> for Slot {
    fn from(raw: String) -> Self {
        Self::Syntax(raw)
    }
}

/// A compiled slot.
#[derive(Debug)]
enum Segment {
    Placeholder(Placeholder),
    /// Already encoded.
    Direct(String),
}

impl Segment {
    fn compile(index: usize, slot: Slot) -> Result<Self, Error> {
        match slot {
            Slot::Syntax(raw) => Placeholder::parse(&raw).map(Self::Placeholder),
            Slot::Direct(Value::Str(text)) if text.is_empty() => {
                Err(Error::EmptyDirectValue { index })
            }
            Slot::Direct(value @ (Value::Str(_) | Value::Int(_) | Value::Float(_))) => value
                .path_text()
                .map(|text| Self::Direct(encode_rfc3986(&text)))
                .ok_or(Error::EmptyDirectValue { index }),
            Slot::Direct(other) => Err(Error::InvalidDirectValue {
                received: other.json(),
            }),
        }
    }

    fn lookahead(&self) -> Lookahead {
        match self {
            Self::Placeholder(placeholder) => Lookahead {
                scheme: placeholder.kind().starts_with_scheme(),
                slash: placeholder.raw().contains('/'),
            },
            Self::Direct(_) => Lookahead::default(),
        }
    }
}

// ==============================================================================
// Template
// ==============================================================================

struct Inner {
    /// Encoded literals, one more than `segments`.
    literals: Vec<String>,
    segments: Vec<Segment>,
    format: Format,
    schema: Schema,
    text: String,
    diagnostics: Diagnostics,
}

/// A URL template, compiled once and bound many times.
///
/// ```
/// use url_template::{Params, Template};
///
/// let template = Template::parse("https://example.com/users/{userId}/{...paths?}")?;
/// let url = template.bind(&Params::new().set("userId", 279_642).set("paths", ["a b", "c"]))?;
/// assert_eq!(url, "https://example.com/users/279642/a%20b/c");
///
/// let template = Template::new(
///     ["", "/users/", ""],
///     ["scheme://host?", "/userId?/"],
/// )?;
/// assert_eq!(template.bind(&Params::new())?, "/users/");
/// # Ok::<(), url_template::Error>(())
/// ```
#[derive(Clone)]
pub struct Template {
    inner: Arc<Inner>,
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("template", &self.inner.text)
            .finish_non_exhaustive()
    }
}

impl Template {
    /// Compiles interleaved literals and placeholders, logging warnings
    /// through [`Diagnostics::default`].
    ///
    /// # Errors
    ///
    /// - [`Error::TemplateArity`] unless there is exactly one more literal
    ///   than placeholders.
    /// - [`Error::InvalidPlaceholder`] for bad placeholder syntax, and
    ///   [`Error::InvalidDirectValue`] or [`Error::EmptyDirectValue`] for a
    ///   bad direct value.
    /// - [`Error::ConflictingPlaceholder`] when a bind key is declared twice
    ///   with different shapes.
    pub fn new<L, P>(literals: L, placeholders: P) -> Result<Self, Error>
    where
        L: IntoIterator,
        L::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<Slot>,
    {
        compile(
            &literals.into_iter().map(Into::into).collect::<Vec<_>>(),
            placeholders.into_iter().map(Into::into).collect(),
            Diagnostics::default(),
        )
    }

    /// Compiles a brace template such as `https://{host}/users/{userId}`.
    ///
    /// # Errors
    ///
    /// [`Error::UnclosedBrace`] or [`Error::UnmatchedBrace`] for unbalanced
    /// braces, plus the errors of [`Template::new`].
    pub fn parse(template: &str) -> Result<Self, Error> {
        let (literals, placeholders) = split_braces(template)?;
        Self::new(literals, placeholders)
    }

    /// Starts a template piece by piece.
    #[must_use]
    pub fn builder() -> TemplateBuilder {
        TemplateBuilder::default()
    }

    /// The template as written, with placeholders shown as `${"syntax"}`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.inner.text
    }

    /// The bind keys this template reads.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.inner.schema
    }

    /// Binds `params` into the template.
    ///
    /// Warnings go to the sink the template was built with.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value, or [`Error::InvalidUrl`] when the
    /// assembled URL does not parse.
    pub fn bind(&self, params: &Params) -> Result<String, Error> {
        let inner = &*self.inner;
        let diagnostics = &inner.diagnostics;
        let mut assembly = Assembly::default();

        for (index, literal) in inner.literals.iter().enumerate() {
            let literal = if assembly.ends_with_slash() {
                literal.trim_start_matches('/')
            } else {
                literal
            };
            assembly.push_literal(literal);

            match inner.segments.get(index) {
                None => break,
                Some(Segment::Direct(text)) => assembly.push_embedded(text),
                Some(Segment::Placeholder(placeholder)) => {
                    resolve(placeholder, params, &mut assembly, diagnostics)?;
                }
            }
        }

        let path = assembly.into_sanitized(diagnostics);
        let url = normalize(&path, inner.format, diagnostics)?;
        Ok(replace_query_with(
            &url,
            params.query_operation(),
            params.fragment_text(),
            diagnostics,
        ))
    }
}

impl FromStr for Template {
    type Err = Error;

    fn from_str(template: &str) -> Result<Self, Self::Err> {
        Self::parse(template)
    }
}

fn compile(
    literals: &[String],
    slots: Vec<Slot>,
    diagnostics: Diagnostics,
) -> Result<Template, Error> {
    if literals.len() != slots.len() + 1 {
        return Err(Error::TemplateArity {
            literals: literals.len(),
            placeholders: slots.len(),
        });
    }

    let text = template_text(literals, &slots);
    let segments = slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| Segment::compile(index, slot))
        .collect::<Result<Vec<_>, _>>()?;
    let schema = Schema::from_placeholders(segments.iter().filter_map(|segment| match segment {
        Segment::Placeholder(placeholder) => Some(placeholder),
        Segment::Direct(_) => None,
    }))?;

    let lookahead: Vec<Lookahead> = segments.iter().map(Segment::lookahead).collect();
    let literals = classify(literals, &lookahead, &text, &diagnostics);
    let format = Format::new(
        literals.first().map_or("", String::as_str),
        match segments.first() {
            Some(Segment::Placeholder(placeholder)) => Some(placeholder.raw()),
            _ => None,
        },
    );

    tracing::debug!(template = %text, placeholders = segments.len(), "compiled URL template");

    Ok(Template {
        inner: Arc::new(Inner {
            literals,
            segments,
            format,
            schema,
            text,
            diagnostics,
        }),
    })
}

/// Renders `literal${"syntax"}literal${[direct]}...`.
fn template_text(literals: &[String], slots: &[Slot]) -> String {
    let mut text = String::new();
    for (index, literal) in literals.iter().enumerate() {
        text.push_str(literal);
        match slots.get(index) {
            Some(Slot::Syntax(raw)) => {
                text.push_str("${");
                text.push_str(&serde_json::Value::from(raw.as_str()).to_string());
                text.push('}');
            }
            Some(Slot::Direct(value)) => {
                text.push_str("${[");
                text.push_str(&value.json());
                text.push_str("]}");
            }
            None => {}
        }
    }
    text
}

// ==============================================================================
// TemplateBuilder
// ==============================================================================

/// Assembles a template from literals and placeholders in order.
///
/// Consecutive literals are concatenated; consecutive placeholders get an
/// empty literal between them.
///
/// ```
/// use url_template::{Diagnostics, Params, Slot, Template};
///
/// let (diagnostics, warnings) = Diagnostics::collector();
/// let template = Template::builder()
///     .literal("https://example.com/")
///     .placeholder("...paths")
///     .literal("/")
///     .direct("v 1")
///     .diagnostics(diagnostics)
///     .build()?;
///
/// let url = template.bind(&Params::new().set("paths", ["a", "b"]))?;
/// assert_eq!(url, "https://example.com/a/b/v%201");
/// assert!(warnings.is_empty());
/// # Ok::<(), url_template::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct TemplateBuilder {
    literals: Vec<String>,
    slots: Vec<Slot>,
    diagnostics: Diagnostics,
}

impl Default for TemplateBuilder {
    fn default() -> Self {
        Self {
            literals: vec![String::new()],
            slots: Vec::new(),
            diagnostics: Diagnostics::default(),
        }
    }
}

impl TemplateBuilder {
    /// Appends literal text.
    #[must_use]
    pub fn literal(mut self, text: &str) -> Self {
        if let Some(last) = self.literals.last_mut() {
            last.push_str(text);
        }
        self
    }

    /// Appends a placeholder.
    #[must_use]
    pub fn placeholder(mut self, slot: impl Into<Slot>) -> Self {
        self.slots.push(slot.into());
        self.literals.push(String::new());
        self
    }

    /// Appends a direct value.
    #[must_use]
    pub fn direct(self, value: impl Into<Value>) -> Self {
        self.placeholder(Slot::direct(value))
    }

    /// Appends a brace template.
    ///
    /// # Errors
    ///
    /// [`Error::UnclosedBrace`] or [`Error::UnmatchedBrace`] for unbalanced
    /// braces.
    pub fn braces(mut self, template: &str) -> Result<Self, Error> {
        let (literals, placeholders) = split_braces(template)?;
        let mut literals = literals.into_iter();
        if let Some(first) = literals.next() {
            self = self.literal(&first);
        }
        for (literal, placeholder) in literals.zip(placeholders) {
            self = self.placeholder(placeholder).literal(&literal);
        }
        Ok(self)
    }

    /// Sets the warning sink used at construction and on every bind.
    #[must_use]
    pub fn diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Compiles the template.
    ///
    /// # Errors
    ///
    /// The errors of [`Template::new`].
    pub fn build(self) -> Result<Template, Error> {
        compile(&self.literals, self.slots, self.diagnostics)
    }
}
