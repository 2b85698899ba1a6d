// ==============================================================================
// Errors
// ==============================================================================
//
// Fatal problems abort template construction or a bind call. The display
// text of each variant is stable; callers and tests match on it.

/// Errors raised while building a [`Template`](crate::Template) or binding
/// values into it.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The literal and placeholder counts do not interleave.
    #[error(
        "A template needs exactly one more literal than placeholders. Received: {literals} literals and {placeholders} placeholders"
    )]
    TemplateArity {
        /// Number of literal fragments.
        literals: usize,
        /// Number of placeholders.
        placeholders: usize,
    },

    /// The placeholder syntax could not be parsed.
    #[error("Invalid placeholder syntax {raw:?}: {reason}")]
    InvalidPlaceholder {
        /// The raw placeholder text.
        raw: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// A direct placeholder is neither a string nor a number.
    #[error("Invalid placeholder type. Received: {received}")]
    InvalidDirectValue {
        /// The value rendered as JSON.
        received: String,
    },

    /// A direct placeholder renders to the empty string.
    #[error("The value of the index {index} at direct placeholder is empty string.")]
    EmptyDirectValue {
        /// Placeholder position in the template.
        index: usize,
    },

    /// A `{` in a brace template has no closing `}`.
    #[error("unclosed `{{` in URL template: `{template}`")]
    UnclosedBrace {
        /// The template text.
        template: String,
    },

    /// A `}` in a brace template has no opening `{`.
    #[error("unmatched `}}` in URL template: `{template}`")]
    UnmatchedBrace {
        /// The template text.
        template: String,
    },

    /// The same bind key is declared with different shapes.
    #[error("The placeholder \"{name}\" is declared more than once with different kinds or types.")]
    ConflictingPlaceholder {
        /// The bind key.
        name: String,
    },

    /// A required placeholder received an empty string.
    #[error("The required placeholder \"{name}\" was passed an empty string.")]
    RequiredEmpty {
        /// Placeholder name.
        name: String,
    },

    /// A required placeholder received a skip value.
    #[error("The placeholder \"{name}\" in the argument object must be set to a valid value. Received: {received}")]
    RequiredMissing {
        /// Placeholder name.
        name: String,
        /// The rendered value (`undefined`, `null` or `false`).
        received: String,
    },

    /// `NaN` was bound to the port placeholder.
    #[error("The value NaN was passed to the placeholder \"{name}\".")]
    NotANumber {
        /// Placeholder name.
        name: String,
    },

    /// A path placeholder received something other than a string or number.
    #[error("Invalid path value for \"{name}\". Received: {received}")]
    InvalidPathValue {
        /// Placeholder name.
        name: String,
        /// The rendered value.
        received: String,
    },

    /// A spread or subdomain placeholder received a non-array value.
    #[error("The placeholder \"{name}\" in the argument object must be set to an array. Received: {received}")]
    ExpectedArray {
        /// Placeholder name.
        name: String,
        /// The rendered value.
        received: String,
    },

    /// An array element is neither a path value nor a skip value.
    #[error("Invalid {kind} value for index {index}. Received: {received}")]
    InvalidElement {
        /// `spread` or `subdomain`.
        kind: &'static str,
        /// Element index.
        index: usize,
        /// The rendered element.
        received: String,
    },

    /// The userinfo placeholder received something other than a userinfo.
    #[error("The value of the placeholder \"userinfo@\" must be an object with user and password. Received: {received}")]
    InvalidUserinfo {
        /// The rendered value.
        received: String,
    },

    /// The port is not an integer in `0..=65535`.
    #[error("The value of the placeholder \":port\" appropriate port number 0 ~ 65535. Received: {received}")]
    InvalidPort {
        /// The rendered value.
        received: String,
    },

    /// The scheme does not match `^[A-Za-z][A-Za-z0-9+.-]*$`.
    #[error("The value of the placeholder \":scheme\" invalid scheme. Received: {received}")]
    InvalidScheme {
        /// The rendered value.
        received: String,
    },

    /// A scheme-authority value lacks `scheme://` or a leading `//`.
    #[error(
        "The value of the placeholder \"{name}\" must contain \"scheme://\" or Protocol-relative URL. Received: {received}"
    )]
    MissingSchemeAuthority {
        /// Placeholder name.
        name: String,
        /// The bound value.
        received: String,
    },

    /// The authority contains more than one `@` delimiter.
    #[error(
        "The authority component of value of the placeholder \"{name}\" must be \"%40\" to use \"@\" as value instead of delimiter. Received: {received}"
    )]
    DuplicateAt {
        /// Placeholder name.
        name: String,
        /// The bound value.
        received: String,
    },

    /// The userinfo contains more than one `:` delimiter.
    #[error(
        "The userinfo component of value of the placeholder \"{name}\" must be \"%3A\" to use \":\" as value instead of delimiter. Received: {received}"
    )]
    DuplicateColon {
        /// Placeholder name.
        name: String,
        /// The bound value.
        received: String,
    },

    /// The host is empty for a non-`file:` scheme.
    #[error("The host component of value of the placeholder \"{name}\" cannot empty. Received: {received}")]
    EmptyHost {
        /// Placeholder name.
        name: String,
        /// The bound value.
        received: String,
    },

    /// The host contains a character outside `A-Za-z0-9-._~`.
    #[error("The host component of value of the placeholder \"{name}\" cannot contain a \"{ch}\". Received: {received}")]
    InvalidHostChar {
        /// Placeholder name.
        name: String,
        /// First offending character.
        ch: char,
        /// The bound value.
        received: String,
    },

    /// The assembled URL failed to parse.
    #[error("Invalid URL \"{url}\".")]
    InvalidUrl {
        /// The assembled URL.
        url: String,
    },

    /// Parameters could not be built from a serialized value.
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// A parameter key matches no placeholder of the template.
    #[error("The placeholder \"{name}\" does not exist in the template.")]
    UnknownParam {
        /// The supplied key.
        name: String,
    },

    /// A parameter does not match the declared type.
    #[error("The placeholder \"{name}\" expects {expected}. Received: {received}")]
    TypeMismatch {
        /// Placeholder name.
        name: String,
        /// Description of the declared type.
        expected: &'static str,
        /// The rendered value.
        received: String,
    },
}
