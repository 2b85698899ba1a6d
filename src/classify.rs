// ==============================================================================
// Fragment Classifier
// ==============================================================================
//
// Walks the literal fragments of a template once, left to right, tracking
// which URI component the text belongs to. Each literal is cut after every
// `?` or `#` and each piece is encoded with the rules of the current
// component. Characters that had to be encoded are reported once per
// component after the whole template has been scanned.

use indexmap::IndexSet;

use crate::{
    diagnostics::Diagnostics,
    encode::{is_unreserved, push_encoded_char},
};

/// The URI component that owns the literal text being scanned.
#[allow(clippy::redundant_pub_crate)] // Explicit crate visibility on private-module item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ComponentTag {
    /// Start of the template: a scheme, or the first segment of a relative
    /// path.
    Scheme,
    /// Right after a scheme placeholder; the next literal decides between
    /// authority and path.
    AfterScheme,
    Authority,
    Path,
    Query,
    Fragment,
}

/// What the classifier needs to know about the placeholder that follows a
/// literal.
#[allow(clippy::redundant_pub_crate)] // Explicit crate visibility on private-module item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Lookahead {
    /// The placeholder starts with a scheme (`scheme:`, `scheme://host`, ...).
    pub(crate) scheme: bool,
    /// The raw placeholder syntax contains a `/`.
    pub(crate) slash: bool,
}

const SINGLE_SLASH: &str =
    "Single slash in front of the authority component was missing and has been completed.";

/// Encodes every literal for the component it belongs to.
///
/// `lookahead[i]` describes the placeholder after `literals[i]`; the last
/// literal has none. `template_text` is the template as written, used in
/// the warnings.
#[allow(clippy::redundant_pub_crate)] // Explicit crate visibility on private-module item.
pub(crate) fn classify<S: AsRef<str>>(
    literals: &[S],
    lookahead: &[Lookahead],
    template_text: &str,
    diagnostics: &Diagnostics,
) -> Vec<String> {
    let mut classifier = Classifier::new(diagnostics);
    let encoded = literals
        .iter()
        .enumerate()
        .map(|(index, literal)| {
            let next = lookahead.get(index).copied().unwrap_or_default();
            classifier.literal(literal.as_ref(), next)
        })
        .collect();
    classifier.report(template_text);
    encoded
}

struct Classifier<'a> {
    tag: ComponentTag,
    path: IndexSet<char>,
    query: IndexSet<char>,
    fragment: IndexSet<char>,
    diagnostics: &'a Diagnostics,
}

impl<'a> Classifier<'a> {
    fn new(diagnostics: &'a Diagnostics) -> Self {
        Self {
            tag: ComponentTag::Scheme,
            path: IndexSet::new(),
            query: IndexSet::new(),
            fragment: IndexSet::new(),
            diagnostics,
        }
    }

    /// Cuts the literal after every `?`/`#`. The final piece is always
    /// empty, which lets a literal that only leads up to a scheme
    /// placeholder settle the state.
    fn literal(&mut self, literal: &str, next: Lookahead) -> String {
        let mut out = String::with_capacity(literal.len());
        let mut rest = literal;
        loop {
            let end = rest.find(['?', '#']).map_or(rest.len(), |mark| mark + 1);
            let (piece, tail) = rest.split_at(end);
            let (body, mark) = match piece.strip_suffix(['?', '#']) {
                Some(body) => (body, piece.chars().last()),
                None => (piece, None),
            };
            self.piece(body, mark, next, &mut out);
            if piece.is_empty() {
                break;
            }
            rest = tail;
        }
        out
    }

    fn piece(&mut self, body: &str, mark: Option<char>, next: Lookahead, out: &mut String) {
        match self.tag {
            ComponentTag::Fragment => return self.fragment_piece(body, mark, out),
            ComponentTag::Query => return self.query_piece(body, mark, out),
            ComponentTag::Path => {}
            ComponentTag::AfterScheme => {
                if let Some(rest) = body.strip_prefix('/') {
                    let doubled = rest.strip_prefix('/');
                    out.push_str(if doubled.is_some() { "//" } else { "/" });
                    let rest = doubled.unwrap_or(rest);
                    self.tag = ComponentTag::Authority;
                    return self.finish(rest, mark, next, out);
                }
                self.tag = ComponentTag::Path;
            }
            ComponentTag::Scheme | ComponentTag::Authority if next.scheme => {
                // Scheme text is validated with the assembled URL.
                self.tag = ComponentTag::AfterScheme;
                out.push_str(body);
                out.extend(mark);
                return;
            }
            ComponentTag::Authority => {}
            ComponentTag::Scheme => {
                if let Some(rest) = self.scheme_prefix(body, out) {
                    return self.finish(rest, mark, next, out);
                }
            }
        }
        self.finish(body, mark, next, out);
    }

    /// Consumes `scheme:` and up to two slashes when a `:` comes before any
    /// `/`. Returns the remaining text.
    fn scheme_prefix<'s>(&mut self, body: &'s str, out: &mut String) -> Option<&'s str> {
        let colon = body.find(':')?;
        if body.find('/').is_some_and(|slash| slash < colon) {
            self.tag = ComponentTag::Path;
            return None;
        }
        let (scheme, rest) = body.split_at(colon + 1);
        out.push_str(scheme);
        let after = rest.strip_prefix("//").or_else(|| rest.strip_prefix('/'));
        match after {
            Some(after) => {
                if rest.len() - after.len() == 1 {
                    self.diagnostics.warn(SINGLE_SLASH);
                }
                out.push_str("//");
                self.tag = ComponentTag::Authority;
                Some(after)
            }
            None => {
                self.tag = ComponentTag::Path;
                Some(rest)
            }
        }
    }

    /// Encodes authority or path text and applies the trailing mark.
    fn finish(&mut self, body: &str, mark: Option<char>, next: Lookahead, out: &mut String) {
        for ch in body.chars() {
            if is_unreserved(ch) {
                out.push(ch);
            } else if ch == '/' {
                self.tag = ComponentTag::Path;
                out.push(ch);
            } else if self.tag == ComponentTag::Authority && matches!(ch, ':' | '@') {
                out.push(ch);
            } else {
                self.path.insert(ch);
                push_encoded_char(out, ch);
            }
        }

        if self.tag != ComponentTag::Path && next.slash {
            self.tag = ComponentTag::Path;
        }
        match mark {
            Some('?') => self.tag = ComponentTag::Query,
            Some('#') => self.tag = ComponentTag::Fragment,
            _ => {}
        }
        out.extend(mark);
    }

    fn query_piece(&mut self, body: &str, mark: Option<char>, out: &mut String) {
        let mut encoded = String::with_capacity(body.len());
        for ch in body.chars() {
            if is_unreserved(ch) || matches!(ch, '/' | '&' | '=') {
                encoded.push(ch);
            } else {
                self.query.insert(ch);
                push_encoded_char(&mut encoded, ch);
            }
        }

        // Only the first `=` of a run is a delimiter.
        let mut previous_equals = false;
        for ch in encoded.chars() {
            if ch == '=' && previous_equals {
                self.query.insert('=');
                out.push_str("%3D");
            } else {
                out.push(ch);
            }
            previous_equals = ch == '=';
        }

        match mark {
            Some('#') => {
                out.push('#');
                self.tag = ComponentTag::Fragment;
            }
            Some(mark) => {
                self.query.insert(mark);
                push_encoded_char(out, mark);
            }
            None => {}
        }
    }

    fn fragment_piece(&mut self, body: &str, mark: Option<char>, out: &mut String) {
        for ch in body.chars().chain(mark) {
            if is_unreserved(ch) || ch == '/' {
                out.push(ch);
            } else {
                self.fragment.insert(ch);
                push_encoded_char(out, ch);
            }
        }
    }

    fn report(&self, template_text: &str) {
        let components = [
            ("path", &self.path),
            ("query", &self.query),
            ("fragment", &self.fragment),
        ];
        for (component, chars) in components {
            if !chars.is_empty() {
                let chars: String = chars.iter().collect();
                self.diagnostics.warn(format!(
                    "The literal part contains an unencoded {component} string \"{chars}\". Received: `{template_text}`"
                ));
            }
        }
    }
}
