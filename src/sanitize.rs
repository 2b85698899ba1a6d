// ==============================================================================
// Path-Traversal Sanitizer
// ==============================================================================
//
// The URL is assembled into a single buffer that remembers, byte by byte,
// whether text came from a template literal or was embedded at bind time.
// A `.` or `..` segment that contains at least one embedded dot would change
// the path hierarchy, so its embedded dots are replaced with `%20`. Dots
// written in the template itself are left alone.

use crate::diagnostics::Diagnostics;

const DOTS_REPLACED: &str = "When embedding values in URLs, some dots are replaced with single-byte spaces because we tried to generate paths that include strings indicating the current or parent directory, such as \".\" or \"..\".";

/// The URL under construction.
#[allow(clippy::redundant_pub_crate)] // Explicit crate visibility on private-module item.
#[derive(Debug, Default)]
pub(crate) struct Assembly {
    text: String,
    literal: Vec<bool>,
}

impl Assembly {
    pub(crate) fn push_literal(&mut self, text: &str) {
        self.push(text, true);
    }

    pub(crate) fn push_embedded(&mut self, text: &str) {
        self.push(text, false);
    }

    fn push(&mut self, text: &str, literal: bool) {
        self.text.push_str(text);
        self.literal.resize(self.text.len(), literal);
    }

    pub(crate) fn ends_with_slash(&self) -> bool {
        self.text.ends_with('/')
    }

    /// Finishes assembly, neutralizing dot segments built from embedded
    /// values.
    pub(crate) fn into_sanitized(self, diagnostics: &Diagnostics) -> String {
        let bytes = self.text.as_bytes();
        let mut out = String::with_capacity(self.text.len());
        let mut copied = 0;
        let mut sanitized = false;
        let mut index = 0;

        while index < bytes.len() {
            let segment_start = index == 0 || bytes[index - 1] == b'/';
            if !segment_start || bytes[index] != b'.' {
                index += 1;
                continue;
            }

            let run = bytes[index..].iter().take_while(|&&b| b == b'.').count();
            let end = index + run;
            let closed = bytes
                .get(end)
                .is_none_or(|b| matches!(b, b'/' | b'?' | b'#'));
            let embedded = self.literal[index..end].iter().any(|&literal| !literal);

            if run <= 2 && closed && embedded {
                sanitized = true;
                out.push_str(&self.text[copied..index]);
                for &literal in &self.literal[index..end] {
                    out.push_str(if literal { "." } else { "%20" });
                }
                copied = end;
            }
            index = end;
        }
        out.push_str(&self.text[copied..]);

        if sanitized {
            diagnostics.warn(DOTS_REPLACED);
        }
        out
    }
}
