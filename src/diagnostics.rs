// ==============================================================================
// Diagnostics
// ==============================================================================
//
// Recoverable problems (unencoded literal text, missing slashes, traversal
// dots in bound values, ...) are reported as plain warning strings and the
// corrected result is still produced. The sink is injected so callers can log
// them, collect them for assertions, or drop them.

use std::{fmt, sync::Arc};

use parking_lot::Mutex;

type Sink = dyn Fn(&str) + Send + Sync;

/// Destination for warning messages.
///
/// The default sink emits each message through [`tracing::warn!`] with the
/// target `url_template`.
///
/// ```
/// use url_template::Diagnostics;
///
/// let (diagnostics, warnings) = Diagnostics::collector();
/// diagnostics.warn("something looks off");
/// assert_eq!(warnings.take(), vec!["something looks off".to_owned()]);
/// ```
#[derive(Clone)]
pub struct Diagnostics {
    sink: Arc<Sink>,
}

impl Diagnostics {
    /// Creates a sink that forwards every warning to `sink`.
    pub fn new<F>(sink: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self {
            sink: Arc::new(sink),
        }
    }

    /// Creates a sink that logs through `tracing` at warn level.
    #[must_use]
    pub fn tracing() -> Self {
        Self::new(|message| tracing::warn!(target: "url_template", "{message}"))
    }

    /// Creates a sink that discards every warning.
    #[must_use]
    pub fn silent() -> Self {
        Self::new(|_| {})
    }

    /// Creates a sink that records warnings, along with the handle used to
    /// read them back.
    #[must_use]
    pub fn collector() -> (Self, Warnings) {
        let warnings = Warnings::default();
        let log = Arc::clone(&warnings.log);
        let diagnostics = Self::new(move |message| log.lock().push(message.to_owned()));
        (diagnostics, warnings)
    }

    /// Reports one warning.
    pub fn warn(&self, message: impl AsRef<str>) {
        (self.sink)(message.as_ref());
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::tracing()
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics").finish_non_exhaustive()
    }
}

// ==============================================================================
// Warnings
// ==============================================================================

/// Shared log filled by a [`Diagnostics::collector`] sink.
#[derive(Clone, Debug, Default)]
pub struct Warnings {
    log: Arc<Mutex<Vec<String>>>,
}

impl Warnings {
    /// Returns the recorded warnings and clears the log.
    #[must_use]
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.log.lock())
    }

    /// Returns a copy of the recorded warnings.
    #[must_use]
    pub fn snapshot(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    /// Returns `true` when nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.log.lock().is_empty()
    }
}
