//! Redaction wrapper for database locators and credentials
//!
//! Connection strings routinely embed passwords, so the runner keeps
//! them in `Sensitive<T>` from the moment they are parsed.

use std::fmt;

/// Value that prints as `***REDACTED***` in both Debug and Display
///
/// ```
/// use migrun_core_types::Sensitive;
///
/// let url = Sensitive::new("postgres://admin:hunter2@db/site");
/// assert_eq!(format!("{}", url), "***REDACTED***");
/// assert!(url.expose().contains("hunter2"));
/// ```
pub struct Sensitive<T>(T);

impl<T> Sensitive<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Borrow the real value. Only call at the point of use (opening a connection).
    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }

    /// Transform the wrapped value without exposing it to the caller's scope
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Sensitive<U> {
        Sensitive(f(self.0))
    }
}

impl<T> fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***REDACTED***")
    }
}

impl<T> fmt::Display for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***REDACTED***")
    }
}

impl<T: Clone> Clone for Sensitive<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}
