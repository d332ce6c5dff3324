//! Id and event-name derivation policies.
//!
//! Each policy is a tagged variant, so a configuration can only ever be one of
//! the recognised shapes.

use std::fmt;
use std::sync::Arc;

use turbosse_encoding::EventId;

/// Derives an id from a value; `None` suppresses the id for that value.
pub type IdFn<T> = Arc<dyn Fn(&T) -> Option<EventId> + Send + Sync>;

/// Derives an event name from a value; `None` omits the `event:` line.
pub type EventNameFn<T> = Arc<dyn Fn(&T) -> Option<String> + Send + Sync>;

/// How ids are assigned to data frames.
pub enum IdPolicy<T> {
    /// Auto-incrementing integer starting at 1 (default)
    Auto,
    /// No `id:` line on any frame
    Suppressed,
    /// Id computed from each value
    Derived(IdFn<T>),
}

impl<T> IdPolicy<T> {
    /// Build a derived policy from a closure.
    pub fn derived<F, I>(f: F) -> Self
    where
        F: Fn(&T) -> Option<I> + Send + Sync + 'static,
        I: Into<EventId>,
    {
        Self::Derived(Arc::new(move |value| f(value).map(Into::into)))
    }
}

impl<T> Default for IdPolicy<T> {
    fn default() -> Self {
        Self::Auto
    }
}

impl<T> Clone for IdPolicy<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Auto => Self::Auto,
            Self::Suppressed => Self::Suppressed,
            Self::Derived(f) => Self::Derived(Arc::clone(f)),
        }
    }
}

impl<T> fmt::Debug for IdPolicy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("Auto"),
            Self::Suppressed => f.write_str("Suppressed"),
            Self::Derived(_) => f.write_str("Derived(..)"),
        }
    }
}

/// How event names are assigned to data frames.
pub enum EventNamePolicy<T> {
    /// No `event:` line (default)
    None,
    /// The same name on every data frame
    Static(String),
    /// Name computed from each value
    Derived(EventNameFn<T>),
}

impl<T> EventNamePolicy<T> {
    /// Build a derived policy from a closure.
    pub fn derived<F, S>(f: F) -> Self
    where
        F: Fn(&T) -> Option<S> + Send + Sync + 'static,
        S: Into<String>,
    {
        Self::Derived(Arc::new(move |value| f(value).map(Into::into)))
    }
}

impl<T> Default for EventNamePolicy<T> {
    fn default() -> Self {
        Self::None
    }
}

impl<T> Clone for EventNamePolicy<T> {
    fn clone(&self) -> Self {
        match self {
            Self::None => Self::None,
            Self::Static(name) => Self::Static(name.clone()),
            Self::Derived(f) => Self::Derived(Arc::clone(f)),
        }
    }
}

impl<T> fmt::Debug for EventNamePolicy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Static(name) => f.debug_tuple("Static").field(name).finish(),
            Self::Derived(_) => f.write_str("Derived(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert!(matches!(IdPolicy::<String>::default(), IdPolicy::Auto));
        assert!(matches!(EventNamePolicy::<String>::default(), EventNamePolicy::None));
    }

    #[test]
    fn test_derived_id_converts() {
        let policy = IdPolicy::<u64>::derived(|n| (*n > 0).then_some(*n * 5));
        let IdPolicy::Derived(f) = policy else {
            panic!("expected derived policy");
        };
        assert_eq!(f(&4), Some(EventId::Number(20)));
        assert_eq!(f(&0), None);
    }

    #[test]
    fn test_debug_hides_closures() {
        let policy = EventNamePolicy::<String>::derived(|s| Some(s.clone()));
        assert_eq!(format!("{policy:?}"), "Derived(..)");
        assert_eq!(
            format!("{:?}", EventNamePolicy::<String>::Static("test".into())),
            "Static(\"test\")"
        );
    }
}
