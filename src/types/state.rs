//! Promise state tag and settled-outcome snapshot.
//!
//! A promise moves through exactly one transition in its lifetime:
//!
//! ```text
//! Pending ──► Fulfilled(T)
//!    │
//!    └─────► Rejected(E)
//! ```
//!
//! [`PromiseState`] is the value-free tag used for inspection and logging.
//! [`Settled`] is the snapshot delivered to observers once the transition has
//! happened; every observer gets its own clone.

use core::fmt;

/// The state tag of a promise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PromiseState {
    /// Not settled yet.
    Pending,
    /// Settled with a value.
    Fulfilled,
    /// Settled with a reason.
    Rejected,
}

impl PromiseState {
    /// Returns true for `Fulfilled` and `Rejected`.
    #[must_use]
    pub const fn is_settled(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Returns true for `Pending`.
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl fmt::Display for PromiseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Fulfilled => write!(f, "fulfilled"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// The outcome of a settled promise.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(tag = "status", content = "payload", rename_all = "snake_case")
)]
pub enum Settled<T, E> {
    /// The promise fulfilled with a value.
    Fulfilled(T),
    /// The promise rejected with a reason.
    Rejected(E),
}

impl<T, E> Settled<T, E> {
    /// Returns the state tag matching this outcome.
    #[must_use]
    pub const fn state(&self) -> PromiseState {
        match self {
            Self::Fulfilled(_) => PromiseState::Fulfilled,
            Self::Rejected(_) => PromiseState::Rejected,
        }
    }

    /// Returns true if this outcome is `Fulfilled`.
    #[must_use]
    pub const fn is_fulfilled(&self) -> bool {
        matches!(self, Self::Fulfilled(_))
    }

    /// Returns true if this outcome is `Rejected`.
    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    /// Returns a reference to the value, if fulfilled.
    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Fulfilled(v) => Some(v),
            Self::Rejected(_) => None,
        }
    }

    /// Returns a reference to the reason, if rejected.
    #[must_use]
    pub const fn reason(&self) -> Option<&E> {
        match self {
            Self::Fulfilled(_) => None,
            Self::Rejected(e) => Some(e),
        }
    }

    /// Converts into a standard `Result`.
    pub fn into_result(self) -> Result<T, E> {
        match self {
            Self::Fulfilled(v) => Ok(v),
            Self::Rejected(e) => Err(e),
        }
    }

    /// Maps the fulfilled value.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Settled<U, E> {
        match self {
            Self::Fulfilled(v) => Settled::Fulfilled(f(v)),
            Self::Rejected(e) => Settled::Rejected(e),
        }
    }

    /// Maps the rejection reason.
    pub fn map_err<F2, G: FnOnce(E) -> F2>(self, g: G) -> Settled<T, F2> {
        match self {
            Self::Fulfilled(v) => Settled::Fulfilled(v),
            Self::Rejected(e) => Settled::Rejected(g(e)),
        }
    }
}

impl<T, E> From<Result<T, E>> for Settled<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(v) => Self::Fulfilled(v),
            Err(e) => Self::Rejected(e),
        }
    }
}

impl<T: fmt::Display, E: fmt::Display> fmt::Display for Settled<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fulfilled(v) => write!(f, "fulfilled: {v}"),
            Self::Rejected(e) => write!(f, "rejected: {e}"),
        }
    }
}
