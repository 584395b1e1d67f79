//! Classification of a unit of work as blocking or suspension-capable

use super::unit::UnitOfWork;
use std::fmt;

/// How a unit of work runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    /// Occupies the calling OS thread until it returns
    Blocking,
    /// Driven by a cooperative scheduler and yields at suspension points
    Suspending,
}

impl CallKind {
    pub fn is_blocking(self) -> bool {
        self == CallKind::Blocking
    }

    pub fn is_suspending(self) -> bool {
        self == CallKind::Suspending
    }
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallKind::Blocking => write!(f, "blocking"),
            CallKind::Suspending => write!(f, "suspending"),
        }
    }
}

/// Classify a unit of work.
///
/// The answer is fixed by the constructor used to build the unit, so wrappers
/// call this once at wrap time and pick their code path from it.
pub fn classify<A, T, E>(unit: &UnitOfWork<A, T, E>) -> CallKind {
    match unit {
        UnitOfWork::Blocking(_) => CallKind::Blocking,
        UnitOfWork::Suspending(_) => CallKind::Suspending,
    }
}
