/// Result of a best-effort step: either a value, or the reason it was skipped.
///
/// Used where a failure must not abort the caller (scraping, grounding,
/// retrieval) but should still be observable and testable.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Ok(T),
    Degraded(String),
}

impl<T> Outcome<T> {
    pub fn degraded(reason: impl Into<String>) -> Self {
        Outcome::Degraded(reason.into())
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok(_))
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Outcome::Ok(v) => Some(v),
            Outcome::Degraded(_) => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Outcome::Ok(_) => None,
            Outcome::Degraded(r) => Some(r),
        }
    }
}

impl<T, E: std::fmt::Display> From<Result<T, E>> for Outcome<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(v) => Outcome::Ok(v),
            Err(e) => Outcome::Degraded(e.to_string()),
        }
    }
}
