use serde::{Deserialize, Serialize};
use std::fmt;

/// Monotonic token identifying a report within a session.
///
/// Issued in strictly increasing order by the report composer, starting at 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(pub u64);

impl ReportId {
    pub const FIRST: ReportId = ReportId(1);

    /// The id issued after this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}
