//! The per-invocation token that ties a dispatch to the run it creates.

use std::fmt::Display;

use uuid::Uuid;

/// A unique token generated once per invocation.
///
/// It is sent in the dispatch payload and must reappear verbatim in the run's name. That only
/// happens if the remote workflow embeds it, e.g. with
/// `run-name: Build [${{ inputs.distinct_id }}]`, which this crate cannot enforce.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DistinctMarker(String);

impl DistinctMarker {
    /// Generates a fresh random marker.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the marker as sent to GitHub.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DistinctMarker {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for DistinctMarker {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl Display for DistinctMarker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_are_unique() {
        assert_ne!(DistinctMarker::new(), DistinctMarker::new());
    }

    #[test]
    fn marker_is_a_uuid() {
        assert!(Uuid::parse_str(DistinctMarker::new().as_str()).is_ok());
    }
}
