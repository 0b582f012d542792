use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque token correlating a request envelope with its response.
///
/// Short hex form of a v4 UUID — unique enough for in-flight requests,
/// short enough to read in logs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationId(String);

impl CorrelationId {
    pub fn new() -> Self {
        let uuid = uuid::Uuid::new_v4();
        let bytes = uuid.as_bytes();
        Self(format!(
            "{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5]
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn correlation_id_length() {
        let id = CorrelationId::new();
        assert_eq!(id.as_str().len(), 12);
    }

    #[test]
    fn correlation_id_is_hex() {
        let id = CorrelationId::new();
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn correlation_id_is_unique() {
        let a = CorrelationId::new();
        let b = CorrelationId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn correlation_id_display_matches_str() {
        let id = CorrelationId::new();
        assert_eq!(id.to_string(), id.as_str());
    }

    #[test]
    fn correlation_id_serialization_round_trip() {
        let id = CorrelationId::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: CorrelationId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn correlation_id_hash() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        let a = CorrelationId::new();
        let b = a.clone();
        set.insert(a);
        set.insert(b);
        assert_eq!(set.len(), 1);
    }
}
