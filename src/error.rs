use serde::{Deserialize, Serialize};

/// Outcome of an insight computation.
///
/// "No data for this farmer/range" is an expected condition in field IoT,
/// not a failure: it travels as a structured `InsufficientData` payload
/// that the excluded API layer turns into a degraded 200 response. Only a
/// source-unreachable condition is a hard error (`SourceError::Unavailable`,
/// propagated through `Result` instead).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Computed<T> {
    Ready { result: T },
    InsufficientData { message: String },
}

impl<T> Computed<T> {
    pub fn ready(result: T) -> Self {
        Computed::Ready { result }
    }

    pub fn insufficient_data(message: impl Into<String>) -> Self {
        Computed::InsufficientData {
            message: message.into(),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Computed::Ready { .. })
    }

    pub fn as_ready(&self) -> Option<&T> {
        match self {
            Computed::Ready { result } => Some(result),
            Computed::InsufficientData { .. } => None,
        }
    }

    pub fn into_ready(self) -> Option<T> {
        match self {
            Computed::Ready { result } => Some(result),
            Computed::InsufficientData { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_accessors() {
        let computed = Computed::ready(42);
        assert!(computed.is_ready());
        assert_eq!(computed.as_ready(), Some(&42));
        assert_eq!(computed.into_ready(), Some(42));
    }

    #[test]
    fn test_insufficient_data_accessors() {
        let computed: Computed<i32> = Computed::insufficient_data("no readings in range");
        assert!(!computed.is_ready());
        assert_eq!(computed.as_ready(), None);
        assert_eq!(computed.into_ready(), None);
    }

    #[test]
    fn test_serialization_is_tagged() {
        let ready = Computed::ready(7);
        let json = serde_json::to_string(&ready).unwrap();
        assert!(json.contains(r#""status":"ready""#));

        let missing: Computed<i32> = Computed::insufficient_data("no readings");
        let json = serde_json::to_string(&missing).unwrap();
        assert!(json.contains(r#""status":"insufficient_data""#));
        assert!(json.contains("no readings"));
    }
}
