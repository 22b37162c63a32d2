//! Port error types
//!
//! Almost every port operation is infallible by contract: unknown streams,
//! overflow and teardown are all recovered locally. Configuration entry points
//! that can reject input report a [`PortError`].

/// Error type for port operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortError {
    /// Queue depth below -1 (the only negative value accepted is -1, "unbounded")
    InvalidQueueDepth(i64),
}

impl std::fmt::Display for PortError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortError::InvalidQueueDepth(depth) => {
                write!(f, "Invalid queue depth: {} (use -1 for unbounded)", depth)
            }
        }
    }
}

impl std::error::Error for PortError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            PortError::InvalidQueueDepth(-5).to_string(),
            "Invalid queue depth: -5 (use -1 for unbounded)"
        );
    }
}
