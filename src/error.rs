use thiserror::Error;

pub type Result<T, E = HeapError> = std::result::Result<T, E>;

/// Caller-input errors. Every operation checks for these before touching
/// the heap, so a failed call leaves the container as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HeapError {
    #[error("heap is empty")]
    EmptyContainer,
    #[error("key does not exist in the heap")]
    KeyNotFound,
    #[error("key occurs {occurrences} times; priority change requires a unique key")]
    AmbiguousKey { occurrences: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(HeapError::EmptyContainer.to_string(), "heap is empty");
        assert_eq!(
            HeapError::AmbiguousKey { occurrences: 3 }.to_string(),
            "key occurs 3 times; priority change requires a unique key"
        );
    }
}
