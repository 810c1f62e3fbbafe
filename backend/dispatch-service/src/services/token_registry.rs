use parking_lot::RwLock;
use tracing::info;

/// Result of registering a token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub newly_registered: bool,
    pub registered_count: usize,
}

/// In-memory list of device tokens seen by `/register-token`.
///
/// Ordered by first registration, no duplicates. Nothing is persisted.
#[derive(Debug, Default)]
pub struct TokenRegistry {
    tokens: RwLock<Vec<String>>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `token` unless it is already known
    pub fn register(&self, token: &str) -> Registration {
        // Check and append under one write lock
        let mut tokens = self.tokens.write();
        let newly_registered = !tokens.iter().any(|t| t == token);

        if newly_registered {
            tokens.push(token.to_string());
            info!(token = %token, "New device token registered");
        } else {
            info!(token = %token, "Device token already registered");
        }

        Registration {
            newly_registered,
            registered_count: tokens.len(),
        }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.read().iter().any(|t| t == token)
    }

    /// Snapshot in registration order
    pub fn tokens(&self) -> Vec<String> {
        self.tokens.read().clone()
    }

    pub fn len(&self) -> usize {
        self.tokens.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.read().is_empty()
    }
}
