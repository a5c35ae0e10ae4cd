//! Mock identity resolver for testing.

use super::{IdentityError, IdentityResolver, IdentityResult, SigningIdentity};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory identity resolver for tests.
#[derive(Clone, Default)]
pub struct MockIdentityResolver {
    keys: Arc<Mutex<HashMap<String, String>>>,
}

impl MockIdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a resolver holding a single credential.
    pub fn with_key(id: &str, key_hex: &str) -> Self {
        let resolver = Self::new();
        resolver.put_key(id, key_hex);
        resolver
    }

    /// Insert or replace a credential (for test setup; replacement
    /// models a rotated key).
    pub fn put_key(&self, id: &str, key_hex: &str) {
        let mut keys = self.keys.lock().unwrap();
        keys.insert(id.to_string(), key_hex.to_string());
    }

    /// Remove a credential (models revocation between setup and
    /// execution).
    pub fn remove_key(&self, id: &str) {
        let mut keys = self.keys.lock().unwrap();
        keys.remove(id);
    }
}

impl IdentityResolver for MockIdentityResolver {
    fn resolve(&self, id: &str) -> IdentityResult<SigningIdentity> {
        let keys = self.keys.lock().unwrap();
        let key_hex = keys
            .get(id)
            .ok_or_else(|| IdentityError::NotFound(id.to_string()))?;
        SigningIdentity::from_hex(id, key_hex)
    }
}
