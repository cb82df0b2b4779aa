//! Account identities and the insertion-ordered identity set.

use std::collections::HashSet;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// An account, named by its stable `did` and its current handle.
///
/// Equality and hashing look at the `did` only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub did: String,
    pub handle: String,
}

impl Identity {
    pub fn new(did: impl Into<String>, handle: impl Into<String>) -> Self {
        Self {
            did: did.into(),
            handle: handle.into(),
        }
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.did == other.did
    }
}

impl Eq for Identity {}

impl Hash for Identity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.did.hash(state);
    }
}

/// Deduplicating set of identities that remembers insertion order.
///
/// Expansion seeds and the final truncation both read this order, so
/// discovery is reproducible for a given sequence of responses.
#[derive(Debug, Clone, Default)]
pub struct IdentitySet {
    order: Vec<Identity>,
    dids: HashSet<String>,
}

impl IdentitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an identity. Returns `false` if its did was already present.
    pub fn insert(&mut self, identity: Identity) -> bool {
        if self.dids.insert(identity.did.clone()) {
            self.order.push(identity);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, did: &str) -> bool {
        self.dids.contains(did)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Identity> {
        self.order.iter()
    }

    /// The first `n` identities in insertion order.
    pub fn head(&self, n: usize) -> Vec<Identity> {
        self.order.iter().take(n).cloned().collect()
    }

    /// Keep only the first `n` identities.
    pub fn truncate(&mut self, n: usize) {
        if self.order.len() <= n {
            return;
        }
        for dropped in self.order.drain(n..) {
            self.dids.remove(&dropped.did);
        }
    }

    pub fn into_vec(self) -> Vec<Identity> {
        self.order
    }
}
