//! Identity keys.
//!
//! Bindings compare the key of the current target with the key of the
//! previous render to decide whether any work is needed. Derivation is
//! pure: it never consults a document source.

use crate::{
    target::{Selector, Target},
    CollectionId, DocumentId,
};
use std::fmt;

/// Canonical, comparable form of a [`Target`].
///
/// Two targets with equal keys are the same subscription, whatever their
/// variant or allocation. `Noop` stands for "nothing to fetch".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum IdentityKey {
    #[default]
    Noop,
    Document {
        collection: CollectionId,
        id: DocumentId,
    },
    Query {
        collection: CollectionId,
        canonical: String,
    },
}

/// Shared no-op key, returned by bindings that have not observed yet.
pub(crate) static NOOP_KEY: IdentityKey = IdentityKey::Noop;

impl IdentityKey {
    /// Derive the key of an optional target.
    pub fn derive(target: Option<&Target>) -> Self {
        let Some(target) = target else {
            return IdentityKey::Noop;
        };

        match target.selector() {
            None => IdentityKey::Noop,
            Some(Selector::Document(id)) => IdentityKey::Document {
                collection: target.collection().to_string(),
                id,
            },
            Some(Selector::Query(query)) => IdentityKey::Query {
                collection: target.collection().to_string(),
                canonical: query.canonical(),
            },
        }
    }

    /// True for the key of an absent or undecided target.
    pub fn is_noop(&self) -> bool {
        matches!(self, IdentityKey::Noop)
    }

    /// Collection of the key, if any.
    pub fn collection(&self) -> Option<&str> {
        match self {
            IdentityKey::Noop => None,
            IdentityKey::Document { collection, .. } | IdentityKey::Query { collection, .. } => {
                Some(collection)
            }
        }
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityKey::Noop => f.write_str("noop"),
            IdentityKey::Document { collection, id } => write!(f, "doc:{collection}/{id}"),
            IdentityKey::Query {
                collection,
                canonical,
            } => write!(f, "query:{collection}?{canonical}"),
        }
    }
}
