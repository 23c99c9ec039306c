//! What a binding is asked to observe.

use crate::{identity::IdentityKey, query::Query, CollectionId, DocumentId};
use serde::{Deserialize, Serialize};

/// A reference to a single document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocRef {
    pub collection: CollectionId,
    pub id: DocumentId,
}

impl DocRef {
    pub fn new(collection: impl Into<CollectionId>, id: impl Into<DocumentId>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }
}

/// The caller's description of what to fetch or subscribe to.
///
/// A `None` id or query means the caller has not decided yet; such targets
/// derive the no-op identity and trigger no source call.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Reference(DocRef),
    CollectionAndId {
        collection: CollectionId,
        id: Option<DocumentId>,
    },
    CollectionQuery {
        collection: CollectionId,
        query: Option<Query>,
    },
}

/// The resolved filter part of a target, as handed to a document source.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    Document(DocumentId),
    Query(Query),
}

impl Target {
    /// Target a document through a reference.
    pub fn reference(collection: impl Into<CollectionId>, id: impl Into<DocumentId>) -> Self {
        Target::Reference(DocRef::new(collection, id))
    }

    /// Target a document by collection and id.
    pub fn by_id(collection: impl Into<CollectionId>, id: impl Into<DocumentId>) -> Self {
        Target::CollectionAndId {
            collection: collection.into(),
            id: Some(id.into()),
        }
    }

    /// Target every document of a collection.
    pub fn all(collection: impl Into<CollectionId>) -> Self {
        Self::query(collection, Query::all())
    }

    /// Target the documents of a collection matching `query`.
    pub fn query(collection: impl Into<CollectionId>, query: Query) -> Self {
        Target::CollectionQuery {
            collection: collection.into(),
            query: Some(query),
        }
    }

    /// Collection this target points into.
    pub fn collection(&self) -> &str {
        match self {
            Target::Reference(doc) => &doc.collection,
            Target::CollectionAndId { collection, .. }
            | Target::CollectionQuery { collection, .. } => collection,
        }
    }

    /// The selector to hand to a source, or `None` if the target is undecided.
    ///
    /// Empty collection names and empty document ids count as undecided.
    pub fn selector(&self) -> Option<Selector> {
        if self.collection().is_empty() {
            return None;
        }

        match self {
            Target::Reference(doc) => document_selector(&doc.id),
            Target::CollectionAndId { id, .. } => id.as_deref().and_then(document_selector),
            Target::CollectionQuery { query, .. } => query.clone().map(Selector::Query),
        }
    }

    /// Identity key of this target.
    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey::derive(Some(self))
    }
}

fn document_selector(id: &str) -> Option<Selector> {
    (!id.is_empty()).then(|| Selector::Document(id.to_string()))
}

impl From<DocRef> for Target {
    fn from(doc: DocRef) -> Self {
        Target::Reference(doc)
    }
}
