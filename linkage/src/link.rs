//! Reconciliation link objects
//!
//! A link relates exactly one movement or payment record to zero-or-one
//! authorization record. Links are created once per source record; the only
//! permitted mutation is adopting a propagated resolution into an
//! unresolved link.

use crate::error::{Error, Result};
use recon_core::MatchStrategy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Ledger side a link originates from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkSource {
    /// Movement ledger record
    Movement(Uuid),
    /// Payment ledger record
    Payment(Uuid),
}

impl LinkSource {
    /// Source record ID
    pub fn record_id(&self) -> Uuid {
        match self {
            LinkSource::Movement(id) | LinkSource::Payment(id) => *id,
        }
    }
}

/// Resolved end of a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkResolution {
    /// Matched authorization record
    pub authorization_id: Uuid,

    /// Strategy that produced the match
    pub strategy: MatchStrategy,

    /// Ordinal rank of the strategy; lower is more certain
    pub confidence: u8,
}

/// Link from one movement or payment record to at most one authorization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationLink {
    /// Unique link ID
    pub link_id: Uuid,

    /// Source record the link belongs to
    pub source: LinkSource,

    /// Matched authorization, if any strategy succeeded
    pub resolution: Option<LinkResolution>,

    /// Link this resolution was propagated from, if not matched directly
    pub inherited_from: Option<Uuid>,
}

impl ReconciliationLink {
    /// Create an unresolved link
    pub fn unresolved(source: LinkSource) -> Self {
        Self {
            link_id: Uuid::now_v7(),
            source,
            resolution: None,
            inherited_from: None,
        }
    }

    /// Create a directly matched link
    pub fn direct(source: LinkSource, authorization_id: Uuid, strategy: MatchStrategy) -> Self {
        Self {
            link_id: Uuid::now_v7(),
            source,
            resolution: Some(LinkResolution {
                authorization_id,
                strategy,
                confidence: strategy.confidence(),
            }),
            inherited_from: None,
        }
    }

    /// Whether any resolution is present
    pub fn is_resolved(&self) -> bool {
        self.resolution.is_some()
    }

    /// Whether the resolution was propagated rather than matched directly
    pub fn is_inherited(&self) -> bool {
        self.inherited_from.is_some()
    }

    /// Adopt a resolution propagated from another link.
    ///
    /// Fails if this link is already resolved: direct matches always take
    /// precedence over inheritance.
    pub fn adopt(&mut self, authorization_id: Uuid, from_link: Uuid) -> Result<()> {
        if self.resolution.is_some() {
            return Err(Error::AlreadyResolved(self.link_id.to_string()));
        }
        self.resolution = Some(LinkResolution {
            authorization_id,
            strategy: MatchStrategy::InheritedPair,
            confidence: MatchStrategy::InheritedPair.confidence(),
        });
        self.inherited_from = Some(from_link);
        Ok(())
    }
}

/// Links for one reconciliation run, indexed by source record
#[derive(Debug, Default)]
pub struct LinkSet {
    links: Vec<ReconciliationLink>,
    by_source: HashMap<Uuid, usize>,
}

impl LinkSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a link; the engine creates exactly one per source record
    pub fn insert(&mut self, link: ReconciliationLink) {
        self.by_source.insert(link.source.record_id(), self.links.len());
        self.links.push(link);
    }

    /// Link for a source record
    pub fn link_for(&self, record_id: Uuid) -> Option<&ReconciliationLink> {
        self.by_source.get(&record_id).map(|&i| &self.links[i])
    }

    pub(crate) fn link_for_mut(&mut self, record_id: Uuid) -> Option<&mut ReconciliationLink> {
        self.by_source.get(&record_id).map(|&i| &mut self.links[i])
    }

    /// Links resolving to one authorization record
    pub fn links_to(&self, authorization_id: Uuid) -> impl Iterator<Item = &ReconciliationLink> + '_ {
        self.links.iter().filter(move |link| {
            link.resolution
                .map_or(false, |r| r.authorization_id == authorization_id)
        })
    }

    /// All links in creation order
    pub fn iter(&self) -> impl Iterator<Item = &ReconciliationLink> + '_ {
        self.links.iter()
    }

    /// Number of links
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Number of resolved links
    pub fn resolved_count(&self) -> usize {
        self.links.iter().filter(|l| l.is_resolved()).count()
    }
}
