// src/services/mod.rs

//! Crawl services: discovery, expansion, collection and aggregation.

pub mod aggregator;
pub mod collector;
pub mod discovery;
pub mod expansion;
pub mod strategies;

pub use aggregator::{IdentityCollections, aggregate, posting_frequency};
pub use collector::{AuthorFeed, Connections, PaginatedCollector, PostInteractions, Relation, split_feed};
pub use discovery::SeedDiscoveryEngine;
pub use expansion::{ExpansionOutcome, NetworkExpander};
pub use strategies::{Probe, ProbeQuery, StrategyCatalog};
