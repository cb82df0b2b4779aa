// src/services/discovery.rs

//! Seed discovery: rotate the probe catalog, then grow through the follow graph.

use std::collections::HashSet;

use crate::api::{DiscoveryResponse, SocialApi};
use crate::models::IdentitySet;
use crate::services::{NetworkExpander, Probe, StrategyCatalog};
use crate::utils::Pacer;

/// Builds the identity set the rest of the crawl works on.
pub struct SeedDiscoveryEngine<'a> {
    api: &'a dyn SocialApi,
    catalog: &'a StrategyCatalog,
    expander: NetworkExpander<'a>,
    pacer: Pacer,
}

impl<'a> SeedDiscoveryEngine<'a> {
    pub fn new(
        api: &'a dyn SocialApi,
        catalog: &'a StrategyCatalog,
        expander: NetworkExpander<'a>,
        pacer: Pacer,
    ) -> Self {
        Self {
            api,
            catalog,
            expander,
            pacer,
        }
    }

    /// Discover up to `max` identities.
    ///
    /// Probes run in catalog order, each once per cycle. When every probe
    /// has run, one expansion round follows and the cycle restarts. The
    /// loop ends when the set is full, when probes have carried `3 * max`
    /// items, or when a whole cycle neither grows the set nor carries any
    /// probe item. Accounts seen during expansion do not count toward the
    /// item limit. Failures are logged and never surface to the caller.
    pub async fn discover(&self, max: usize) -> IdentitySet {
        let mut seen = IdentitySet::new();
        let mut used: HashSet<&str> = HashSet::new();
        let mut processed = 0usize;
        let processed_limit = max.saturating_mul(3);
        let mut cycle_start = (0usize, 0usize);

        log::info!("Finding initial identities (target: {})", max);

        while seen.len() < max && processed < processed_limit {
            let next = self
                .catalog
                .iter()
                .find(|probe| !used.contains(probe.name.as_str()));

            if let Some(probe) = next {
                used.insert(probe.name.as_str());
                processed += self.run_probe(probe, &mut seen).await;
                self.pacer.pause().await;
                continue;
            }

            // Every probe has run this cycle.
            if !seen.is_empty() {
                log::info!("Tried all discovery probes, expanding through the follow network");
                self.expander.expand(&mut seen, max).await;
            }
            used.clear();

            if (seen.len(), processed) == cycle_start {
                log::warn!(
                    "Discovery made no progress over a full cycle, stopping with {} identities",
                    seen.len()
                );
                break;
            }
            cycle_start = (seen.len(), processed);
        }

        seen.truncate(max);
        log::info!("Found {} identities to process", seen.len());
        seen
    }

    /// Run one probe and merge what it finds. Returns the number of items
    /// the response carried.
    async fn run_probe(&self, probe: &Probe, seen: &mut IdentitySet) -> usize {
        log::info!("Finding identities with probe: {}", probe.name);
        match self.api.run_probe(probe).await {
            Ok(response) => {
                let processed = harvest(&probe.name, response, seen);
                log::info!("Found {} unique identities so far", seen.len());
                processed
            }
            Err(e) => {
                log::warn!("Error with probe {}: {}", probe.name, e);
                0
            }
        }
    }
}

/// Merge the authors found in a probe response, including the authors of
/// reply parents. Returns the number of items inspected.
pub fn harvest(probe: &str, response: DiscoveryResponse, seen: &mut IdentitySet) -> usize {
    match response {
        DiscoveryResponse::Feed(items) => {
            for item in &items {
                seen.insert(item.post.author.identity());
                if let Some(parent) = item.reply_parent_author() {
                    seen.insert(parent);
                }
            }
            items.len()
        }
        DiscoveryResponse::Posts(posts) => {
            for post in &posts {
                seen.insert(post.author.identity());
            }
            posts.len()
        }
        DiscoveryResponse::Unknown => {
            log::warn!("Unrecognized response shape from probe {}", probe);
            0
        }
    }
}
