// src/services/expansion.rs

//! Growth of the discovered identity set through the follow graph.

use crate::api::{ActorView, SocialApi};
use crate::error::Result;
use crate::models::{Identity, IdentitySet};
use crate::utils::Pacer;

/// Counters reported by one expansion round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpansionOutcome {
    /// Identities that were new to the set
    pub added: usize,
    /// Accounts seen in the listings, new or not
    pub observed: usize,
}

/// Adds followers and follows of the earliest discovered identities.
pub struct NetworkExpander<'a> {
    api: &'a dyn SocialApi,
    seed_count: usize,
    page_size: u32,
    pacer: Pacer,
}

impl<'a> NetworkExpander<'a> {
    pub fn new(api: &'a dyn SocialApi, seed_count: usize, page_size: u32, pacer: Pacer) -> Self {
        Self {
            api,
            seed_count,
            page_size,
            pacer,
        }
    }

    /// Run one expansion round over the first seeds of `seen`.
    ///
    /// Each seed contributes one page of followers and one page of follows.
    /// The round stops as soon as `seen` holds `budget` identities. A seed
    /// whose lookups fail is skipped.
    pub async fn expand(&self, seen: &mut IdentitySet, budget: usize) -> ExpansionOutcome {
        let seeds = seen.head(self.seed_count);
        let mut outcome = ExpansionOutcome::default();

        for (i, seed) in seeds.iter().enumerate() {
            if seen.len() >= budget {
                break;
            }
            log::info!(
                "Expanding network through identity {}/{}: {}",
                i + 1,
                seeds.len(),
                seed.handle
            );

            if let Err(e) = self.expand_seed(seed, seen, budget, &mut outcome).await {
                log::warn!("Error expanding network for {}: {}", seed.handle, e);
            }

            if seen.len() >= budget {
                log::info!("Reached target of {} identities during expansion", budget);
                break;
            }
            self.pacer.pause().await;
        }

        log::info!(
            "Expansion added {} identities ({} accounts seen)",
            outcome.added,
            outcome.observed
        );
        outcome
    }

    async fn expand_seed(
        &self,
        seed: &Identity,
        seen: &mut IdentitySet,
        budget: usize,
        outcome: &mut ExpansionOutcome,
    ) -> Result<()> {
        let followers = self.api.get_followers(&seed.did, self.page_size, None).await?;
        if Self::merge(followers.items, seen, budget, outcome) {
            return Ok(());
        }

        let follows = self.api.get_follows(&seed.did, self.page_size, None).await?;
        Self::merge(follows.items, seen, budget, outcome);
        Ok(())
    }

    /// Returns true once the budget is reached.
    fn merge(
        actors: Vec<ActorView>,
        seen: &mut IdentitySet,
        budget: usize,
        outcome: &mut ExpansionOutcome,
    ) -> bool {
        for actor in actors {
            if seen.len() >= budget {
                return true;
            }
            outcome.observed += 1;
            if seen.insert(actor.identity()) {
                outcome.added += 1;
            }
        }
        seen.len() >= budget
    }
}
