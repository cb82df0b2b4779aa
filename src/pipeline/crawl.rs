// src/pipeline/crawl.rs

//! Crawl pipeline: discovery, identity loop, interaction loop, persistence.

use chrono::Utc;

use crate::api::SocialApi;
use crate::error::Result;
use crate::models::{CollectionSummary, Config, Identity};
use crate::pipeline::{CheckpointStore, CrawlData, IdentityProcessor};
use crate::services::{
    NetworkExpander, PaginatedCollector, PostInteractions, SeedDiscoveryEngine, StrategyCatalog,
};
use crate::storage::{Dataset, DatasetStorage, DatasetWrite};
use crate::utils::Pacer;

/// Outcome of a crawl run.
#[derive(Debug, Default)]
pub struct CrawlReport {
    pub identities: usize,
    pub completed: usize,
    pub failed: usize,
    pub written: Vec<DatasetWrite>,
    /// Absent when discovery found nobody and nothing was written
    pub summary: Option<CollectionSummary>,
}

/// Run the crawler end to end.
///
/// Remote failures never abort the run. Only writing the final datasets and
/// the summary can fail.
pub async fn run_crawler(
    config: &Config,
    api: &dyn SocialApi,
    storage: &dyn DatasetStorage,
) -> Result<CrawlReport> {
    let timeframe = config.timeframe();
    let limits = &config.limits;
    let pacing = &config.pacing;

    log::info!("Date range: {}", timeframe.display_range());
    log::info!("Target identities: {}", config.crawl.max_identities);

    let identities = discover_identities(config, api).await;

    if identities.is_empty() {
        log::warn!("No identities found, nothing to collect");
        return Ok(CrawlReport::default());
    }

    log::info!(
        "Starting data collection for {} identities",
        identities.len()
    );

    let collector = PaginatedCollector::new(api, limits.page_size, Pacer::new(pacing.page_delay()));
    let mut data = CrawlData::new();
    let mut report = CrawlReport {
        identities: identities.len(),
        ..Default::default()
    };

    // Identity loop
    let processor = IdentityProcessor::new(api, &collector, limits, timeframe);
    let checkpoints = CheckpointStore::new(storage, config.checkpoint.identity_interval);
    let identity_pacer = Pacer::new(pacing.identity_delay());

    for (idx, identity) in identities.iter().enumerate() {
        if checkpoints.is_due(idx) {
            log::info!("Saving checkpoint at identity {}/{}", idx, identities.len());
            checkpoint_identity_datasets(&checkpoints, &data, idx).await;
        }

        log::info!(
            "Processing identity {}/{}: {}",
            idx + 1,
            identities.len(),
            identity.handle
        );

        let run = processor.process(identity).await;
        if run.is_complete() {
            report.completed += 1;
        } else {
            report.failed += 1;
        }
        data.absorb(run);

        identity_pacer.pause().await;
    }

    // Interaction loop over timeframe posts
    collect_interactions(config, &collector, storage, &mut data).await;

    // Persist
    let range = timeframe.label();
    for dataset in Dataset::ALL {
        let rows = data.rows(dataset)?;
        report
            .written
            .push(storage.write_dataset(dataset, &range, &rows).await?);
    }

    let files_converted = report
        .written
        .iter()
        .filter(|w| w.csv_path.is_some())
        .count();
    log::info!(
        "Converted {} of {} datasets to CSV",
        files_converted,
        Dataset::ALL.len()
    );

    let summary = data.summary(&timeframe, files_converted, Utc::now());
    storage.write_summary(&range, &summary).await?;
    report.summary = Some(summary);

    log_report(&report, &data);
    Ok(report)
}

/// Snapshot the identity-scoped datasets.
async fn checkpoint_identity_datasets(
    checkpoints: &CheckpointStore<'_>,
    data: &CrawlData,
    index: usize,
) {
    checkpoints
        .checkpoint(Dataset::BasicProfiles, &data.basic_profiles, index)
        .await;
    checkpoints
        .checkpoint(Dataset::Followers, &data.followers, index)
        .await;
    checkpoints
        .checkpoint(Dataset::Following, &data.following, index)
        .await;
    checkpoints
        .checkpoint(Dataset::Posts, &data.posts, index)
        .await;
    checkpoints
        .checkpoint(Dataset::Reposts, &data.reposts, index)
        .await;
}

/// Collect likers and reposters of every timeframe post, in collection order.
async fn collect_interactions(
    config: &Config,
    collector: &PaginatedCollector<'_>,
    storage: &dyn DatasetStorage,
    data: &mut CrawlData,
) {
    let cap = config.limits.interaction_cap;
    let checkpoints = CheckpointStore::new(storage, config.checkpoint.interaction_interval);
    let pacer = Pacer::new(config.pacing.interaction_delay());

    let post_count = data.timeframe_post_count();
    log::info!("Collecting likes and reposts for {} timeframe posts", post_count);

    let timeframe_posts = data.posts.iter().filter(|p| p.in_timeframe);
    for (i, post) in timeframe_posts.enumerate() {
        if i % 10 == 0 {
            log::info!("Processing post interactions {}/{}", i + 1, post_count);
        }
        if checkpoints.is_due(i) {
            checkpoints
                .checkpoint(Dataset::PostLikes, &data.post_likes, i)
                .await;
            checkpoints
                .checkpoint(Dataset::PostReposts, &data.post_reposts, i)
                .await;
        }

        let likers = collector.collect(&PostInteractions::likers(post, cap)).await;
        let reposters = collector
            .collect(&PostInteractions::reposters(post, cap))
            .await;
        data.post_likes.extend(likers);
        data.post_reposts.extend(reposters);

        pacer.pause().await;
    }
}

fn log_report(report: &CrawlReport, data: &CrawlData) {
    log::info!("Data collection complete");
    log::info!(
        "Identities: {} processed, {} complete, {} failed",
        report.identities,
        report.completed,
        report.failed
    );
    for dataset in Dataset::ALL {
        log::info!("  {}: {}", dataset.file_stem(), data.count(dataset));
    }
    log::info!(
        "Timeframe posts: {}, timeframe reposts: {}",
        data.timeframe_post_count(),
        data.timeframe_repost_count()
    );
}

/// Discover the identities to crawl, in discovery order.
pub async fn discover_identities(config: &Config, api: &dyn SocialApi) -> Vec<Identity> {
    let limits = &config.limits;
    let catalog = StrategyCatalog::standard(&config.api.trending_feed, limits.page_size);
    let expander = NetworkExpander::new(
        api,
        limits.expansion_seeds,
        limits.expansion_page_size,
        Pacer::new(config.pacing.expansion_delay()),
    );
    SeedDiscoveryEngine::new(api, &catalog, expander, Pacer::new(config.pacing.probe_delay()))
        .discover(config.crawl.max_identities)
        .await
        .into_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{FakeApi, actor, feed_item, paged, post_view, profile};
    use crate::api::{DiscoveryResponse, LikeView};
    use crate::models::{OutputConfig, PacingConfig};
    use crate::storage::LocalStorage;
    use tempfile::TempDir;

    fn config(tmp: &TempDir, max_identities: usize) -> Config {
        let mut config = Config::default();
        config.crawl.max_identities = max_identities;
        config.pacing = PacingConfig::none();
        config.output = OutputConfig {
            json_dir: tmp.path().join("users"),
            csv_dir: tmp.path().join("users/csv"),
        };
        config
    }

    /// Three identities found by the timeline probe, each with one post
    /// inside the window and one outside.
    fn three_identities() -> FakeApi {
        let mut api = FakeApi::new();
        let authors: Vec<_> = (0..3)
            .map(|i| actor(&format!("did:plc:u{i}"), &format!("u{i}.test")))
            .collect();

        let seeds = authors
            .iter()
            .map(|a| post_view(&format!("at://seed/{}", a.did), a, None))
            .collect();
        api.probes
            .insert("timeline".into(), Some(DiscoveryResponse::Posts(seeds)));

        for author in &authors {
            api.profiles
                .insert(author.did.clone(), profile(&author.did, &author.handle));
            api.feeds.insert(
                author.did.clone(),
                paged(
                    vec![
                        feed_item(post_view(
                            &format!("at://{}/in", author.did),
                            author,
                            Some("2024-06-01T12:00:00Z"),
                        )),
                        feed_item(post_view(
                            &format!("at://{}/out", author.did),
                            author,
                            Some("2023-06-01T12:00:00Z"),
                        )),
                    ],
                    100,
                ),
            );
        }
        api
    }

    fn csv_rows(path: &std::path::Path) -> usize {
        csv::Reader::from_path(path).unwrap().records().count()
    }

    #[tokio::test]
    async fn test_end_to_end_three_identities() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp, 3);
        let mut api = three_identities();
        api.likes.insert(
            "at://did:plc:u0/in".into(),
            paged(
                vec![LikeView {
                    actor: actor("did:plc:fan", "fan.test"),
                    created_at: Some("2024-06-02T00:00:00Z".into()),
                }],
                100,
            ),
        );
        let storage = LocalStorage::from_config(&config.output);

        let report = run_crawler(&config, &api, &storage).await.unwrap();

        assert_eq!(report.identities, 3);
        assert_eq!(report.completed, 3);
        assert_eq!(report.failed, 0);

        let profiles = report
            .written
            .iter()
            .find(|w| w.dataset == Dataset::ComprehensiveProfiles)
            .unwrap();
        let json: Vec<serde_json::Value> =
            serde_json::from_slice(&std::fs::read(&profiles.json_path).unwrap()).unwrap();
        assert_eq!(json.len(), 3);
        for profile in &json {
            assert_eq!(profile["posts_count_total"], 2);
            assert_eq!(profile["posts_count_timeframe"], 1);
        }
        assert_eq!(csv_rows(profiles.csv_path.as_ref().unwrap()), 3);

        // Interactions are only collected for timeframe posts.
        assert_eq!(api.count_calls("likes:"), 3);
        assert_eq!(api.count_calls("reposted_by:"), 3);
        assert_eq!(api.count_calls("likes:at://did:plc:u0/out"), 0);

        let summary = report.summary.unwrap();
        assert_eq!(summary.total_posts, 6);
        assert_eq!(summary.timeframe_posts, 3);
        assert_eq!(summary.post_likes, 1);
        // Profiles, basic profiles, posts and post likes have records.
        assert_eq!(summary.files_converted_to_csv, 4);
        assert!(
            tmp.path()
                .join("users/collection_summary_2024-02-01_to_2025-02-01.json")
                .exists()
        );
    }

    #[tokio::test]
    async fn test_failed_identity_is_basic_profile_only() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp, 3);
        let mut api = three_identities();
        api.failing_likes_given.insert("did:plc:u1".into());
        let storage = LocalStorage::from_config(&config.output);

        let report = run_crawler(&config, &api, &storage).await.unwrap();

        assert_eq!(report.completed, 2);
        assert_eq!(report.failed, 1);
        let count = |dataset| {
            report
                .written
                .iter()
                .find(|w| w.dataset == dataset)
                .map(|w| w.records)
                .unwrap()
        };
        assert_eq!(count(Dataset::BasicProfiles), 3);
        assert_eq!(count(Dataset::ComprehensiveProfiles), 2);
    }

    #[tokio::test]
    async fn test_identity_checkpoints_are_written() {
        let tmp = TempDir::new().unwrap();
        let mut config = config(&tmp, 3);
        config.checkpoint.identity_interval = 1;
        let api = three_identities();
        let storage = LocalStorage::from_config(&config.output);

        run_crawler(&config, &api, &storage).await.unwrap();

        let dir = tmp.path().join("users");
        assert!(dir.join("checkpoint_users_profiles_1.json").exists());
        assert!(dir.join("checkpoint_posts_2.json").exists());
        // No snapshot before the first identity or after the last one.
        assert!(!dir.join("checkpoint_users_profiles_0.json").exists());
        assert!(!dir.join("checkpoint_users_profiles_3.json").exists());

        let early: Vec<serde_json::Value> =
            serde_json::from_slice(&std::fs::read(dir.join("checkpoint_posts_1.json")).unwrap())
                .unwrap();
        let late: Vec<serde_json::Value> =
            serde_json::from_slice(&std::fs::read(dir.join("checkpoint_posts_2.json")).unwrap())
                .unwrap();
        assert_eq!(early.len(), 2);
        assert!(early.iter().all(|row| late.contains(row)));
    }

    #[tokio::test]
    async fn test_interaction_checkpoints_are_written() {
        let tmp = TempDir::new().unwrap();
        let mut config = config(&tmp, 3);
        config.checkpoint.interaction_interval = 1;
        let mut api = three_identities();
        for i in 0..3 {
            let uri = format!("at://did:plc:u{i}/in");
            let fan = actor(&format!("did:plc:fan{i}"), &format!("fan{i}.test"));
            api.likes.insert(
                uri.clone(),
                paged(
                    vec![LikeView {
                        actor: fan.clone(),
                        created_at: Some("2024-06-02T00:00:00Z".into()),
                    }],
                    100,
                ),
            );
            api.reposted_by.insert(uri, paged(vec![fan], 100));
        }
        let storage = LocalStorage::from_config(&config.output);

        run_crawler(&config, &api, &storage).await.unwrap();

        let dir = tmp.path().join("users");
        assert!(dir.join("checkpoint_post_likes_1.json").exists());
        assert!(dir.join("checkpoint_post_reposts_1.json").exists());
        assert!(!dir.join("checkpoint_post_likes_0.json").exists());
        assert!(!dir.join("checkpoint_post_reposts_0.json").exists());
        assert!(!dir.join("checkpoint_post_likes_3.json").exists());

        let read = |name: &str| -> Vec<serde_json::Value> {
            serde_json::from_slice(&std::fs::read(dir.join(name)).unwrap()).unwrap()
        };
        let early = read("checkpoint_post_likes_1.json");
        let late = read("checkpoint_post_likes_2.json");
        assert_eq!(early.len(), 1);
        assert_eq!(late.len(), 2);
        assert!(early.iter().all(|row| late.contains(row)));

        let early = read("checkpoint_post_reposts_1.json");
        let late = read("checkpoint_post_reposts_2.json");
        assert_eq!(early.len(), 1);
        assert!(early.iter().all(|row| late.contains(row)));
    }

    #[tokio::test]
    async fn test_no_identities_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp, 3);
        let api = FakeApi::new();
        let storage = LocalStorage::from_config(&config.output);

        let report = run_crawler(&config, &api, &storage).await.unwrap();

        assert_eq!(report.identities, 0);
        assert!(report.written.is_empty());
        assert!(report.summary.is_none());
        assert!(!tmp.path().join("users").exists());
    }

    #[tokio::test]
    async fn test_discover_identities() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp, 2);
        let api = three_identities();

        let identities = discover_identities(&config, &api).await;

        assert_eq!(identities.len(), 2);
        assert_eq!(identities[0].did, "did:plc:u0");
    }
}
