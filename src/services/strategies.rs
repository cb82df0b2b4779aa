//! Ordered catalog of identity-discovery probes.

/// Remote query behind a probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeQuery {
    /// Home timeline of the session account
    Timeline,
    /// A custom feed generator
    Feed { uri: String },
    /// Full-text post search
    Search { term: String },
}

/// One named way of finding candidate identities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    pub name: String,
    pub query: ProbeQuery,
    pub page_size: u32,
}

impl Probe {
    pub fn new(name: impl Into<String>, query: ProbeQuery, page_size: u32) -> Self {
        Self {
            name: name.into(),
            query,
            page_size,
        }
    }
}

/// Search terms used when no custom catalog is supplied.
const SEARCH_TERMS: [&str; 8] = [
    "news", "update", "today", "like", "follow", "tech", "art", "music",
];

/// Immutable, ordered list of probes.
#[derive(Debug, Clone)]
pub struct StrategyCatalog {
    probes: Vec<Probe>,
}

impl StrategyCatalog {
    pub fn new(probes: Vec<Probe>) -> Self {
        Self { probes }
    }

    /// Timeline, the trending feed, then one search per common term.
    pub fn standard(trending_feed: &str, page_size: u32) -> Self {
        let mut probes = vec![
            Probe::new("timeline", ProbeQuery::Timeline, page_size),
            Probe::new(
                "popular feed",
                ProbeQuery::Feed {
                    uri: trending_feed.to_string(),
                },
                page_size,
            ),
        ];
        probes.extend(SEARCH_TERMS.iter().map(|term| {
            Probe::new(
                format!("search - {term}"),
                ProbeQuery::Search {
                    term: term.to_string(),
                },
                page_size,
            )
        }));
        Self { probes }
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Probe> {
        self.probes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_order() {
        let catalog = StrategyCatalog::standard("at://feed", 100);
        let names: Vec<_> = catalog.iter().map(|p| p.name.as_str()).collect();

        assert_eq!(catalog.len(), 10);
        assert_eq!(names[0], "timeline");
        assert_eq!(names[1], "popular feed");
        assert_eq!(names[2], "search - news");
        assert_eq!(names[9], "search - music");
        assert!(catalog.iter().all(|p| p.page_size == 100));
    }
}
