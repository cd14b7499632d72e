//! Domain ranking by inbound links
//!
//! Domains are ranked by how many distinct parent domains link to them.
//! Before counting, names are folded through the static domain mappings or,
//! when no mapping applies, down to their registrable domain, so that
//! `www.example.com` and `blog.example.com` count as one site. Links from a
//! site to itself are ignored.

use crate::storage::{DomainMapping, Reporting};
use crate::url::registrable_domain;
use crate::MapperError;
use std::collections::{BTreeMap, BTreeSet};

/// One row of the ranking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankEntry {
    /// 1-based position
    pub rank: usize,
    pub domain: String,
    /// Number of distinct linking domains
    pub parents: u64,
}

/// Folds domain names into the site they belong to
#[derive(Debug, Clone, Default)]
pub struct DomainAggregator {
    mappings: Vec<DomainMapping>,
}

impl DomainAggregator {
    pub fn new(mappings: Vec<DomainMapping>) -> Self {
        Self { mappings }
    }

    /// Returns the aggregated name for `domain`
    ///
    /// The first applicable mapping wins; otherwise the registrable domain
    /// is used.
    pub fn canonical(&self, domain: &str) -> String {
        self.mappings
            .iter()
            .find(|mapping| mapping.applies_to(domain))
            .map(|mapping| mapping.new_domain.to_lowercase())
            .unwrap_or_else(|| registrable_domain(domain))
    }
}

/// Ranks aggregated domains from (parent, child) relationship pairs
pub fn rank_domains(pairs: &[(String, String)], aggregator: &DomainAggregator) -> Vec<RankEntry> {
    let mut parents: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for (parent, child) in pairs {
        let parent = aggregator.canonical(parent);
        let child = aggregator.canonical(child);
        if parent == child {
            continue;
        }
        parents.entry(child).or_default().insert(parent);
    }

    let counts = parents
        .into_iter()
        .map(|(domain, linking)| (domain, linking.len() as u64))
        .collect();

    assign_ranks(counts)
}

/// A computed ranking plus the aggregation it was built with
#[derive(Debug, Clone)]
pub struct Ranking {
    entries: Vec<RankEntry>,
    /// `None` for raw rankings over stored names
    aggregator: Option<DomainAggregator>,
}

impl Ranking {
    /// Builds an aggregated ranking from (parent, child) pairs
    pub fn aggregated(pairs: &[(String, String)], aggregator: DomainAggregator) -> Self {
        Self {
            entries: rank_domains(pairs, &aggregator),
            aggregator: Some(aggregator),
        }
    }

    /// Builds a ranking over stored names from (domain, parent count) pairs
    pub fn raw(counts: Vec<(String, u64)>) -> Self {
        Self {
            entries: assign_ranks(counts),
            aggregator: None,
        }
    }

    pub fn entries(&self) -> &[RankEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up the entry a queried domain name counts towards
    ///
    /// Aggregated rankings fold the query the same way the ranked names
    /// were folded, so `www.example.com` finds `example.com`.
    pub fn find(&self, query: &str) -> Option<&RankEntry> {
        let query = query.trim().to_lowercase();
        match &self.aggregator {
            Some(aggregator) => find_domain(&self.entries, &aggregator.canonical(&query)),
            None => find_domain(&self.entries, &query),
        }
    }
}

/// Loads relationships and mappings from storage and ranks domains
///
/// With `raw` set, domain names are ranked as stored, without aggregation.
pub fn load_ranking<S: Reporting>(storage: &S, raw: bool) -> Result<Ranking, MapperError> {
    if raw {
        return Ok(Ranking::raw(storage.parent_counts()?));
    }

    let aggregator = DomainAggregator::new(storage.load_domain_mappings()?);
    let pairs = storage.list_relationships()?;
    Ok(Ranking::aggregated(&pairs, aggregator))
}

/// Finds the entry for `domain`, matching case-insensitively
pub fn find_domain<'a>(entries: &'a [RankEntry], domain: &str) -> Option<&'a RankEntry> {
    entries
        .iter()
        .find(|entry| entry.domain.eq_ignore_ascii_case(domain))
}

/// Prints the first `top` entries to stdout
pub fn print_ranking(entries: &[RankEntry], top: usize) {
    println!("=== Domain Ranking ===\n");

    if entries.is_empty() {
        println!("No domain relationships recorded yet.");
        return;
    }

    println!("{:>6}  {:>8}  Domain", "Rank", "Parents");
    for entry in entries.iter().take(top) {
        println!("{:>6}  {:>8}  {}", entry.rank, entry.parents, entry.domain);
    }

    if entries.len() > top {
        println!("\n... and {} more", entries.len() - top);
    }
}

fn assign_ranks(mut counts: Vec<(String, u64)>) -> Vec<RankEntry> {
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
        .into_iter()
        .enumerate()
        .map(|(i, (domain, parents))| RankEntry {
            rank: i + 1,
            domain,
            parents,
        })
        .collect()
}
