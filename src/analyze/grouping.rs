// src/analyze/grouping.rs
//! # Article grouping
//! Partitions fresh articles into clusters that report the same event.
//!
//! Stages, cheapest first (later stages only see what earlier ones left):
//! 1. provider event clusters, accepted as given;
//! 2. title-prefix clusters (first three normalized title words);
//! 3. LLM grouping of the residue.
//!
//! Stage 3 is skipped once the first two stages produced `skip_threshold`
//! clusters. That caps oracle cost per run at the price of leaving some
//! paraphrased residue unclustered; it is a deliberate trade-off.
//! Stage 3 failures of any kind contribute zero clusters and never discard
//! clusters from stages 1–2.

use std::collections::{HashMap, HashSet};

use metrics::counter;
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::analyze::ai_adapter::{ChatMessage, DynOracle};
use crate::analyze::extract;
use crate::article::{Article, Cluster, MIN_CLUSTER_SIZE};

pub const GROUPING_PROMPT_MARKER: &str = "Group these news articles by similarity";
pub const DEFAULT_ORACLE_SKIP_THRESHOLD: usize = 3;
pub const DEFAULT_SNIPPET_CHARS: usize = 500;
const TITLE_KEY_WORDS: usize = 3;

const GROUPING_SYSTEM_PROMPT: &str = r#"You are an expert news analyst. Identify news articles that cover the same event.
Group articles by semantic similarity, focusing on the central news event rather than minor details.

Examples of the same event:
- "Trump places 30% tariffs on China" and "USA placed 30% tariffs on China"
- "Facebook announces new AI features" and "Meta unveils artificial intelligence updates"

Respond with a JSON array in which every element is an array of article IDs belonging to one group.
Only group articles about the same specific event. Articles on the same general topic but about different events belong in separate groups."#;

fn re_non_word() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s]").unwrap())
}

/// Lower-case, drop everything that is neither a word character nor
/// whitespace, and join the first three tokens. `None` for shorter titles.
pub fn title_key(title: &str) -> Option<String> {
    let lowered = title.to_lowercase();
    let cleaned = re_non_word().replace_all(&lowered, "");
    let words: Vec<&str> = cleaned.split_whitespace().take(TITLE_KEY_WORDS).collect();
    if words.len() < TITLE_KEY_WORDS {
        return None;
    }
    Some(words.join(" "))
}

/// Stage 2. Clusters come out in first-seen key order; singleton keys are dropped.
pub fn group_by_title<'a, I>(articles: I) -> Vec<(String, Cluster)>
where
    I: IntoIterator<Item = &'a Article>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<(String, Cluster)> = Vec::new();
    for article in articles {
        let Some(key) = title_key(&article.title) else {
            continue;
        };
        match index.get(&key) {
            Some(&i) => buckets[i].1.push(article.clone()),
            None => {
                index.insert(key.clone(), buckets.len());
                buckets.push((key, vec![article.clone()]));
            }
        }
    }
    buckets
        .into_iter()
        .filter(|(_, group)| group.len() >= MIN_CLUSTER_SIZE)
        .collect()
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ManifestEntry {
    pub id: usize,
    pub title: String,
    pub snippet: String,
}

/// Numbered manifest; `id` is the index into `remaining`.
pub fn build_manifest(remaining: &[&Article], snippet_chars: usize) -> Vec<ManifestEntry> {
    remaining
        .iter()
        .enumerate()
        .map(|(id, a)| ManifestEntry {
            id,
            title: a.title.clone(),
            snippet: a.body.chars().take(snippet_chars).collect(),
        })
        .collect()
}

pub fn grouping_messages(manifest: &[ManifestEntry]) -> Vec<ChatMessage> {
    let formatted = serde_json::to_string_pretty(manifest).unwrap_or_else(|_| "[]".to_string());
    let user = format!(
        "{GROUPING_PROMPT_MARKER} (same event/topic):\n\n{formatted}\n\n\
         Return ONLY a JSON array of arrays, where each inner array contains the IDs of similar articles.\n\
         Example: [[0, 3, 7], [1, 5], [2], [4, 6, 8, 9]]"
    );
    vec![ChatMessage::system(GROUPING_SYSTEM_PROMPT), ChatMessage::user(user)]
}

/// Map oracle ids back to articles. Out-of-range ids are skipped, and an
/// article already placed in an emitted cluster is not placed again.
pub fn resolve_id_groups(groups: &[Vec<i64>], remaining: &[&Article]) -> Vec<Cluster> {
    let mut used: HashSet<usize> = HashSet::new();
    let mut out = Vec::new();
    for ids in groups {
        let mut members: Vec<usize> = Vec::new();
        for &id in ids {
            let Ok(idx) = usize::try_from(id) else {
                continue;
            };
            if idx < remaining.len() && !used.contains(&idx) && !members.contains(&idx) {
                members.push(idx);
            }
        }
        if members.len() >= MIN_CLUSTER_SIZE {
            used.extend(members.iter().copied());
            out.push(members.iter().map(|&i| remaining[i].clone()).collect());
        }
    }
    out
}

pub struct ArticleGrouper {
    oracle: DynOracle,
    skip_threshold: usize,
    snippet_chars: usize,
}

impl ArticleGrouper {
    pub fn new(oracle: DynOracle) -> Self {
        Self {
            oracle,
            skip_threshold: DEFAULT_ORACLE_SKIP_THRESHOLD,
            snippet_chars: DEFAULT_SNIPPET_CHARS,
        }
    }

    pub fn with_skip_threshold(mut self, threshold: usize) -> Self {
        self.skip_threshold = threshold;
        self
    }

    pub fn with_snippet_chars(mut self, chars: usize) -> Self {
        self.snippet_chars = chars;
        self
    }

    /// Final partition of `new_articles` plus `pre_grouped` into clusters of
    /// at least two articles.
    pub async fn group(&self, new_articles: &[Article], pre_grouped: Vec<Cluster>) -> Vec<Cluster> {
        // Stage 1
        let mut claimed: HashSet<String> = HashSet::new();
        let mut clusters: Vec<Cluster> = Vec::with_capacity(pre_grouped.len());
        for group in pre_grouped {
            if group.len() < MIN_CLUSTER_SIZE {
                debug!(size = group.len(), "dropping undersized pre-grouped set");
                continue;
            }
            claimed.extend(group.iter().map(Article::identity));
            clusters.push(group);
        }
        counter!("newswire_clusters_total", "stage" => "event").increment(clusters.len() as u64);

        let mut seen: HashSet<String> = HashSet::new();
        let candidates: Vec<&Article> = new_articles
            .iter()
            .filter(|a| {
                let id = a.identity();
                !claimed.contains(&id) && seen.insert(id)
            })
            .collect();

        if candidates.is_empty() {
            return clusters;
        }

        // Stage 2
        let title_groups = group_by_title(candidates.iter().copied());
        counter!("newswire_clusters_total", "stage" => "title").increment(title_groups.len() as u64);
        for (key, group) in title_groups {
            info!(size = group.len(), %key, "Found title-based group");
            claimed.extend(group.iter().map(Article::identity));
            clusters.push(group);
        }

        if clusters.len() >= self.skip_threshold {
            info!(groups = clusters.len(), "skipping AI-based grouping");
            return clusters;
        }

        // Stage 3
        let remaining: Vec<&Article> = candidates
            .into_iter()
            .filter(|a| !claimed.contains(&a.identity()))
            .collect();
        if remaining.len() < MIN_CLUSTER_SIZE {
            return clusters;
        }

        info!(remaining = remaining.len(), "Using AI to group remaining articles");
        let semantic = self.group_semantically(&remaining).await;
        counter!("newswire_clusters_total", "stage" => "oracle").increment(semantic.len() as u64);
        info!(found = semantic.len(), "AI grouping finished");
        clusters.extend(semantic);
        clusters
    }

    async fn group_semantically(&self, remaining: &[&Article]) -> Vec<Cluster> {
        let manifest = build_manifest(remaining, self.snippet_chars);
        let messages = grouping_messages(&manifest);

        counter!("newswire_oracle_calls_total", "purpose" => "grouping").increment(1);
        let reply = match self.oracle.complete(&messages).await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = ?e, provider = self.oracle.provider_name(), "grouping oracle call failed");
                return Vec::new();
            }
        };

        match extract::id_groups(&reply) {
            Ok(ids) => resolve_id_groups(&ids, remaining),
            Err(e) => {
                counter!("newswire_oracle_parse_failures_total", "purpose" => "grouping")
                    .increment(1);
                warn!(error = %e, "Could not extract groups from AI response");
                Vec::new()
            }
        }
    }
}
