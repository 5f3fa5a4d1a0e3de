//! Drain log template mining, and the parser and differ built on it.
//!
//! Drain groups log messages into clusters using a fixed-depth prefix tree:
//! the first level is the token count, the next levels are leading tokens
//! (tokens containing digits fall into a wildcard child). Within a leaf the
//! message joins the most similar cluster if enough tokens agree, and the
//! cluster's template replaces every disagreeing position with the wildcard.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use logbench_core::{
    CancellationToken, DiffError, DiffOptions, DiffResult, Line, LogDiffer, LogParser,
    ParserFactory, Result,
};

use crate::github::GithubLogParser;
use crate::lcs::{actions_from_pairs, lcs_pairs, DEFAULT_MAX_CELLS};

/// Token standing for a variable position in a template.
pub const WILDCARD: &str = "<*>";

/// Miner parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct DrainConfig {
    /// Depth of the prefix tree, counting the token-count level.
    pub max_node_depth: usize,
    /// Fraction of agreeing tokens needed to join a cluster.
    pub sim_threshold: f32,
    /// Children per tree node before new tokens go to the wildcard child.
    pub max_children: usize,
    pub wildcard: String,
}

impl Default for DrainConfig {
    fn default() -> Self {
        Self {
            max_node_depth: 4,
            sim_threshold: 0.5,
            max_children: 100,
            wildcard: WILDCARD.to_string(),
        }
    }
}

/// A group of messages sharing one template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogCluster {
    pub id: usize,
    pub template: Vec<String>,
    /// Messages trained into this cluster.
    pub size: usize,
}

impl LogCluster {
    pub fn template_string(&self) -> String {
        self.template.join(" ")
    }
}

impl fmt::Display for LogCluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template_string())
    }
}

#[derive(Debug, Default)]
struct Node {
    children: HashMap<String, Node>,
    cluster_ids: Vec<usize>,
}

/// Online template miner. Clusters are never evicted.
#[derive(Debug)]
pub struct Drain {
    config: DrainConfig,
    clusters: HashMap<usize, LogCluster>,
    root: Node,
    last_id: usize,
}

impl Default for Drain {
    fn default() -> Self {
        Self::new(DrainConfig::default())
    }
}

impl Drain {
    pub fn new(config: DrainConfig) -> Self {
        Self {
            config,
            clusters: HashMap::new(),
            root: Node::default(),
            last_id: 0,
        }
    }

    pub fn config(&self) -> &DrainConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn cluster(&self, id: usize) -> Option<&LogCluster> {
        self.clusters.get(&id)
    }

    /// Clusters in creation order.
    pub fn clusters(&self) -> Vec<&LogCluster> {
        let mut clusters: Vec<&LogCluster> = self.clusters.values().collect();
        clusters.sort_by_key(|c| c.id);
        clusters
    }

    /// Add `message` to its cluster, creating one if none is close enough.
    /// Returns the cluster id; a message keeps that id for the miner's life.
    pub fn train(&mut self, message: &str) -> usize {
        let tokens = tokenize(message);
        if let Some(id) = self.tree_search(&tokens) {
            let wildcard = &self.config.wildcard;
            if let Some(cluster) = self.clusters.get_mut(&id) {
                cluster.template = merge_template(&tokens, &cluster.template, wildcard);
                cluster.size += 1;
            }
            return id;
        }

        self.last_id += 1;
        let id = self.last_id;
        self.add_to_prefix_tree(id, &tokens);
        self.clusters.insert(
            id,
            LogCluster {
                id,
                template: tokens,
                size: 1,
            },
        );
        id
    }

    /// Cluster `message` would join, without training on it.
    pub fn match_message(&self, message: &str) -> Option<&LogCluster> {
        self.tree_search(&tokenize(message))
            .and_then(|id| self.clusters.get(&id))
    }

    fn tree_search(&self, tokens: &[String]) -> Option<usize> {
        let token_count = tokens.len();
        let mut node = self.root.children.get(&token_count.to_string())?;
        if token_count == 0 {
            return node.cluster_ids.first().copied();
        }

        let mut depth = 1;
        for token in tokens {
            if depth == self.config.max_node_depth || depth == token_count {
                break;
            }
            node = node
                .children
                .get(token)
                .or_else(|| node.children.get(&self.config.wildcard))?;
            depth += 1;
        }
        self.fast_match(&node.cluster_ids, tokens)
    }

    /// Most similar cluster among `ids`, ties going to the more general one.
    fn fast_match(&self, ids: &[usize], tokens: &[String]) -> Option<usize> {
        let mut best: Option<(f32, usize, usize)> = None;
        for cluster in ids.iter().filter_map(|id| self.clusters.get(id)) {
            let (sim, params) = seq_similarity(&cluster.template, tokens, &self.config.wildcard);
            let better = match best {
                None => true,
                Some((best_sim, best_params, _)) => {
                    sim > best_sim || (sim == best_sim && params > best_params)
                }
            };
            if better {
                best = Some((sim, params, cluster.id));
            }
        }
        best.filter(|(sim, _, _)| *sim >= self.config.sim_threshold)
            .map(|(_, _, id)| id)
    }

    fn add_to_prefix_tree(&mut self, id: usize, tokens: &[String]) {
        let max_depth = self.config.max_node_depth;
        let max_children = self.config.max_children;
        let wildcard = self.config.wildcard.clone();
        let token_count = tokens.len();

        let mut node = self.root.children.entry(token_count.to_string()).or_default();
        if token_count == 0 {
            node.cluster_ids.push(id);
            return;
        }

        let mut depth = 1;
        for token in tokens {
            if depth >= max_depth || depth >= token_count {
                node.cluster_ids.push(id);
                return;
            }
            let key = if node.children.contains_key(token) {
                token.clone()
            } else if has_number(token) {
                wildcard.clone()
            } else if node.children.contains_key(&wildcard) {
                if node.children.len() < max_children {
                    token.clone()
                } else {
                    wildcard.clone()
                }
            } else if node.children.len() + 1 < max_children {
                token.clone()
            } else {
                // last free slot is reserved for the wildcard
                wildcard.clone()
            };
            node = node.children.entry(key).or_default();
            depth += 1;
        }
    }
}

/// Fraction of template positions where the message has the same token, and
/// the number of wildcard positions (which never count as a match).
fn seq_similarity(template: &[String], tokens: &[String], wildcard: &str) -> (f32, usize) {
    if template.is_empty() {
        return (1.0, 0);
    }
    let mut same = 0;
    let mut params = 0;
    for (t, m) in template.iter().zip(tokens) {
        if t == wildcard {
            params += 1;
        } else if t == m {
            same += 1;
        }
    }
    (same as f32 / template.len() as f32, params)
}

fn merge_template(tokens: &[String], template: &[String], wildcard: &str) -> Vec<String> {
    tokens
        .iter()
        .zip(template)
        .map(|(m, t)| if m == t { m.clone() } else { wildcard.to_string() })
        .collect()
}

fn has_number(token: &str) -> bool {
    token.chars().any(char::is_numeric)
}

fn tokenize(message: &str) -> Vec<String> {
    message.split_whitespace().map(str::to_string).collect()
}

/// Parser that returns each line's Drain template instead of its text.
///
/// The miner persists across calls, so later files are templated with what
/// earlier files taught it. Build a new parser to start over.
#[derive(Debug)]
pub struct DrainLogParser<P = GithubLogParser> {
    inner: P,
    drain: Mutex<Drain>,
}

impl DrainLogParser<GithubLogParser> {
    pub fn new() -> Self {
        Self::with_parser(GithubLogParser::new(), DrainConfig::default())
    }
}

impl Default for DrainLogParser<GithubLogParser> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: LogParser> DrainLogParser<P> {
    pub fn with_parser(inner: P, config: DrainConfig) -> Self {
        Self {
            inner,
            drain: Mutex::new(Drain::new(config)),
        }
    }

    /// Clusters learned so far.
    pub fn cluster_count(&self) -> usize {
        self.drain.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl<P: LogParser> LogParser for DrainLogParser<P> {
    fn parse(&self, path: &Path) -> Result<Vec<Line>> {
        let lines = self.inner.parse(path)?;
        let mut drain = self.drain.lock().unwrap_or_else(PoisonError::into_inner);
        let ids: Vec<usize> = lines.iter().map(|line| drain.train(&line.value)).collect();
        let templated = lines
            .into_iter()
            .zip(ids)
            .map(|(line, id)| match drain.cluster(id) {
                Some(cluster) => Line::new(cluster.template_string(), line.index),
                None => line,
            })
            .collect();
        debug!(path = ?path, clusters = drain.len(), "log templated");
        Ok(templated)
    }
}

/// Factory for GitHub log parsers that emit Drain templates, one fresh
/// miner per parser.
pub fn drain_parser_factory() -> ParserFactory {
    Arc::new(|| Box::new(DrainLogParser::new()) as Box<dyn LogParser>)
}

/// LCS differ where lines align when Drain puts them in the same cluster.
///
/// A new miner is trained on both logs for every comparison. Aligned lines
/// with different text are `Updated`.
#[derive(Debug, Clone)]
pub struct DrainDiffer {
    config: DrainConfig,
    max_cells: u64,
}

impl Default for DrainDiffer {
    fn default() -> Self {
        Self::new(DrainConfig::default())
    }
}

impl DrainDiffer {
    pub fn new(config: DrainConfig) -> Self {
        Self {
            config,
            max_cells: DEFAULT_MAX_CELLS,
        }
    }

    pub fn with_max_cells(mut self, max_cells: u64) -> Self {
        self.max_cells = max_cells;
        self
    }
}

impl LogDiffer for DrainDiffer {
    fn diff(
        &self,
        left: &[Line],
        right: &[Line],
        _options: &DiffOptions,
        cancel: &CancellationToken,
    ) -> std::result::Result<DiffResult, DiffError> {
        let mut drain = Drain::new(self.config.clone());
        let mut train = |lines: &[Line]| -> std::result::Result<Vec<usize>, DiffError> {
            let mut ids = Vec::with_capacity(lines.len());
            for chunk in lines.chunks(1024) {
                cancel.checkpoint()?;
                ids.extend(chunk.iter().map(|line| drain.train(&line.value)));
            }
            Ok(ids)
        };
        let left_ids = train(left)?;
        let right_ids = train(right)?;

        let pairs = lcs_pairs(left.len(), right.len(), self.max_cells, cancel, |i, j| {
            left_ids[i] == right_ids[j]
        })?;
        Ok(actions_from_pairs(left, right, pairs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logbench_core::{lines_from, ActionType};

    #[test]
    fn similar_messages_share_a_template() {
        let mut drain = Drain::default();
        let a = drain.train("connected to host alpha in 12 ms");
        let b = drain.train("connected to host beta in 40 ms");
        assert_eq!(a, b);
        let cluster = drain.cluster(a).unwrap();
        assert_eq!(cluster.size, 2);
        assert_eq!(cluster.to_string(), "connected to host <*> in <*> ms");
    }

    #[test]
    fn different_lengths_never_share_a_cluster() {
        let mut drain = Drain::default();
        let a = drain.train("test parser ok");
        let b = drain.train("test parser ok now");
        assert_ne!(a, b);
        assert_eq!(drain.len(), 2);
    }

    #[test]
    fn dissimilar_messages_get_new_clusters() {
        let mut drain = Drain::default();
        let a = drain.train("Compiling app v0.1.0");
        let b = drain.train("Finished dev profile target");
        assert_ne!(a, b);
        let ids: Vec<usize> = drain.clusters().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn numeric_tokens_route_through_the_wildcard_child() {
        let mut drain = Drain::default();
        let a = drain.train("job 17 started on runner");
        let b = drain.train("job 18 started on runner");
        assert_eq!(a, b);
        assert_eq!(
            drain.match_message("job 99 started on runner").map(|c| c.id),
            Some(a)
        );
    }

    #[test]
    fn empty_message_has_its_own_cluster() {
        let mut drain = Drain::default();
        let a = drain.train("");
        assert_eq!(drain.train("   "), a);
        assert_eq!(drain.cluster(a).unwrap().template, Vec::<String>::new());
    }

    #[test]
    fn parser_learns_across_files() {
        let tmp = tempfile::tempdir().unwrap();
        let success = tmp.path().join("success.log");
        let failure = tmp.path().join("failure.log");
        std::fs::write(&success, "crate download finished serde 1.0\nbuild done\n").unwrap();
        std::fs::write(&failure, "crate download finished tokio 1.3\nbuild done\n").unwrap();

        let parser = DrainLogParser::new();
        parser.parse(&success).unwrap();
        let right = parser.parse(&failure).unwrap();
        let left = parser.parse(&success).unwrap();

        assert_eq!(left[0].value, "crate download finished <*> <*>");
        assert_eq!(right[0].value, left[0].value);
        assert_eq!(right[1].value, "build done");
        assert_eq!(right[1].index, 1);
        assert_eq!(parser.cluster_count(), 2);
    }

    #[test]
    fn factory_builds_independent_parsers() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("failure.log");
        std::fs::write(&path, "step one\n").unwrap();

        let factory = drain_parser_factory();
        let first = factory();
        first.parse(&path).unwrap();
        let second = factory();
        assert_eq!(second.parse(&path).unwrap()[0].value, "step one");
    }

    #[test]
    fn differ_aligns_lines_of_one_cluster() {
        use ActionType::*;
        let left = lines_from(["fetch 1.0 crate serde", "build", "done"]);
        let right = lines_from(["fetch 1.3 crate tokio", "build", "error: linker", "done"]);
        let result = DrainDiffer::default()
            .diff(&left, &right, &DiffOptions::default(), &CancellationToken::new())
            .unwrap();
        assert_eq!(result.left, vec![Updated, Unchanged, Unchanged]);
        assert_eq!(result.right, vec![Updated, Unchanged, Added, Unchanged]);
    }

    #[test]
    fn differ_stops_when_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        let err = DrainDiffer::default()
            .diff(
                &lines_from(["a"]),
                &lines_from(["a"]),
                &DiffOptions::default(),
                &token,
            )
            .unwrap_err();
        assert_eq!(err, DiffError::Cancelled);
    }
}
