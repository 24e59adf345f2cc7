//! In-memory commit graph
//!
//! The ancestry graph of one repository, loaded once per pass and walked
//! iteratively (explicit queue + visited set; histories can be deep enough
//! that recursion is not an option). Shas referenced by an edge but missing
//! from the commit table simply truncate that branch of a walk: partial
//! graphs degrade to partial closures rather than failing the pass.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{DateTime, Utc};

use crate::models::{commit, commit_parent};

/// One commit node with its parent shas resolved.
#[derive(Debug, Clone)]
pub struct CommitNode {
    pub sha: String,
    pub author: String,
    pub message: String,
    pub authored_at: DateTime<Utc>,
    pub parents: Vec<String>,
}

/// Ancestry graph of a single repository, keyed by sha.
#[derive(Debug, Default)]
pub struct CommitGraph {
    nodes: HashMap<String, CommitNode>,
}

impl CommitGraph {
    pub fn from_rows(commits: Vec<commit::Model>, edges: Vec<commit_parent::Model>) -> Self {
        let mut nodes: HashMap<String, CommitNode> = commits
            .into_iter()
            .map(|row| {
                (
                    row.sha.clone(),
                    CommitNode {
                        sha: row.sha,
                        author: row.author,
                        message: row.message,
                        authored_at: row.authored_at.with_timezone(&Utc),
                        parents: Vec::new(),
                    },
                )
            })
            .collect();

        for edge in edges {
            if let Some(node) = nodes.get_mut(&edge.child_sha) {
                node.parents.push(edge.parent_sha);
            }
        }

        Self { nodes }
    }

    pub fn contains(&self, sha: &str) -> bool {
        self.nodes.contains_key(sha)
    }

    pub fn node(&self, sha: &str) -> Option<&CommitNode> {
        self.nodes.get(sha)
    }

    /// Full ancestor closure of `start`, including `start` itself. Only
    /// shas with a stored commit row appear in the result.
    pub fn ancestor_closure(&self, start: &str) -> HashSet<String> {
        self.walk(start, &HashSet::new())
            .into_iter()
            .map(|node| node.sha.clone())
            .collect()
    }

    /// Ancestors of `start` (inclusive) that lie outside `boundary`. A
    /// boundary sha is recorded as visited when reached but neither
    /// collected nor expanded, so traversal stops at the previous
    /// deployment's closure.
    pub fn ancestors_outside<'a>(
        &'a self,
        start: &str,
        boundary: &HashSet<String>,
    ) -> Vec<&'a CommitNode> {
        self.walk(start, boundary)
    }

    fn walk<'a>(&'a self, start: &str, boundary: &HashSet<String>) -> Vec<&'a CommitNode> {
        let mut collected = Vec::new();
        let mut queue = VecDeque::new();
        let mut visited = HashSet::new();

        if self.nodes.contains_key(start) {
            queue.push_back(start.to_string());
            visited.insert(start.to_string());
        }

        while let Some(sha) = queue.pop_front() {
            if boundary.contains(&sha) {
                continue;
            }

            let Some(node) = self.nodes.get(&sha) else {
                // Referenced by an edge but never synced; truncate here.
                continue;
            };
            collected.push(node);

            for parent in &node.parents {
                if !visited.contains(parent) {
                    visited.insert(parent.clone());
                    queue.push_back(parent.clone());
                }
            }
        }

        collected
    }
}

/// Parent → children adjacency over the whole edge table, for walking the
/// graph forwards (pull-request descendant discovery).
#[derive(Debug, Default)]
pub struct ChildIndex {
    children: HashMap<String, Vec<String>>,
}

impl ChildIndex {
    pub fn from_edges(edges: &[commit_parent::Model]) -> Self {
        let mut children: HashMap<String, Vec<String>> = HashMap::new();
        for edge in edges {
            children
                .entry(edge.parent_sha.clone())
                .or_default()
                .push(edge.child_sha.clone());
        }
        Self { children }
    }

    /// All descendants of `start`, excluding `start` itself.
    pub fn descendants(&self, start: &str) -> HashSet<String> {
        let mut descendants = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(start.to_string());

        while let Some(sha) = queue.pop_front() {
            if let Some(children) = self.children.get(&sha) {
                for child in children {
                    if descendants.insert(child.clone()) {
                        queue.push_back(child.clone());
                    }
                }
            }
        }

        descendants
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn commit_row(sha: &str) -> commit::Model {
        commit::Model {
            sha: sha.to_string(),
            repository_id: 1,
            author: "alice".to_string(),
            message: format!("commit {sha}"),
            authored_at: Utc::now().into(),
        }
    }

    fn edge_row(child: &str, parent: &str) -> commit_parent::Model {
        commit_parent::Model {
            id: 0,
            repository_id: 1,
            child_sha: child.to_string(),
            parent_sha: parent.to_string(),
        }
    }

    fn shas(nodes: Vec<&CommitNode>) -> HashSet<String> {
        nodes.into_iter().map(|n| n.sha.clone()).collect()
    }

    #[test]
    fn closure_of_linear_chain_includes_every_ancestor() {
        let graph = CommitGraph::from_rows(
            vec![commit_row("c1"), commit_row("c2"), commit_row("c3")],
            vec![edge_row("c2", "c1"), edge_row("c3", "c2")],
        );

        let closure = graph.ancestor_closure("c3");
        assert_eq!(
            closure,
            ["c1", "c2", "c3"].iter().map(|s| s.to_string()).collect()
        );
    }

    #[test]
    fn boundary_stops_expansion_and_is_excluded() {
        let graph = CommitGraph::from_rows(
            vec![
                commit_row("prev"),
                commit_row("a"),
                commit_row("b"),
                commit_row("cur"),
            ],
            vec![
                edge_row("a", "prev"),
                edge_row("b", "a"),
                edge_row("cur", "b"),
            ],
        );

        let boundary = graph.ancestor_closure("prev");
        let attributed = shas(graph.ancestors_outside("cur", &boundary));

        assert_eq!(
            attributed,
            ["a", "b", "cur"].iter().map(|s| s.to_string()).collect()
        );
    }

    #[test]
    fn merge_commit_ancestors_are_collected_exactly_once() {
        // base <- left <- merge, base <- right <- merge
        let graph = CommitGraph::from_rows(
            vec![
                commit_row("base"),
                commit_row("left"),
                commit_row("right"),
                commit_row("merge"),
            ],
            vec![
                edge_row("left", "base"),
                edge_row("right", "base"),
                edge_row("merge", "left"),
                edge_row("merge", "right"),
            ],
        );

        let attributed = graph.ancestors_outside("merge", &HashSet::new());
        assert_eq!(attributed.len(), 4);
        assert_eq!(
            shas(attributed),
            ["base", "left", "right", "merge"]
                .iter()
                .map(|s| s.to_string())
                .collect()
        );
    }

    #[test]
    fn missing_start_yields_empty_walk() {
        let graph = CommitGraph::from_rows(vec![commit_row("c1")], vec![]);
        assert!(graph.ancestors_outside("unknown", &HashSet::new()).is_empty());
        assert!(graph.ancestor_closure("unknown").is_empty());
    }

    #[test]
    fn missing_parent_truncates_branch_silently() {
        // c2's parent c1 was never synced; the walk stops at c2.
        let graph = CommitGraph::from_rows(
            vec![commit_row("c2"), commit_row("c3")],
            vec![edge_row("c2", "c1"), edge_row("c3", "c2")],
        );

        let closure = graph.ancestor_closure("c3");
        assert_eq!(
            closure,
            ["c2", "c3"].iter().map(|s| s.to_string()).collect()
        );
    }

    #[test]
    fn start_inside_boundary_yields_empty_attribution() {
        let graph = CommitGraph::from_rows(
            vec![commit_row("c1"), commit_row("c2")],
            vec![edge_row("c2", "c1")],
        );

        let boundary = graph.ancestor_closure("c2");
        assert!(graph.ancestors_outside("c2", &boundary).is_empty());
    }

    #[test]
    fn child_index_walks_forwards() {
        let edges = vec![edge_row("c2", "c1"), edge_row("c3", "c2"), edge_row("c4", "c2")];
        let index = ChildIndex::from_edges(&edges);

        let descendants = index.descendants("c1");
        assert_eq!(
            descendants,
            ["c2", "c3", "c4"].iter().map(|s| s.to_string()).collect()
        );
        assert!(index.descendants("c4").is_empty());
    }
}
