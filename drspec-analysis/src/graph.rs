//! C8 — BFS dependency-graph traversal, cycle detection, and statistics
//! (§4.7).
//!
//! The graph itself is storage-agnostic: it traverses through the
//! [`DependencySource`] trait so this crate never depends on
//! `drspec-storage`, matching how the teacher's `call_graph` module takes
//! an edge provider rather than a concrete database handle.

use drspec_core::{ArtifactStatus, FunctionId};
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Callers,
    Callees,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relationship {
    Root,
    Caller,
    Callee,
}

#[derive(Debug, Clone)]
pub struct ArtifactSummary {
    pub short_name: String,
    pub file_path: String,
    pub status: ArtifactStatus,
    pub has_contract: bool,
}

/// Read-only access to dependency edges and artifact metadata, implemented
/// by `drspec-storage`'s repository.
pub trait DependencySource {
    fn callees(&self, id: &FunctionId) -> Vec<FunctionId>;
    fn callers(&self, id: &FunctionId) -> Vec<FunctionId>;
    fn artifact_summary(&self, id: &FunctionId) -> Option<ArtifactSummary>;
}

#[derive(Debug, Clone)]
pub struct GraphNode {
    pub id: FunctionId,
    pub short_name: String,
    pub file_path: String,
    pub status: ArtifactStatus,
    pub has_contract: bool,
    pub depth: usize,
    pub relationship: Relationship,
}

#[derive(Debug, Clone)]
pub struct GraphEdge {
    pub caller: FunctionId,
    pub callee: FunctionId,
    pub is_cycle: bool,
}

#[derive(Debug, Clone)]
pub struct DependencyGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub has_cycles: bool,
    pub max_depth_reached: usize,
}

/// BFS from `root`, expanding callee edges if `direction != Callers` and
/// caller edges if `direction != Callees` (§4.7).
pub fn get_graph(
    source: &dyn DependencySource,
    root: &FunctionId,
    depth: usize,
    direction: Direction,
) -> DependencyGraph {
    let depth = depth.clamp(1, 5);

    let Some(root_summary) = source.artifact_summary(root) else {
        return DependencyGraph {
            nodes: vec![GraphNode {
                id: root.clone(),
                short_name: root.short_name().to_string(),
                file_path: root.path().to_string(),
                status: ArtifactStatus::Unknown,
                has_contract: false,
                depth: 0,
                relationship: Relationship::Root,
            }],
            edges: Vec::new(),
            has_cycles: false,
            max_depth_reached: 0,
        };
    };

    let mut visited_depth: HashMap<FunctionId, usize> = HashMap::new();
    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    let mut has_cycles = false;
    let mut max_depth_reached = 0usize;

    visited_depth.insert(root.clone(), 0);
    nodes.push(GraphNode {
        id: root.clone(),
        short_name: root_summary.short_name,
        file_path: root_summary.file_path,
        status: root_summary.status,
        has_contract: root_summary.has_contract,
        depth: 0,
        relationship: Relationship::Root,
    });

    let mut queue: VecDeque<(FunctionId, usize)> = VecDeque::new();
    queue.push_back((root.clone(), 0));

    let expand_callees = !matches!(direction, Direction::Callers);
    let expand_callers = !matches!(direction, Direction::Callees);

    while let Some((current, current_depth)) = queue.pop_front() {
        if current_depth >= depth {
            continue;
        }

        let mut neighbors: Vec<(FunctionId, Relationship)> = Vec::new();
        if expand_callees {
            neighbors.extend(
                source
                    .callees(&current)
                    .into_iter()
                    .map(|n| (n, Relationship::Callee)),
            );
        }
        if expand_callers {
            neighbors.extend(
                source
                    .callers(&current)
                    .into_iter()
                    .map(|n| (n, Relationship::Caller)),
            );
        }

        for (neighbor, relationship) in neighbors {
            let (caller, callee) = match relationship {
                Relationship::Callee => (current.clone(), neighbor.clone()),
                _ => (neighbor.clone(), current.clone()),
            };

            if let Some(&seen_depth) = visited_depth.get(&neighbor) {
                let _ = seen_depth;
                edges.push(GraphEdge {
                    caller,
                    callee,
                    is_cycle: true,
                });
                has_cycles = true;
                continue;
            }

            edges.push(GraphEdge {
                caller,
                callee,
                is_cycle: false,
            });

            let next_depth = current_depth + 1;
            visited_depth.insert(neighbor.clone(), next_depth);
            max_depth_reached = max_depth_reached.max(next_depth);

            let summary = source.artifact_summary(&neighbor);
            nodes.push(GraphNode {
                id: neighbor.clone(),
                short_name: summary
                    .as_ref()
                    .map(|s| s.short_name.clone())
                    .unwrap_or_else(|| neighbor.short_name().to_string()),
                file_path: summary
                    .as_ref()
                    .map(|s| s.file_path.clone())
                    .unwrap_or_else(|| neighbor.path().to_string()),
                status: summary
                    .as_ref()
                    .map(|s| s.status)
                    .unwrap_or(ArtifactStatus::Unknown),
                has_contract: summary.as_ref().map(|s| s.has_contract).unwrap_or(false),
                depth: next_depth,
                relationship,
            });

            if next_depth < depth {
                queue.push_back((neighbor, next_depth));
            }
        }
    }

    nodes.sort_by(|a, b| a.depth.cmp(&b.depth).then_with(|| a.id.cmp(&b.id)));

    DependencyGraph {
        nodes,
        edges,
        has_cycles,
        max_depth_reached,
    }
}

#[derive(Debug, Clone, Default)]
pub struct GraphStats {
    pub total_artifacts: usize,
    pub total_edges: usize,
    pub with_contract: usize,
    pub top_outgoing: Vec<(FunctionId, usize)>,
    pub top_incoming: Vec<(FunctionId, usize)>,
}

/// Compute graph-wide statistics from the full edge list.
pub fn compute_stats(
    edges: &[(FunctionId, FunctionId)],
    artifacts_with_contract: &HashSet<FunctionId>,
    total_artifacts: usize,
) -> GraphStats {
    let mut outgoing: HashMap<FunctionId, usize> = HashMap::new();
    let mut incoming: HashMap<FunctionId, usize> = HashMap::new();
    for (caller, callee) in edges {
        *outgoing.entry(caller.clone()).or_insert(0) += 1;
        *incoming.entry(callee.clone()).or_insert(0) += 1;
    }

    let mut top_outgoing: Vec<(FunctionId, usize)> = outgoing.into_iter().collect();
    top_outgoing.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top_outgoing.truncate(10);

    let mut top_incoming: Vec<(FunctionId, usize)> = incoming.into_iter().collect();
    top_incoming.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top_incoming.truncate(10);

    GraphStats {
        total_artifacts,
        total_edges: edges.len(),
        with_contract: artifacts_with_contract.len(),
        top_outgoing,
        top_incoming,
    }
}
