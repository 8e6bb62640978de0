//! Chain decomposition
//!
//! The search places the graph one chain at a time. Chains are cycles
//! (whole faces) or paths, ordered so that every chain after the first
//! touches what is already placed whenever the graph allows it. Every node
//! is placed by exactly one chain and every edge is checked by exactly one
//! chain: the one in which its second endpoint gets placed.

use std::collections::VecDeque;

use crate::core::error::{LayoutError, Result};
use crate::graph::layout_graph::{LayoutGraph, LayoutNodeKey};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    /// Node indices in placement order
    pub nodes: Vec<usize>,
    /// Edge indices that become checkable once this chain is placed
    pub edges: Vec<usize>,
    pub is_cycle: bool,
}

/// Cycle basis from a BFS spanning tree rooted at node 0
///
/// One cycle per non-tree edge, in edge order. Used when the caller has no
/// planar embedding to offer.
pub fn fundamental_cycles(graph: &LayoutGraph) -> Vec<Vec<usize>> {
    let n = graph.node_count();
    if n == 0 {
        return Vec::new();
    }
    let mut parent: Vec<Option<(usize, usize)>> = vec![None; n];
    let mut depth = vec![usize::MAX; n];
    let mut queue = VecDeque::from([0]);
    depth[0] = 0;
    while let Some(node) = queue.pop_front() {
        for &(next, edge) in graph.neighbors(node) {
            if depth[next] == usize::MAX {
                depth[next] = depth[node] + 1;
                parent[next] = Some((node, edge));
                queue.push_back(next);
            }
        }
    }

    let is_tree_edge = |edge: usize, a: usize, b: usize| {
        parent[a].map(|(_, e)| e) == Some(edge) || parent[b].map(|(_, e)| e) == Some(edge)
    };

    let mut cycles = Vec::new();
    for (e, edge) in graph.edges().iter().enumerate() {
        if is_tree_edge(e, edge.a, edge.b) || depth[edge.a] == usize::MAX || depth[edge.b] == usize::MAX {
            continue;
        }
        // Walk both ends up to their lowest common ancestor
        let (mut a, mut b) = (edge.a, edge.b);
        let mut up = vec![a];
        let mut down = vec![b];
        while a != b {
            if depth[a] >= depth[b] {
                a = parent[a].map(|(p, _)| p).unwrap_or(a);
                up.push(a);
            } else {
                b = parent[b].map(|(p, _)| p).unwrap_or(b);
                down.push(b);
            }
        }
        // `up` ends at the ancestor; `down` ends there too
        down.pop();
        up.extend(down.into_iter().rev());
        cycles.push(up);
    }
    cycles
}

/// Decompose the whole graph into chains
///
/// Uses the graph's faces when present, otherwise a fundamental cycle
/// basis. Tree parts become paths of at most `max_tree_len` nodes.
pub fn build_chains(graph: &LayoutGraph, max_tree_len: usize) -> Vec<Chain> {
    let faces = match graph.faces() {
        Some(faces) => faces.to_vec(),
        None => fundamental_cycles(graph),
    };
    let n = graph.node_count();
    let mut covered = vec![false; n];
    let mut face_used = vec![false; faces.len()];
    let mut chains: Vec<(Vec<usize>, bool)> = Vec::new();
    let max_tree_len = max_tree_len.max(1);

    let anchor = graph.nodes().iter().position(|node| node.pinned.is_some());
    let mut remaining = n;

    while remaining > 0 {
        let any_covered = remaining < n;

        // Faces touching what is already placed: most covered nodes first
        let touching = faces
            .iter()
            .enumerate()
            .filter(|(i, face)| {
                !face_used[*i]
                    && face.iter().any(|&v| covered[v])
                    && face.iter().any(|&v| !covered[v])
            })
            .max_by(|(i, a), (j, b)| {
                let ca = a.iter().filter(|&&v| covered[v]).count();
                let cb = b.iter().filter(|&&v| covered[v]).count();
                ca.cmp(&cb).then(b.len().cmp(&a.len())).then(j.cmp(i))
            })
            .map(|(i, _)| i);

        if let Some(f) = touching {
            face_used[f] = true;
            for segment in uncovered_segments(&faces[f], &covered) {
                for &v in &segment {
                    covered[v] = true;
                }
                remaining -= segment.len();
                chains.push((segment, false));
            }
            continue;
        }

        if !any_covered {
            let first_face = faces
                .iter()
                .enumerate()
                .filter(|(_, face)| anchor.map_or(true, |a| face.contains(&a)))
                .min_by(|(i, a), (j, b)| a.len().cmp(&b.len()).then(i.cmp(j)))
                .map(|(i, _)| i);
            if let Some(f) = first_face {
                face_used[f] = true;
                let cycle = rotate_to(&faces[f], anchor);
                for &v in &cycle {
                    covered[v] = true;
                }
                remaining -= cycle.len();
                chains.push((cycle, true));
                continue;
            }
        }

        // Tree growth from the placed frontier
        let start = if any_covered {
            (0..n).find(|&v| !covered[v] && graph.neighbors(v).iter().any(|&(u, _)| covered[u]))
        } else {
            Some(anchor.unwrap_or(0))
        };
        // Disconnected remainder: start anywhere uncovered
        let start = start.or_else(|| (0..n).find(|&v| !covered[v])).unwrap_or(0);

        let mut path = vec![start];
        covered[start] = true;
        while path.len() < max_tree_len {
            let last = path[path.len() - 1];
            let next = graph
                .neighbors(last)
                .iter()
                .map(|&(u, _)| u)
                .filter(|&u| !covered[u])
                .min();
            let Some(next) = next else { break };
            covered[next] = true;
            path.push(next);
        }
        remaining -= path.len();
        chains.push((path, false));
    }

    assign_edges(graph, chains)
}

/// Chains from caller-supplied node lists
///
/// Each node must appear in exactly one list; edges are assigned
/// automatically.
pub fn chains_from_node_lists(graph: &LayoutGraph, lists: &[Vec<LayoutNodeKey>]) -> Result<Vec<Chain>> {
    let mut seen = vec![false; graph.node_count()];
    let mut chains = Vec::with_capacity(lists.len());
    for (c, list) in lists.iter().enumerate() {
        if list.is_empty() {
            return Err(LayoutError::InvalidChains(format!("chain {} is empty", c)));
        }
        let mut nodes = Vec::with_capacity(list.len());
        for key in list {
            let index = graph
                .index_of(*key)
                .ok_or_else(|| LayoutError::InvalidChains(format!("chain {} names unknown node {:?}", c, key)))?;
            if seen[index] {
                return Err(LayoutError::InvalidChains(format!(
                    "{} appears in more than one chain",
                    graph.label(index)
                )));
            }
            seen[index] = true;
            nodes.push(index);
        }
        let is_cycle = nodes.len() >= 3 && graph.is_adjacent(nodes[0], nodes[nodes.len() - 1]);
        chains.push((nodes, is_cycle));
    }
    if let Some(missing) = seen.iter().position(|s| !s) {
        return Err(LayoutError::InvalidChains(format!(
            "{} is not in any chain",
            graph.label(missing)
        )));
    }
    Ok(assign_edges(graph, chains))
}

/// Maximal runs of uncovered nodes along a face cycle, each starting right
/// after a covered node
fn uncovered_segments(face: &[usize], covered: &[bool]) -> Vec<Vec<usize>> {
    let Some(pivot) = face.iter().position(|&v| covered[v]) else {
        return vec![face.to_vec()];
    };
    let mut segments = Vec::new();
    let mut current = Vec::new();
    for step in 1..=face.len() {
        let v = face[(pivot + step) % face.len()];
        if covered[v] {
            if !current.is_empty() {
                segments.push(std::mem::take(&mut current));
            }
        } else {
            current.push(v);
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

fn rotate_to(face: &[usize], anchor: Option<usize>) -> Vec<usize> {
    let start = anchor
        .and_then(|a| face.iter().position(|&v| v == a))
        .unwrap_or(0);
    face[start..].iter().chain(&face[..start]).copied().collect()
}

fn assign_edges(graph: &LayoutGraph, chains: Vec<(Vec<usize>, bool)>) -> Vec<Chain> {
    let mut placed_in = vec![usize::MAX; graph.node_count()];
    for (c, (nodes, _)) in chains.iter().enumerate() {
        for &v in nodes {
            placed_in[v] = c;
        }
    }
    let mut out: Vec<Chain> = chains
        .into_iter()
        .map(|(nodes, is_cycle)| Chain {
            nodes,
            edges: Vec::new(),
            is_cycle,
        })
        .collect();
    for (e, edge) in graph.edges().iter().enumerate() {
        let c = placed_in[edge.a].max(placed_in[edge.b]);
        if let Some(chain) = out.get_mut(c) {
            chain.edges.push(e);
        }
    }
    out
}
