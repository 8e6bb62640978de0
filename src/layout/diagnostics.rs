//! Failure diagnostics for chains that produced no layout
//!
//! Purely informational: the report is logged and used as the failure
//! detail, it never changes what the search does next.

use std::fmt;

use ordered_float::OrderedFloat;

use crate::layout::energy::{edge_penalty, pair_penalty, LayoutContext};
use crate::layout::placement::RoomPlacement;

const TOP: usize = 3;

/// One scored pair of nodes
#[derive(Debug, Clone, PartialEq)]
pub struct PairScore {
    pub a: String,
    pub b: String,
    pub penalty: f64,
}

/// A high-degree node and how its template's sockets are spread
#[derive(Debug, Clone, PartialEq)]
pub struct BusyNode {
    pub label: String,
    pub degree: usize,
    /// Socket count per side (N, E, S, W)
    pub sockets: [usize; 4],
}

/// Snapshot of the worst terms of a state's energy
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyReport {
    pub total: f64,
    pub overlaps: Vec<PairScore>,
    pub unsatisfied: Vec<PairScore>,
    pub busy_nodes: Vec<BusyNode>,
}

impl EnergyReport {
    pub fn from_rooms(ctx: &LayoutContext<'_>, rooms: &[Option<RoomPlacement>]) -> Self {
        let mut overlaps = Vec::new();
        let mut unsatisfied = Vec::new();
        let mut total = 0.0;

        for (i, a) in rooms.iter().enumerate() {
            let Some(a) = a else { continue };
            for b in rooms.iter().skip(i + 1).flatten() {
                let overlap = pair_penalty(ctx, a, b);
                total += overlap;
                if overlap > 0.0 {
                    overlaps.push(score(ctx, a, b, overlap));
                }
                if ctx.graph.is_adjacent(a.node, b.node) {
                    let distance = edge_penalty(ctx, a, b);
                    total += distance;
                    if distance > 0.0 {
                        unsatisfied.push(score(ctx, a, b, distance));
                    }
                }
            }
        }
        top_by_penalty(&mut overlaps);
        top_by_penalty(&mut unsatisfied);

        let mut busy: Vec<(usize, &RoomPlacement)> = rooms
            .iter()
            .flatten()
            .map(|r| (ctx.graph.degree(r.node), r))
            .filter(|(degree, _)| *degree > 2)
            .collect();
        busy.sort_by(|(da, a), (db, b)| db.cmp(da).then(a.node.cmp(&b.node)));
        let busy_nodes = busy
            .into_iter()
            .take(TOP)
            .map(|(degree, r)| BusyNode {
                label: ctx.graph.label(r.node).to_string(),
                degree,
                sockets: r.shape.sockets_per_side(),
            })
            .collect();

        Self {
            total,
            overlaps,
            unsatisfied,
            busy_nodes,
        }
    }
}

fn score(ctx: &LayoutContext<'_>, a: &RoomPlacement, b: &RoomPlacement, penalty: f64) -> PairScore {
    PairScore {
        a: ctx.graph.label(a.node).to_string(),
        b: ctx.graph.label(b.node).to_string(),
        penalty,
    }
}

/// Highest penalty first (stable for ties), keep the top few
fn top_by_penalty(scores: &mut Vec<PairScore>) {
    scores.sort_by_key(|s| std::cmp::Reverse(OrderedFloat(s.penalty)));
    scores.truncate(TOP);
}

impl fmt::Display for EnergyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "best energy {}", self.total)?;
        if !self.overlaps.is_empty() {
            let parts: Vec<String> = self
                .overlaps
                .iter()
                .map(|s| format!("{}/{} ({})", s.a, s.b, s.penalty))
                .collect();
            write!(f, "; overlaps: {}", parts.join(", "))?;
        }
        if !self.unsatisfied.is_empty() {
            let parts: Vec<String> = self
                .unsatisfied
                .iter()
                .map(|s| format!("{}-{} ({})", s.a, s.b, s.penalty))
                .collect();
            write!(f, "; unsatisfied edges: {}", parts.join(", "))?;
        }
        for node in &self.busy_nodes {
            let [n, e, s, w] = node.sockets;
            write!(
                f,
                "; {} has degree {} with sockets N{} E{} S{} W{}",
                node.label, node.degree, n, e, s, w
            )?;
        }
        Ok(())
    }
}
