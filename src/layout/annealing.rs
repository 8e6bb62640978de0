//! Per-chain layout search
//!
//! Extends a partial layout by one chain and returns up to `max_layouts`
//! distinct completions. Chains of one or two nodes are enumerated
//! directly; longer chains get a greedy start followed by simulated
//! annealing over the chain's movable nodes.

use std::collections::VecDeque;
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, trace, warn};

use crate::core::types::manhattan;
use crate::graph::Chain;
use crate::layout::candidates::{shuffled, CandidateFinder};
use crate::layout::diagnostics::EnergyReport;
use crate::layout::energy::LayoutContext;
use crate::layout::placement::{LayoutState, PlacementPatch, RoomPlacement};
use crate::layout::validation::try_validate_layout;
use crate::shapes::ModuleShape;

/// What one chain expansion produced
#[derive(Debug, Default)]
pub struct ChainOutcome {
    /// Completed states, each with `chain_index` advanced past this chain
    pub layouts: Vec<LayoutState>,
    /// Why nothing was produced; `None` when `layouts` is non-empty
    pub failure: Option<String>,
}

/// Lowest-energy placement seen so far, kept for diagnostics only
#[derive(Default)]
struct BestSeen {
    energy: f64,
    rooms: Option<Vec<Option<RoomPlacement>>>,
}

impl BestSeen {
    fn observe(&mut self, state: &LayoutState) {
        let energy = state.energy.total();
        if self.rooms.is_none() || energy < self.energy {
            self.energy = energy;
            self.rooms = Some(state.rooms.clone());
        }
    }
}

pub struct ChainSolver<'a> {
    ctx: LayoutContext<'a>,
    finder: CandidateFinder,
}

impl<'a> ChainSolver<'a> {
    /// Fails when `ctx.settings` is out of range
    pub fn new(ctx: LayoutContext<'a>) -> crate::core::error::Result<Self> {
        ctx.settings.validate()?;
        Ok(Self {
            ctx,
            finder: CandidateFinder::new(),
        })
    }

    /// Place `chain` on top of `base`
    pub fn add_chain<R: Rng + ?Sized>(
        &mut self,
        base: &LayoutState,
        chain: &Chain,
        max_layouts: usize,
        rng: &mut R,
    ) -> ChainOutcome {
        let max_layouts = max_layouts.max(1);
        let mut accepted = Vec::new();
        let mut best = BestSeen::default();

        let early_failure = if chain.nodes.is_empty() {
            self.try_accept(base, base.chain_index, chain, &mut accepted);
            None
        } else if chain.nodes.len() <= 2 {
            self.enumerate(base, chain, max_layouts, &mut accepted, &mut best, rng);
            None
        } else {
            self.anneal(base, chain, max_layouts, &mut accepted, &mut best, rng)
                .err()
        };

        if !accepted.is_empty() {
            debug!(
                "Chain {} ({} nodes, {} edges): {} layouts",
                base.chain_index,
                chain.nodes.len(),
                chain.edges.len(),
                accepted.len()
            );
            return ChainOutcome {
                layouts: accepted,
                failure: None,
            };
        }

        let detail = match (early_failure, &best.rooms) {
            (Some(reason), _) => reason,
            (None, Some(rooms)) => EnergyReport::from_rooms(&self.ctx, rooms).to_string(),
            (None, None) => "no position candidates".to_string(),
        };
        let failure = format!(
            "chain {} ({} nodes) produced no layout: {}",
            base.chain_index,
            chain.nodes.len(),
            detail
        );
        debug!("{}", failure);
        ChainOutcome {
            layouts: accepted,
            failure: Some(failure),
        }
    }

    /// Try every template and candidate for one or two nodes
    fn enumerate<R: Rng + ?Sized>(
        &mut self,
        base: &LayoutState,
        chain: &Chain,
        max_layouts: usize,
        accepted: &mut Vec<LayoutState>,
        best: &mut BestSeen,
        rng: &mut R,
    ) {
        let ctx = self.ctx;
        let mut state = base.clone();
        let first = chain.nodes[0];
        let second = chain.nodes.get(1).copied();

        for shape in self.shapes_for(first, rng) {
            let positions = shuffled(self.finder.find(&ctx, &state.rooms, first, &shape, rng), rng);
            for root in positions {
                let undo = state.energy.apply_move(
                    &ctx,
                    &mut state.rooms,
                    first,
                    PlacementPatch::new(shape.clone(), root),
                );
                match second {
                    Some(second) => {
                        for shape in self.shapes_for(second, rng) {
                            let positions =
                                shuffled(self.finder.find(&ctx, &state.rooms, second, &shape, rng), rng);
                            for root in positions {
                                let undo = state.energy.apply_move(
                                    &ctx,
                                    &mut state.rooms,
                                    second,
                                    PlacementPatch::new(shape.clone(), root),
                                );
                                best.observe(&state);
                                self.try_accept(&state, base.chain_index, chain, accepted);
                                state.energy.revert(&mut state.rooms, undo);
                                if accepted.len() >= max_layouts {
                                    return;
                                }
                            }
                        }
                    }
                    None => {
                        best.observe(&state);
                        self.try_accept(&state, base.chain_index, chain, accepted);
                    }
                }
                state.energy.revert(&mut state.rooms, undo);
                if accepted.len() >= max_layouts {
                    return;
                }
            }
        }
    }

    /// Greedy start, then simulated annealing
    ///
    /// `Err` carries a reason when not even a starting layout exists.
    fn anneal<R: Rng + ?Sized>(
        &mut self,
        base: &LayoutState,
        chain: &Chain,
        max_layouts: usize,
        accepted: &mut Vec<LayoutState>,
        best: &mut BestSeen,
        rng: &mut R,
    ) -> Result<(), String> {
        let ctx = self.ctx;
        let settings = ctx.settings;
        let mut state = base.clone();

        for node in self.greedy_order(&state, chain) {
            let mut choice: Option<(f64, PlacementPatch)> = None;
            for shape in self.shapes_for(node, rng) {
                let positions = shuffled(self.finder.find(&ctx, &state.rooms, node, &shape, rng), rng);
                for root in positions {
                    let patch = PlacementPatch::new(shape.clone(), root);
                    let undo = state.energy.apply_move(&ctx, &mut state.rooms, node, patch.clone());
                    let energy = state.energy.total();
                    state.energy.revert(&mut state.rooms, undo);
                    if choice.as_ref().map_or(true, |(e, _)| energy < *e) {
                        choice = Some((energy, patch));
                    }
                }
            }
            let Some((_, patch)) = choice else {
                return Err(format!("no position candidates for {}", ctx.graph.label(node)));
            };
            state.energy.apply_move(&ctx, &mut state.rooms, node, patch);
        }
        best.observe(&state);
        self.try_accept(&state, base.chain_index, chain, accepted);

        let movable: Vec<usize> = chain
            .nodes
            .iter()
            .copied()
            .filter(|&n| ctx.graph.node(n).pinned.is_none())
            .collect();
        if movable.is_empty() || accepted.len() >= max_layouts {
            return Ok(());
        }

        let mut temperature = settings.initial_temperature;
        for step in 0..settings.temperature_steps {
            for _ in 0..settings.inner_iterations {
                let node = movable[rng.gen_range(0..movable.len())];
                let Some(current) = &state.rooms[node] else { continue };
                let (current_template, current_root) = (current.template, current.root);
                let mut shape = current.shape.clone();

                let templates = &ctx.graph.node(node).templates;
                let mut changed = false;
                if templates.len() > 1 && rng.gen_bool(settings.change_prefab_probability) {
                    let others: Vec<_> = templates.iter().filter(|&&t| t != current_template).collect();
                    if let Some(&&template) = others.choose(rng) {
                        match ctx.shapes.shape(template) {
                            Some(next) => {
                                shape = next;
                                changed = true;
                            }
                            None => continue,
                        }
                    }
                }

                let candidates = if !changed && rng.gen_bool(settings.wiggle_probability) {
                    self.finder
                        .wiggle(&ctx, &state.rooms, node, &shape, current_root, rng)
                } else {
                    self.finder.find(&ctx, &state.rooms, node, &shape, rng)
                };
                let Some(&root) = candidates.choose(rng) else { continue };
                if !changed && root == current_root {
                    continue;
                }

                let before = state.energy.total();
                let undo = state
                    .energy
                    .apply_move(&ctx, &mut state.rooms, node, PlacementPatch::new(shape, root));
                let delta = state.energy.total() - before;
                let accept = delta < 0.0 || rng.gen::<f64>() < (-delta / temperature).exp();
                if !accept {
                    state.energy.revert(&mut state.rooms, undo);
                    continue;
                }

                best.observe(&state);
                if state.energy.is_solved() {
                    self.try_accept(&state, base.chain_index, chain, accepted);
                    if accepted.len() >= max_layouts {
                        trace!("Chain {} filled at step {}", base.chain_index, step);
                        return Ok(());
                    }
                }
            }
            temperature *= settings.cooling;
        }
        Ok(())
    }

    /// Chain nodes in BFS order from the ones already anchored
    ///
    /// Seeds are nodes with a placed neighbor or a pin; with neither, the
    /// chain's first node. Nodes the BFS cannot reach follow in chain order.
    fn greedy_order(&self, state: &LayoutState, chain: &Chain) -> Vec<usize> {
        let graph = self.ctx.graph;
        let in_chain = |n: usize| chain.nodes.contains(&n);
        let mut seeds: Vec<usize> = chain
            .nodes
            .iter()
            .copied()
            .filter(|&n| {
                graph.node(n).pinned.is_some()
                    || graph.neighbors(n).iter().any(|&(m, _)| state.rooms[m].is_some())
            })
            .collect();
        if seeds.is_empty() {
            seeds.push(chain.nodes[0]);
        }

        let mut order = Vec::with_capacity(chain.nodes.len());
        let mut queue: VecDeque<usize> = seeds.into_iter().collect();
        while let Some(node) = queue.pop_front() {
            if order.contains(&node) {
                continue;
            }
            order.push(node);
            for &(next, _) in graph.neighbors(node) {
                if in_chain(next) && !order.contains(&next) {
                    queue.push_back(next);
                }
            }
        }
        for &node in &chain.nodes {
            if !order.contains(&node) {
                order.push(node);
            }
        }
        order
    }

    /// Resolved shapes for a node's templates, shuffled
    fn shapes_for<R: Rng + ?Sized>(&self, node: usize, rng: &mut R) -> Vec<Arc<ModuleShape>> {
        let mut shapes: Vec<Arc<ModuleShape>> = self
            .ctx
            .graph
            .node(node)
            .templates
            .iter()
            .filter_map(|&t| self.ctx.shapes.shape(t))
            .collect();
        shapes.shuffle(rng);
        shapes
    }

    /// Snapshot `state` when it is solved, valid and different enough from
    /// everything accepted so far
    fn try_accept(&self, state: &LayoutState, chain_index: usize, chain: &Chain, accepted: &mut Vec<LayoutState>) {
        if !state.energy.is_solved() {
            return;
        }
        if let Err(issue) = try_validate_layout(&self.ctx, &state.rooms) {
            warn!(
                "Energy reports chain {} solved but validation disagrees: {}",
                chain_index,
                issue.describe(self.ctx.graph)
            );
            return;
        }
        let min_difference = self.ctx.settings.min_layout_difference;
        if accepted
            .iter()
            .any(|prev| !differs_enough(prev, state, &chain.nodes, min_difference))
        {
            return;
        }
        let mut snapshot = state.clone();
        snapshot.chain_index = chain_index + 1;
        accepted.push(snapshot);
    }
}

/// A template change on any chain node, or enough summed movement
fn differs_enough(a: &LayoutState, b: &LayoutState, nodes: &[usize], min_difference: i32) -> bool {
    let mut moved = 0;
    for &node in nodes {
        match (&a.rooms[node], &b.rooms[node]) {
            (Some(pa), Some(pb)) => {
                if pa.template != pb.template {
                    return true;
                }
                moved += manhattan(pa.root, pb.root);
            }
            (None, None) => {}
            _ => return true,
        }
    }
    moved >= min_difference
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{IntVec2, NodeId};
    use crate::graph::LevelGraph;
    use crate::layout::test_support::{Fixture, ROOM};
    use crate::layout::validation::try_validate_global;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn chain(nodes: Vec<usize>, edges: Vec<usize>, is_cycle: bool) -> Chain {
        Chain { nodes, edges, is_cycle }
    }

    fn chain_roots(state: &LayoutState, chain: &Chain) -> Vec<Option<IntVec2>> {
        chain.nodes.iter().map(|&n| state.rooms[n].as_ref().map(|r| r.root)).collect()
    }

    #[test]
    fn test_solver_rejects_out_of_range_probability() {
        let mut fx = Fixture::pair_of_rooms();
        fx.settings.wiggle_probability = 1.5;
        assert!(matches!(
            ChainSolver::new(fx.ctx()),
            Err(crate::core::error::LayoutError::InvalidSettings(_))
        ));
    }

    #[test]
    fn test_small_chain_enumerates_distinct_layouts() {
        let fx = Fixture::pair_of_rooms();
        let mut solver = ChainSolver::new(fx.ctx()).unwrap();
        let base = LayoutState::new(2);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let outcome = solver.add_chain(&base, &chain(vec![0, 1], vec![0], false), 4, &mut rng);
        assert!(outcome.failure.is_none());
        assert_eq!(outcome.layouts.len(), 4);
        for (i, layout) in outcome.layouts.iter().enumerate() {
            assert_eq!(layout.chain_index, 1);
            assert!(layout.energy.is_solved());
            assert_eq!(try_validate_global(&fx.ctx(), &layout.rooms), Ok(()));
            for other in &outcome.layouts[..i] {
                assert!(differs_enough(other, layout, &[0, 1], 2));
            }
        }
    }

    #[test]
    fn test_cycle_is_closed_by_annealing() {
        let mut level = LevelGraph::new();
        for i in 0..4 {
            level.add_node(NodeId(i), Some("small"));
        }
        for i in 0..4 {
            level.add_edge(NodeId(i), NodeId((i + 1) % 4), None);
        }
        let fx = Fixture::from_level(&level);
        let mut solver = ChainSolver::new(fx.ctx()).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        let outcome = solver.add_chain(
            &LayoutState::new(4),
            &chain(vec![0, 1, 2, 3], vec![0, 1, 2, 3], true),
            2,
            &mut rng,
        );
        assert!(!outcome.layouts.is_empty(), "{:?}", outcome.failure);
        for layout in &outcome.layouts {
            assert!(layout.rooms.iter().flatten().all(|r| r.template == ROOM));
            assert_eq!(try_validate_global(&fx.ctx(), &layout.rooms), Ok(()));
        }
    }

    #[test]
    fn test_corridor_path_is_placed() {
        let fx = Fixture::rooms_with_corridor();
        let mut solver = ChainSolver::new(fx.ctx()).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let outcome = solver.add_chain(&LayoutState::new(3), &chain(vec![0, 2, 1], vec![0, 1], false), 1, &mut rng);
        assert_eq!(outcome.layouts.len(), 1, "{:?}", outcome.failure);
        assert_eq!(try_validate_global(&fx.ctx(), &outcome.layouts[0].rooms), Ok(()));
    }

    #[test]
    fn test_failure_reports_best_energy() {
        let mut level = LevelGraph::new();
        level
            .add_pinned_node(NodeId(0), None, IntVec2::ZERO)
            .add_pinned_node(NodeId(1), None, IntVec2::new(50, 50));
        level.add_edge(NodeId(0), NodeId(1), None);
        let fx = Fixture::from_level(&level);
        let mut solver = ChainSolver::new(fx.ctx()).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let outcome = solver.add_chain(&LayoutState::new(2), &chain(vec![0, 1], vec![0], false), 4, &mut rng);
        assert!(outcome.layouts.is_empty());
        let failure = outcome.failure.unwrap();
        assert!(failure.contains("unsatisfied edges: room 0-room 1"), "{}", failure);
    }

    #[test]
    fn test_same_seed_same_layouts() {
        let fx = Fixture::cycle_of_four();
        let c = chain(vec![0, 1, 2, 3], vec![0, 1, 2, 3], true);
        let run = |seed: u64| {
            let mut solver = ChainSolver::new(fx.ctx()).unwrap();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            solver
                .add_chain(&LayoutState::new(4), &c, 3, &mut rng)
                .layouts
                .iter()
                .map(|s| chain_roots(s, &c))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(9), run(9));
    }
}
