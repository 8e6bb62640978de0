//! Layout generation entry point
//!
//! Resolves the level graph into layout nodes, checks the inputs up front,
//! splits the graph into chains and runs a depth-first backtracking search
//! over chain layouts with an explicit stack of states.

use rand::Rng;
use tracing::{debug, info};

use crate::core::config::GeneratorSettings;
use crate::core::error::{LayoutError, Result};
use crate::graph::{build_chains, chains_from_node_lists, Chain, LayoutGraph, LayoutNodeKey, LevelGraph};
use crate::layout::annealing::ChainSolver;
use crate::layout::energy::LayoutContext;
use crate::layout::placement::{LayoutResult, LayoutState};
use crate::layout::validation::try_validate_global;
use crate::shapes::{ConfigurationSpaceSource, ShapeSource, TemplateCatalog};

/// Everything one generation call reads
pub struct GenerationRequest<'a> {
    pub level: &'a LevelGraph,
    pub catalog: &'a TemplateCatalog,
    pub shapes: &'a dyn ShapeSource,
    pub spaces: &'a dyn ConfigurationSpaceSource,
    /// Precomputed chains as node lists; skips decomposition when given
    pub chains: Option<&'a [Vec<LayoutNodeKey>]>,
}

impl<'a> GenerationRequest<'a> {
    pub fn new(
        level: &'a LevelGraph,
        catalog: &'a TemplateCatalog,
        shapes: &'a dyn ShapeSource,
        spaces: &'a dyn ConfigurationSpaceSource,
    ) -> Self {
        Self {
            level,
            catalog,
            shapes,
            spaces,
            chains: None,
        }
    }

    pub fn with_chains(mut self, chains: &'a [Vec<LayoutNodeKey>]) -> Self {
        self.chains = Some(chains);
        self
    }
}

#[derive(Debug, Clone)]
pub struct LayoutGenerator {
    settings: GeneratorSettings,
}

impl LayoutGenerator {
    pub fn new(settings: GeneratorSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    /// Generate one layout
    ///
    /// Identical inputs and RNG state give an identical result. Input
    /// problems fail before any search; a search that runs out of states
    /// fails with the last recorded failure.
    pub fn try_generate<R: Rng + ?Sized>(&self, request: &GenerationRequest<'_>, rng: &mut R) -> Result<LayoutResult> {
        let graph = LayoutGraph::build(request.level, request.catalog)?;
        check_shapes(&graph, request.shapes)?;
        graph.check_connected()?;
        check_edges_satisfiable(&graph, request.spaces)?;

        let chains = match request.chains {
            Some(lists) => chains_from_node_lists(&graph, lists)?,
            None => build_chains(&graph, self.settings.max_tree_chain_length),
        };
        debug!(
            "Layout graph: {} nodes, {} edges, {} chains",
            graph.node_count(),
            graph.edge_count(),
            chains.len()
        );

        let ctx = LayoutContext {
            graph: &graph,
            shapes: request.shapes,
            spaces: request.spaces,
            settings: &self.settings,
        };
        let state = self.search(ctx, &chains, rng)?;

        let result = LayoutResult::from_state(&graph, &state);
        info!(
            "Generated layout: {} rooms, {} connectors",
            result.rooms.len(),
            result.connectors.len()
        );
        Ok(result)
    }

    /// Depth-first search over chain layouts
    fn search<R: Rng + ?Sized>(&self, ctx: LayoutContext<'_>, chains: &[Chain], rng: &mut R) -> Result<LayoutState> {
        let mut solver = ChainSolver::new(ctx)?;
        let mut stack = vec![LayoutState::new(ctx.graph.node_count())];
        let mut last_failure: Option<String> = None;
        let mut expansions = 0usize;

        while let Some(state) = stack.pop() {
            if state.chain_index >= chains.len() {
                match try_validate_global(&ctx, &state.rooms) {
                    Ok(()) => {
                        debug!("Search finished after {} chain expansions", expansions);
                        return Ok(state);
                    }
                    Err(issue) => {
                        let detail = format!("global validation failed: {}", issue.describe(ctx.graph));
                        debug!("{}", detail);
                        last_failure = Some(detail);
                        continue;
                    }
                }
            }

            if let Some(limit) = self.settings.max_chain_expansions {
                if expansions >= limit {
                    let detail = last_failure.unwrap_or_else(|| "no complete layout found".to_string());
                    return Err(LayoutError::SearchExhausted {
                        detail: format!("stopped after {} chain expansions; {}", limit, detail),
                    });
                }
            }
            expansions += 1;

            let chain = &chains[state.chain_index];
            let outcome = solver.add_chain(&state, chain, self.settings.max_layouts_per_chain, rng);
            if let Some(failure) = outcome.failure {
                last_failure = Some(failure);
            }
            // Reversed so the first layout found is explored first
            stack.extend(outcome.layouts.into_iter().rev());
        }

        Err(LayoutError::SearchExhausted {
            detail: last_failure.unwrap_or_else(|| "no chain produced a layout".to_string()),
        })
    }
}

/// Every template named by the graph must resolve to a shape
fn check_shapes(graph: &LayoutGraph, shapes: &dyn ShapeSource) -> Result<()> {
    for node in graph.nodes() {
        for &template in &node.templates {
            if shapes.shape(template).is_none() {
                return Err(LayoutError::MissingShape(template));
            }
        }
    }
    Ok(())
}

/// Fail when some edge has no template pair with a non-empty space
fn check_edges_satisfiable(graph: &LayoutGraph, spaces: &dyn ConfigurationSpaceSource) -> Result<()> {
    for edge in graph.edges() {
        let a = &graph.node(edge.a).templates;
        let b = &graph.node(edge.b).templates;
        let satisfiable = a.iter().any(|&ta| {
            b.iter()
                .any(|&tb| spaces.space(ta, tb).map_or(false, |space| !space.is_empty()))
        });
        if !satisfiable {
            return Err(LayoutError::UnsatisfiableEdge {
                from: graph.label(edge.a).to_string(),
                to: graph.label(edge.b).to_string(),
            });
        }
    }
    Ok(())
}
