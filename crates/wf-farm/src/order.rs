//! Per-state turbine ordering.
//!
//! A turbine can only be evaluated once every turbine whose wake reaches it
//! is finished. Wake influence only ever points strictly downwind, so the
//! dependency structure is a DAG and sorting by downwind coordinate is a
//! valid topological order. Turbines with equal downwind coordinate do not
//! interact.

use petgraph::algo::{is_cyclic_directed, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use wf_core::{Tolerances, TurbineId, nearly_equal};

use crate::error::{FarmError, FarmResult};
use crate::frame::WakeFrame;
use crate::layout::FarmLayout;

/// Downwind distances within this of zero count as the same downwind
/// coordinate.
pub const DOWNWIND_TOLERANCE: Tolerances = Tolerances {
    abs: 1e-9,
    rel: 0.0,
};

/// Lateral reach of a wake: an emitter influences a receiver when the
/// receiver is strictly downwind and, if a spread is set,
/// `|y| <= (D_emitter + D_receiver) / 2 + spread * x`.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct WakeReach {
    pub spread: Option<f64>,
}

impl WakeReach {
    pub const UNBOUNDED: WakeReach = WakeReach { spread: None };

    pub fn cone(spread: f64) -> Self {
        Self {
            spread: Some(spread),
        }
    }

    /// True if a point at downwind `x`, cross-wind `y` can be reached by a
    /// wake from a rotor of diameter `d_emitter` onto a rotor of `d_receiver`.
    pub fn reaches(&self, x: f64, y: f64, d_emitter: f64, d_receiver: f64) -> bool {
        if x <= 0.0 || nearly_equal(x, 0.0, DOWNWIND_TOLERANCE) {
            return false;
        }
        match self.spread {
            None => true,
            Some(s) => y.abs() <= 0.5 * (d_emitter + d_receiver) + s * x,
        }
    }
}

/// How turbines are ordered within each atmospheric state.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum TurbineOrdering {
    /// Sort by downwind coordinate for each state's wind direction.
    #[default]
    Downwind,
    /// Use the same caller-supplied order for every state. Checked against
    /// the wake dependency graph of every state.
    Fixed(Vec<TurbineId>),
}

/// A resolved evaluation order for one wind direction.
#[derive(Clone, Debug, PartialEq)]
pub struct DownwindOrder {
    ids: Vec<TurbineId>,
    /// Downwind coordinate per turbine, indexed by turbine index.
    coords: Vec<f64>,
}

impl DownwindOrder {
    pub fn ids(&self) -> &[TurbineId] {
        &self.ids
    }

    /// Downwind coordinate of `id`, or `None` for an id outside the layout.
    pub fn coordinate(&self, id: TurbineId) -> Option<f64> {
        self.coords.get(id.idx()).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl TurbineOrdering {
    /// Resolve the order for wind direction `wd_deg`, ignoring wake reach.
    pub fn resolve(&self, layout: &FarmLayout, wd_deg: f64) -> FarmResult<DownwindOrder> {
        self.resolve_with_reach(layout, wd_deg, WakeReach::UNBOUNDED)
    }

    /// Resolve the order, checking a fixed order only against wakes that
    /// are within `reach`.
    pub fn resolve_with_reach(
        &self,
        layout: &FarmLayout,
        wd_deg: f64,
        reach: WakeReach,
    ) -> FarmResult<DownwindOrder> {
        let frame = WakeFrame::from_direction(wd_deg);
        let coords: Vec<f64> = layout
            .turbines()
            .iter()
            .map(|t| frame.downwind_coordinate(&t.position))
            .collect();

        match self {
            TurbineOrdering::Downwind => {
                let mut ids: Vec<TurbineId> = layout.ids().collect();
                ids.sort_by(|a, b| {
                    coords[a.idx()]
                        .total_cmp(&coords[b.idx()])
                        .then_with(|| a.index().cmp(&b.index()))
                });
                Ok(DownwindOrder { ids, coords })
            }
            TurbineOrdering::Fixed(ids) => {
                check_permutation(ids, layout.len())?;
                let graph = WakeDependencyGraph::build(layout, wd_deg, reach);
                graph.check_order(ids)?;
                Ok(DownwindOrder {
                    ids: ids.clone(),
                    coords,
                })
            }
        }
    }
}

fn check_permutation(ids: &[TurbineId], n: usize) -> FarmResult<()> {
    if ids.len() != n {
        return Err(FarmError::OrderLength {
            len: ids.len(),
            expected: n,
        });
    }
    let mut seen = vec![false; n];
    for &id in ids {
        match seen.get_mut(id.idx()) {
            Some(slot) if !*slot => *slot = true,
            _ => return Err(FarmError::OrderNotPermutation { turbine: id }),
        }
    }
    Ok(())
}

/// Directed graph with an edge `emitter -> receiver` for every wake
/// interaction in one wind direction.
#[derive(Debug, Clone)]
pub struct WakeDependencyGraph {
    wd_deg: f64,
    graph: DiGraph<TurbineId, ()>,
}

impl WakeDependencyGraph {
    pub fn build(layout: &FarmLayout, wd_deg: f64, reach: WakeReach) -> Self {
        let frame = WakeFrame::from_direction(wd_deg);
        let mut graph = DiGraph::with_capacity(layout.len(), 0);
        let nodes: Vec<NodeIndex> = layout.ids().map(|id| graph.add_node(id)).collect();

        for e in layout.turbines() {
            for r in layout.turbines() {
                if e.id == r.id {
                    continue;
                }
                let off = frame.offset(e, &r.hub());
                if reach.reaches(off.x, off.y, e.diameter(), r.diameter()) {
                    graph.add_edge(nodes[e.id.idx()], nodes[r.id.idx()], ());
                }
            }
        }
        Self { wd_deg, graph }
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_acyclic(&self) -> bool {
        !is_cyclic_directed(&self.graph)
    }

    /// Emitters whose wakes reach `receiver`, sorted by turbine index.
    pub fn upstream_of(&self, receiver: TurbineId) -> Vec<TurbineId> {
        let mut ups: Vec<TurbineId> = self
            .graph
            .neighbors_directed(NodeIndex::new(receiver.idx()), petgraph::Direction::Incoming)
            .map(|n| self.graph[n])
            .collect();
        ups.sort_by_key(|id| id.index());
        ups
    }

    /// A topological order of the graph.
    pub fn topological_order(&self) -> FarmResult<Vec<TurbineId>> {
        toposort(&self.graph, None)
            .map(|nodes| nodes.into_iter().map(|n| self.graph[n]).collect())
            .map_err(|_| FarmError::DependencyCycle { wd_deg: self.wd_deg })
    }

    /// Check that every emitter precedes all of its receivers in `order`.
    pub fn check_order(&self, order: &[TurbineId]) -> FarmResult<()> {
        if !self.is_acyclic() {
            return Err(FarmError::DependencyCycle { wd_deg: self.wd_deg });
        }
        let mut position = vec![usize::MAX; self.graph.node_count()];
        for (pos, id) in order.iter().enumerate() {
            if let Some(slot) = position.get_mut(id.idx()) {
                *slot = pos;
            }
        }
        for edge in self.graph.raw_edges() {
            let upstream = self.graph[edge.source()];
            let downstream = self.graph[edge.target()];
            if position[upstream.idx()] >= position[downstream.idx()] {
                return Err(FarmError::OrderViolation {
                    wd_deg: self.wd_deg,
                    upstream,
                    downstream,
                });
            }
        }
        Ok(())
    }
}
