// Licensed under the Apache License, Version 2.0 (the "License"); you may
// not use this file except in compliance with the License. You may obtain
// a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied. See the
// License for the specific language governing permissions and limitations
// under the License.

use std::hash::Hash;

use hashbrown::HashMap;
use log::{debug, trace, warn};
use num_traits::Num;
use petgraph::visit::{IntoEdgeReferences, IntoEdgesDirected, IntoNodeIdentifiers, NodeIndexable};

use super::residual::{edge_capacities, find_augmenting_path, node_set, ResArcType};
use crate::err::FlowError;

/// The return type for `ford_fulkerson()` and `capacity_scaling()`.
///
/// * `value` - the total flow leaving the source
/// * `flow_edges` - the flow on every edge `(u, v)` of the input graph,
///     including edges that carry no flow. Parallel edges share one entry.
/// * `augmentations` - the number of augmenting paths that were used
#[derive(Debug, Clone)]
pub struct MaxFlowReturn<N, T> {
    pub value: T,
    pub flow_edges: HashMap<(N, N), T>,
    pub augmentations: usize,
}

impl<N: Eq + Hash, T: Copy + Num> MaxFlowReturn<N, T> {
    /// Flow on the edge `u -> v`, zero if there is no such edge.
    pub fn flow_on(&self, u: N, v: N) -> T {
        self.flow_edges.get(&(u, v)).copied().unwrap_or_else(T::zero)
    }
}

/// Augmenting-path state shared by the maximum-flow engines: the input
/// capacities and the current flow, both keyed by `(u, v)`.
pub(crate) struct FlowState<N, T> {
    pub(crate) caps: HashMap<(N, N), T>,
    pub(crate) flow: HashMap<(N, N), T>,
    pub(crate) augmentations: usize,
}

impl<N, T> FlowState<N, T>
where
    N: Copy + Eq + Hash,
    T: Copy + Num + PartialOrd,
{
    pub(crate) fn new(caps: HashMap<(N, N), T>) -> Self {
        let flow = caps.keys().map(|&edge| (edge, T::zero())).collect();
        FlowState {
            caps,
            flow,
            augmentations: 0,
        }
    }

    /// Residual capacity of one step of a path.
    pub(crate) fn residual_capacity(&self, arc: &ResArcType<N>) -> T {
        match *arc {
            ResArcType::Forward(u, v) => match self.caps.get(&(u, v)) {
                Some(&cap) => cap - self.flow[&(u, v)],
                None => T::zero(),
            },
            ResArcType::Backward(u, v) => self.flow.get(&(v, u)).copied().unwrap_or_else(T::zero),
        }
    }

    /// Push the bottleneck of `path` along it. Returns the amount pushed;
    /// nothing is changed if the bottleneck is not positive.
    pub(crate) fn augment(&mut self, path: &[ResArcType<N>]) -> T {
        let bottleneck = match path
            .iter()
            .map(|arc| self.residual_capacity(arc))
            .reduce(|acc, cap| if cap < acc { cap } else { acc })
        {
            Some(bottleneck) if bottleneck > T::zero() => bottleneck,
            _ => return T::zero(),
        };

        for arc in path {
            let entry = self.flow.entry(arc.edge()).or_insert_with(T::zero);
            *entry = match arc {
                ResArcType::Forward(..) => *entry + bottleneck,
                ResArcType::Backward(..) => *entry - bottleneck,
            };
        }

        self.augmentations += 1;
        trace!("augmentation {}: {} steps", self.augmentations, path.len());
        bottleneck
    }

    /// Total flow on the edges leaving `source`.
    pub(crate) fn outflow(&self, source: N) -> T {
        self.flow
            .iter()
            .filter(|((u, _), _)| *u == source)
            .fold(T::zero(), |acc, (_, &f)| acc + f)
    }

    pub(crate) fn into_return(self, source: N) -> MaxFlowReturn<N, T> {
        MaxFlowReturn {
            value: self.outflow(source),
            augmentations: self.augmentations,
            flow_edges: self.flow,
        }
    }
}

/// Check that both terminals are nodes of `graph`.
///
/// A missing node has no index in every graph type (`GraphMap` panics on
/// lookup), so the error carries none.
pub(crate) fn check_terminals<G, E>(
    graph: G,
    source: G::NodeId,
    sink: G::NodeId,
) -> Result<(), FlowError<E>>
where
    G: IntoNodeIdentifiers,
    G::NodeId: Eq + Hash,
{
    let nodes = node_set(graph);
    if nodes.contains(&source) && nodes.contains(&sink) {
        Ok(())
    } else {
        Err(FlowError::NodeNotFound)
    }
}

/// Compute a maximum flow from `source` to `sink` with augmenting paths.
///
/// Each round searches the residual network for a path with the fewest
/// edges, so augmentations follow the Edmonds-Karp order and their number
/// is bounded by O(V·E). A forward step `u -> v` has residual capacity
/// `capacity(u, v) - flow(u, v)`; a backward step `v -> u` may cancel up to
/// `flow(u, v)`. The bottleneck of the path is pushed and the search repeats
/// until the sink is unreachable.
///
/// Parallel edges are merged into a single edge with the summed capacity and
/// self-loops are ignored.
///
/// Arguments:
///
/// * `graph` - the input graph
/// * `source` - the node flow leaves from
/// * `sink` - the node flow arrives at
/// * `cap_fn` - a callback receiving an edge reference and returning its
///     capacity
///
/// # Example
/// ```rust
/// use std::convert::Infallible;
/// use flownet_core::flow::ford_fulkerson;
/// use flownet_core::petgraph::graph::DiGraph;
/// use flownet_core::petgraph::visit::EdgeRef;
///
/// let mut graph = DiGraph::<(), u32>::new();
/// let s = graph.add_node(());
/// let a = graph.add_node(());
/// let b = graph.add_node(());
/// let t = graph.add_node(());
/// graph.extend_with_edges([(s, a, 3), (s, b, 2), (a, b, 1), (a, t, 2), (b, t, 3)]);
///
/// let res = ford_fulkerson(&graph, s, t, |e| Ok::<u32, Infallible>(*e.weight())).unwrap();
/// assert_eq!(res.value, 5);
/// assert_eq!(res.flow_on(a, b), 1);
/// ```
pub fn ford_fulkerson<G, F, T, E>(
    graph: G,
    source: G::NodeId,
    sink: G::NodeId,
    cap_fn: F,
) -> Result<MaxFlowReturn<G::NodeId, T>, FlowError<E>>
where
    G: IntoEdgeReferences + IntoEdgesDirected + IntoNodeIdentifiers + NodeIndexable,
    G::NodeId: Eq + Hash,
    F: FnMut(G::EdgeRef) -> Result<T, E>,
    T: Copy + Num + PartialOrd,
{
    check_terminals(graph, source, sink)?;
    let caps = edge_capacities(graph, cap_fn).map_err(FlowError::Callback)?;
    let mut state = FlowState::new(caps);

    while let Some(path) = find_augmenting_path(graph, source, sink, |arc| {
        state.residual_capacity(arc) > T::zero()
    }) {
        if state.augment(&path) <= T::zero() {
            warn!("augmenting path with non-positive bottleneck; stopping");
            break;
        }
    }

    debug!("max flow found after {} augmentations", state.augmentations);
    Ok(state.into_return(source))
}
