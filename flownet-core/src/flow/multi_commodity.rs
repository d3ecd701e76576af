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
use indexmap::IndexMap;
use log::{debug, trace};
use num_traits::Num;
use petgraph::visit::{IntoEdgeReferences, IntoEdgesDirected, IntoNodeIdentifiers, NodeIndexable};

use super::residual::{edge_capacities, find_augmenting_path, node_set, ResArcType};
use crate::err::FlowError;

/// A demand to route `demand` units from `source` to `sink`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Commodity<N, T> {
    pub source: N,
    pub sink: N,
    pub demand: T,
}

impl<N, T> Commodity<N, T> {
    pub fn new(source: N, sink: N, demand: T) -> Self {
        Commodity {
            source,
            sink,
            demand,
        }
    }
}

/// The return type for `multi_commodity_flow()`.
///
/// * `flow` - for every commodity, its flow on every edge `(u, v)` of the
///     input graph
/// * `throughput` - the amount of each commodity's demand that was routed
/// * `rounds` - the number of round-robin passes over the commodities,
///     including the final pass that made no progress
///
/// Both maps keep the order of the commodity input.
#[derive(Debug, Clone)]
pub struct MultiCommodityReturn<K, N, T> {
    pub flow: IndexMap<K, HashMap<(N, N), T>>,
    pub throughput: IndexMap<K, T>,
    pub rounds: usize,
}

impl<K, N, T: Copy + Num> MultiCommodityReturn<K, N, T> {
    /// Sum of the throughput of all commodities.
    pub fn total_throughput(&self) -> T {
        self.throughput.values().fold(T::zero(), |acc, &tp| acc + tp)
    }
}

struct CommodityState<N, T> {
    caps: HashMap<(N, N), T>,
    // Capacity used by all commodities together, per edge.
    used: HashMap<(N, N), T>,
    flow: Vec<HashMap<(N, N), T>>,
}

impl<N, T> CommodityState<N, T>
where
    N: Copy + Eq + Hash,
    T: Copy + Num + PartialOrd,
{
    /// Residual capacity of a step for commodity `p`. Forward capacity is a
    /// pool shared by every commodity; only `p`'s own flow can be cancelled.
    fn residual_capacity(&self, p: usize, arc: &ResArcType<N>) -> T {
        match *arc {
            ResArcType::Forward(u, v) => match self.caps.get(&(u, v)) {
                Some(&cap) => cap - self.used[&(u, v)],
                None => T::zero(),
            },
            ResArcType::Backward(u, v) => {
                self.flow[p].get(&(v, u)).copied().unwrap_or_else(T::zero)
            }
        }
    }

    fn augment(&mut self, p: usize, path: &[ResArcType<N>], remaining: T) -> T {
        let bottleneck = path
            .iter()
            .map(|arc| self.residual_capacity(p, arc))
            .fold(remaining, |acc, cap| if cap < acc { cap } else { acc });
        if bottleneck <= T::zero() {
            return T::zero();
        }

        for arc in path {
            let edge = arc.edge();
            let (flow, used) = (&mut self.flow[p], &mut self.used);
            let (f, u) = (
                flow.entry(edge).or_insert_with(T::zero),
                used.entry(edge).or_insert_with(T::zero),
            );
            match arc {
                ResArcType::Forward(..) => {
                    *f = *f + bottleneck;
                    *u = *u + bottleneck;
                }
                ResArcType::Backward(..) => {
                    *f = *f - bottleneck;
                    *u = *u - bottleneck;
                }
            }
        }

        bottleneck
    }
}

/// Route several commodities through shared edge capacities with a greedy
/// round-robin augmenting-path heuristic.
///
/// The commodities are visited in the order of `commodities`. On its turn a
/// commodity that has not met its demand looks for a hop-shortest path from
/// its source to its sink in its own residual view: a forward step `u -> v`
/// may use whatever capacity of `(u, v)` no commodity has taken yet, and a
/// backward step may only cancel the commodity's own flow. The pushed amount
/// is the path bottleneck capped by the commodity's unmet demand. The
/// heuristic stops after a full pass in which no commodity made progress.
///
/// The result is always feasible, but it is not optimal: once a commodity
/// has claimed capacity no other commodity can take it back, so the total
/// throughput depends on the commodity order and can stay below what an
/// exact concurrent-flow solver achieves.
///
/// Commodities whose terminals are missing from the graph, coincide, or
/// whose demand is not positive get zero throughput.
///
/// Arguments:
///
/// * `graph` - the input graph
/// * `commodities` - the commodities in visiting order
/// * `cap_fn` - a callback receiving an edge reference and returning its
///     capacity
///
/// # Example
/// ```rust
/// use std::convert::Infallible;
/// use flownet_core::flow::{multi_commodity_flow, Commodity};
/// use flownet_core::petgraph::graph::DiGraph;
/// use flownet_core::petgraph::visit::EdgeRef;
/// use indexmap::IndexMap;
///
/// let mut graph = DiGraph::<(), u64>::new();
/// let a = graph.add_node(());
/// let b = graph.add_node(());
/// let c = graph.add_node(());
/// let d = graph.add_node(());
/// graph.extend_with_edges([(a, c, 10), (b, c, 10), (c, d, 10)]);
///
/// let mut commodities = IndexMap::new();
/// commodities.insert("K1", Commodity::new(a, d, 8));
/// commodities.insert("K2", Commodity::new(b, d, 8));
///
/// let res = multi_commodity_flow(&graph, &commodities, |e| Ok::<u64, Infallible>(*e.weight()))
///     .unwrap();
/// assert_eq!(res.throughput["K1"], 8);
/// assert_eq!(res.throughput["K2"], 2);
/// assert_eq!(res.total_throughput(), 10);
/// ```
pub fn multi_commodity_flow<G, K, F, T, E>(
    graph: G,
    commodities: &IndexMap<K, Commodity<G::NodeId, T>>,
    cap_fn: F,
) -> Result<MultiCommodityReturn<K, G::NodeId, T>, FlowError<E>>
where
    G: IntoEdgeReferences + IntoEdgesDirected + IntoNodeIdentifiers + NodeIndexable,
    G::NodeId: Eq + Hash,
    K: Clone + Eq + Hash,
    F: FnMut(G::EdgeRef) -> Result<T, E>,
    T: Copy + Num + PartialOrd,
{
    let caps = edge_capacities(graph, cap_fn).map_err(FlowError::Callback)?;
    let nodes = node_set(graph);
    let zero_flow: HashMap<(G::NodeId, G::NodeId), T> =
        caps.keys().map(|&edge| (edge, T::zero())).collect();

    let mut state = CommodityState {
        used: zero_flow.clone(),
        flow: vec![zero_flow; commodities.len()],
        caps,
    };
    let mut throughput: Vec<T> = vec![T::zero(); commodities.len()];

    let routable: Vec<bool> = commodities
        .values()
        .map(|c| c.source != c.sink && nodes.contains(&c.source) && nodes.contains(&c.sink))
        .collect();

    let mut rounds = 0;
    loop {
        rounds += 1;
        let mut moved = false;

        for (p, commodity) in commodities.values().enumerate() {
            if !routable[p] || throughput[p] >= commodity.demand {
                continue;
            }

            let path = find_augmenting_path(graph, commodity.source, commodity.sink, |arc| {
                state.residual_capacity(p, arc) > T::zero()
            });
            let Some(path) = path else {
                continue;
            };

            let sent = state.augment(p, &path, commodity.demand - throughput[p]);
            if sent > T::zero() {
                throughput[p] = throughput[p] + sent;
                moved = true;
                trace!("commodity {p}: augmented along {} steps", path.len());
            }
        }

        if !moved {
            break;
        }
    }
    debug!(
        "multi-commodity heuristic finished after {rounds} rounds for {} commodities",
        commodities.len()
    );

    let flow = commodities
        .keys()
        .cloned()
        .zip(state.flow)
        .collect::<IndexMap<_, _>>();
    let throughput = commodities
        .keys()
        .cloned()
        .zip(throughput)
        .collect::<IndexMap<_, _>>();

    Ok(MultiCommodityReturn {
        flow,
        throughput,
        rounds,
    })
}
