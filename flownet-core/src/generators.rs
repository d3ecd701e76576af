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

//! Random flow instances for tests and benchmarks.
//!
//! Every generator takes the random number generator as an argument so runs
//! can be reproduced; [`rng_from_seed`] builds the one used throughout the
//! crate's own tests.

use indexmap::IndexMap;
use log::debug;
use petgraph::algo::{connected_components, has_path_connecting};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{IntoNeighbors, IntoNodeIdentifiers, Visitable};
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use crate::flow::Commodity;

/// A `Pcg64` generator seeded with `seed`, or from system entropy if `seed`
/// is `None`.
pub fn rng_from_seed(seed: Option<u64>) -> Pcg64 {
    match seed {
        Some(seed) => Pcg64::seed_from_u64(seed),
        None => Pcg64::from_entropy(),
    }
}

/// Parameters of [`random_graph`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomGraphConfig {
    pub num_nodes: usize,
    /// Probability that an ordered node pair gets an edge.
    pub edge_prob: f64,
    pub cap_min: u64,
    pub cap_max: u64,
}

impl Default for RandomGraphConfig {
    fn default() -> Self {
        RandomGraphConfig {
            num_nodes: 10,
            edge_prob: 0.3,
            cap_min: 5,
            cap_max: 20,
        }
    }
}

/// Parameters of [`random_commodities`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommodityConfig {
    pub num_commodities: usize,
    pub demand_min: u64,
    pub demand_max: u64,
}

impl Default for CommodityConfig {
    fn default() -> Self {
        CommodityConfig {
            num_commodities: 3,
            demand_min: 5,
            demand_max: 20,
        }
    }
}

/// Parameters of [`layered_heavy_tail`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayeredGraphConfig {
    pub n_layers: usize,
    pub width: usize,
    pub small_low: u64,
    pub small_high: u64,
    pub big_low: u64,
    pub big_high: u64,
    /// Probability that an edge draws its capacity from the big range.
    pub big_ratio: f64,
}

impl Default for LayeredGraphConfig {
    fn default() -> Self {
        LayeredGraphConfig {
            n_layers: 4,
            width: 10,
            small_low: 1,
            small_high: 20,
            big_low: 500,
            big_high: 2000,
            big_ratio: 0.1,
        }
    }
}

#[inline]
fn uniform<R: Rng + ?Sized>(rng: &mut R, low: u64, high: u64) -> u64 {
    rng.gen_range(low.min(high)..=low.max(high))
}

/// Generate a random directed graph with integer capacities as edge weights.
///
/// Every ordered pair of distinct nodes gets an edge with probability
/// `edge_prob` and a capacity drawn uniformly from `[cap_min, cap_max]`.
///
/// Returns `None` if the draw produced no edge at all or if the graph is not
/// weakly connected.
///
/// # Example
/// ```rust
/// use flownet_core::generators::{random_graph, rng_from_seed, RandomGraphConfig};
///
/// let config = RandomGraphConfig {
///     edge_prob: 1.0,
///     ..RandomGraphConfig::default()
/// };
/// let graph = random_graph(&mut rng_from_seed(Some(4)), &config).unwrap();
/// assert_eq!(graph.node_count(), 10);
/// assert_eq!(graph.edge_count(), 90);
/// ```
pub fn random_graph<R: Rng + ?Sized>(
    rng: &mut R,
    config: &RandomGraphConfig,
) -> Option<DiGraph<(), u64>> {
    let mut graph = DiGraph::with_capacity(config.num_nodes, 0);
    let nodes: Vec<NodeIndex> = (0..config.num_nodes).map(|_| graph.add_node(())).collect();

    for &u in &nodes {
        for &v in &nodes {
            if u == v {
                continue;
            }
            if rng.gen::<f64>() < config.edge_prob {
                graph.add_edge(u, v, uniform(rng, config.cap_min, config.cap_max));
            }
        }
    }

    if graph.edge_count() == 0 {
        debug!("random graph draw produced no edges");
        return None;
    }
    if connected_components(&graph) != 1 {
        debug!("random graph draw is not weakly connected");
        return None;
    }
    Some(graph)
}

/// Draw up to `num_commodities` random commodities on `graph`.
///
/// Each attempt samples two distinct nodes `s` and `t` and keeps the pair if
/// `t` is reachable from `s`, with a demand drawn uniformly from
/// `[demand_min, demand_max]`. Commodities are keyed `K1`, `K2`, ... in the
/// order they were found. At most `20 * num_commodities` attempts are made.
///
/// Returns `None` if no commodity was found.
pub fn random_commodities<G, R>(
    rng: &mut R,
    graph: G,
    config: &CommodityConfig,
) -> Option<IndexMap<String, Commodity<G::NodeId, u64>>>
where
    G: IntoNodeIdentifiers + IntoNeighbors + Visitable,
    R: Rng + ?Sized,
{
    let nodes: Vec<G::NodeId> = graph.node_identifiers().collect();
    if nodes.len() < 2 {
        return None;
    }

    let mut commodities = IndexMap::with_capacity(config.num_commodities);
    let mut attempts = 0;
    while commodities.len() < config.num_commodities && attempts < config.num_commodities * 20 {
        attempts += 1;
        let pair = sample(rng, nodes.len(), 2);
        let (s, t) = (nodes[pair.index(0)], nodes[pair.index(1)]);
        if !has_path_connecting(graph, s, t, None) {
            continue;
        }
        let demand = uniform(rng, config.demand_min, config.demand_max);
        commodities.insert(
            format!("K{}", commodities.len() + 1),
            Commodity::new(s, t, demand),
        );
    }
    debug!(
        "found {} of {} commodities in {attempts} attempts",
        commodities.len(),
        config.num_commodities
    );

    if commodities.is_empty() {
        None
    } else {
        Some(commodities)
    }
}

fn heavy_tail_capacity<R: Rng + ?Sized>(rng: &mut R, config: &LayeredGraphConfig) -> u64 {
    if rng.gen::<f64>() < config.big_ratio {
        uniform(rng, config.big_low, config.big_high)
    } else {
        uniform(rng, config.small_low, config.small_high)
    }
}

/// Generate a layered single-source single-sink graph with heavy-tailed
/// capacities.
///
/// The source feeds every node of the first layer, consecutive layers are
/// joined completely, and every node of the last layer feeds the sink. Each
/// capacity comes from `[big_low, big_high]` with probability `big_ratio`
/// and from `[small_low, small_high]` otherwise, so a few edges dwarf the
/// rest. This is the input on which capacity scaling pays off.
///
/// Returns the graph with its source and sink. With no layers the source and
/// sink are not connected.
pub fn layered_heavy_tail<R: Rng + ?Sized>(
    rng: &mut R,
    config: &LayeredGraphConfig,
) -> (DiGraph<(), u64>, NodeIndex, NodeIndex) {
    let width = if config.n_layers == 0 { 0 } else { config.width };
    let mut graph = DiGraph::with_capacity(
        config.n_layers * width + 2,
        config.n_layers.saturating_sub(1) * width * width + 2 * width,
    );
    let source = graph.add_node(());
    let layers: Vec<Vec<NodeIndex>> = (0..config.n_layers)
        .map(|_| (0..width).map(|_| graph.add_node(())).collect())
        .collect();
    let sink = graph.add_node(());

    if let (Some(first), Some(last)) = (layers.first(), layers.last()) {
        for &v in first {
            graph.add_edge(source, v, heavy_tail_capacity(rng, config));
        }
        for pair in layers.windows(2) {
            for &u in &pair[0] {
                for &v in &pair[1] {
                    graph.add_edge(u, v, heavy_tail_capacity(rng, config));
                }
            }
        }
        for &u in last {
            graph.add_edge(u, sink, heavy_tail_capacity(rng, config));
        }
    }

    (graph, source, sink)
}
