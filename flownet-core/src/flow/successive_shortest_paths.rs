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
use std::ops::{Mul, Sub};

use hashbrown::HashMap;
use log::{debug, warn};
use num_traits::Zero;
use petgraph::visit::{IntoEdgeReferences, IntoNodeIdentifiers, NodeIndexable};

use super::bellman_ford::{bellman_ford, ShortestPathTree};
use super::ford_fulkerson::check_terminals;
use super::residual::ResidualGraph;
use crate::err::FlowError;

/// The return type for `min_cost_max_flow()`.
///
/// * `value` - the total flow sent from source to sink
/// * `cost` - the total cost of that flow
/// * `flow_edges` - flow per input edge keyed by `(source, target)`. Only
///     edges that carry flow are present; parallel edges are summed.
#[derive(Debug, Clone)]
pub struct MCFReturn<N, T> {
    pub value: T,
    pub cost: T,
    pub flow_edges: HashMap<(N, N), T>,
}

/// Minimum-cost maximum flow by successive shortest paths.
///
/// Each iteration asks `shortest_path` for a cheapest source-to-sink path in
/// the current residual graph, pushes the bottleneck capacity along it and
/// adds `bottleneck * dist[sink]` to the total cost. The loop ends when the
/// oracle reports that no path is left. The residual graph is mutated in
/// place, so the per-edge flow can be read back afterwards with
/// [`ResidualGraph::flow`].
///
/// Provided the initial graph has no negative cycle, the result is a flow of
/// maximum value whose cost is minimal among flows of that value. A negative
/// cycle reported by the oracle aborts the run with
/// [`FlowError::NegativeCycle`].
///
/// `shortest_path` has the shape of [`bellman_ford`], which is what
/// [`min_cost_flow`] plugs in; any other search with the same contract
/// (e.g. a potential-reweighted Dijkstra) gives the same flow and cost.
///
/// Returns `(total_flow, total_cost)`.
pub fn successive_shortest_paths<T, S>(
    graph: &mut ResidualGraph<T>,
    source: usize,
    sink: usize,
    mut shortest_path: S,
) -> Result<(T, T), FlowError>
where
    T: Copy + Zero + PartialOrd + Sub<Output = T> + Mul<Output = T>,
    S: FnMut(&ResidualGraph<T>, usize, usize) -> Result<Option<ShortestPathTree<T>>, FlowError>,
{
    let mut total_flow = T::zero();
    let mut total_cost = T::zero();
    let mut augmentations = 0usize;

    while let Some(tree) = shortest_path(graph, source, sink)? {
        let (Some(path), Some(distance)) = (tree.path_edges(source, sink), tree.distance(sink))
        else {
            warn!("shortest-path tree does not reach the sink; stopping");
            break;
        };

        let mut caps = path.iter().map(|&(u, index)| graph.edge(u, index).cap);
        let Some(first) = caps.next() else {
            // source == sink: nothing to route
            break;
        };
        let bottleneck = caps.fold(first, |acc, cap| if cap < acc { cap } else { acc });

        if bottleneck <= T::zero() {
            warn!("augmenting path with non-positive bottleneck; stopping");
            break;
        }

        for &(u, index) in &path {
            graph.push_flow(u, index, bottleneck);
        }

        total_flow = total_flow + bottleneck;
        total_cost = total_cost + bottleneck * distance;
        augmentations += 1;
        debug!("augmentation {augmentations}: {} edges on the path", path.len());
    }

    Ok((total_flow, total_cost))
}

/// [`successive_shortest_paths`] with the Bellman-Ford oracle.
///
/// # Example
/// ```rust
/// use flownet_core::flow::{min_cost_flow, ResidualGraph};
///
/// let mut graph = ResidualGraph::new(4);
/// graph.add_edge(0, 1, 3, 1);
/// graph.add_edge(1, 3, 3, 1);
/// graph.add_edge(0, 2, 2, 2);
/// graph.add_edge(2, 3, 2, 2);
///
/// assert_eq!(min_cost_flow(&mut graph, 0, 3), Ok((5, 14)));
/// ```
pub fn min_cost_flow<T>(
    graph: &mut ResidualGraph<T>,
    source: usize,
    sink: usize,
) -> Result<(T, T), FlowError>
where
    T: Copy + Zero + PartialOrd + Sub<Output = T> + Mul<Output = T>,
{
    successive_shortest_paths(graph, source, sink, bellman_ford)
}

/// Find a minimum-cost maximum flow from `source` to `sink` in a petgraph
/// graph.
///
/// The graph is copied into a [`ResidualGraph`] and solved with
/// [`min_cost_flow`].
///
/// Arguments:
///
/// * `graph` - the input graph
/// * `source` - the node flow leaves from
/// * `sink` - the node flow arrives at
/// * `cap_fn` - a callback returning the capacity of an edge
/// * `cost_fn` - a callback returning the per-unit cost of an edge
///
/// # Example
/// ```rust
/// use std::convert::Infallible;
/// use flownet_core::flow::min_cost_max_flow;
/// use flownet_core::petgraph::graph::DiGraph;
/// use flownet_core::petgraph::visit::EdgeRef;
///
/// let mut graph = DiGraph::<(), (i64, i64)>::new();
/// let s = graph.add_node(());
/// let a = graph.add_node(());
/// let t = graph.add_node(());
/// graph.add_edge(s, a, (4, 1));
/// graph.add_edge(a, t, (3, 2));
/// graph.add_edge(s, t, (1, 5));
///
/// let res = min_cost_max_flow(
///     &graph,
///     s,
///     t,
///     |e| Ok::<i64, Infallible>(e.weight().0),
///     |e| Ok(e.weight().1),
/// )
/// .unwrap();
/// assert_eq!(res.value, 4);
/// assert_eq!(res.cost, 3 * 3 + 5);
/// assert_eq!(res.flow_edges[&(s, a)], 3);
/// ```
pub fn min_cost_max_flow<G, F, C, T, E>(
    graph: G,
    source: G::NodeId,
    sink: G::NodeId,
    cap_fn: F,
    cost_fn: C,
) -> Result<MCFReturn<G::NodeId, T>, FlowError<E>>
where
    G: IntoEdgeReferences + IntoNodeIdentifiers + NodeIndexable,
    G::NodeId: Eq + Hash,
    F: FnMut(G::EdgeRef) -> Result<T, E>,
    C: FnMut(G::EdgeRef) -> Result<T, E>,
    T: Copy + Zero + PartialOrd + Sub<Output = T> + Mul<Output = T>,
{
    check_terminals(graph, source, sink)?;

    let mut residual =
        ResidualGraph::from_graph(graph, cap_fn, cost_fn).map_err(FlowError::Callback)?;
    let (value, cost) = min_cost_flow(
        &mut residual,
        graph.to_index(source),
        graph.to_index(sink),
    )
    .map_err(|err| err.widen())?;

    let mut flow_edges: HashMap<(G::NodeId, G::NodeId), T> = HashMap::new();
    for (u, v, flow) in residual.arc_flows() {
        if flow > T::zero() {
            let key = (graph.from_index(u), graph.from_index(v));
            let entry = flow_edges.entry(key).or_insert_with(T::zero);
            *entry = *entry + flow;
        }
    }

    Ok(MCFReturn {
        value,
        cost,
        flow_edges,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use petgraph::graph::DiGraph;
    use petgraph::visit::EdgeRef;
    use std::convert::Infallible;

    fn diamond<T: Copy + Zero + PartialOrd + Sub<Output = T>>(
        c: [(usize, usize, T, T); 4],
    ) -> ResidualGraph<T> {
        let mut graph = ResidualGraph::new(4);
        for (u, v, cap, cost) in c {
            graph.add_edge(u, v, cap, cost);
        }
        graph
    }

    #[test]
    fn test_diamond_flow_and_cost() {
        let mut graph = diamond([(0, 1, 3, 1), (1, 3, 3, 1), (0, 2, 2, 2), (2, 3, 2, 2)]);
        let (flow, cost) = min_cost_flow(&mut graph, 0, 3).unwrap();

        assert_eq!(flow, 5);
        // 3 units at 1 + 1 and 2 units at 2 + 2
        assert_eq!(cost, 3 * 2 + 2 * 4);
        assert_eq!(graph.flow(0, 0), 3);
        assert_eq!(graph.flow(0, 1), 2);
    }

    #[test]
    fn test_diamond_with_floats() {
        let mut graph = diamond([
            (0, 1, 3.0, 1.0),
            (1, 3, 3.0, 1.0),
            (0, 2, 2.0, 2.0),
            (2, 3, 2.0, 2.0),
        ]);
        let (flow, cost) = min_cost_flow(&mut graph, 0, 3).unwrap();

        assert_eq!(flow, 5.0);
        assert_eq!(cost, 14.0);
    }

    #[test]
    fn test_cheap_path_saturates_first() {
        // 0 -> 3 directly is expensive; the detour is cheap but narrow.
        let mut graph: ResidualGraph<i64> = ResidualGraph::new(4);
        let direct = graph.add_edge(0, 3, 10, 10);
        let a = graph.add_edge(0, 1, 4, 1);
        graph.add_edge(1, 2, 4, 1);
        graph.add_edge(2, 3, 4, 1);

        let (flow, cost) = min_cost_flow(&mut graph, 0, 3).unwrap();
        assert_eq!(flow, 14);
        assert_eq!(cost, 4 * 3 + 10 * 10);
        assert_eq!(graph.flow(0, a), 4);
        assert_eq!(graph.flow(0, direct), 10);
    }

    #[test]
    fn test_reroutes_through_reverse_edge() {
        // The first cheapest path 0-1-2-3 blocks both disjoint paths; the
        // second augmentation cancels flow on 1 -> 2.
        let mut graph: ResidualGraph<i64> = ResidualGraph::new(4);
        graph.add_edge(0, 1, 1, 1);
        graph.add_edge(0, 2, 1, 5);
        let middle = graph.add_edge(1, 2, 1, 1);
        graph.add_edge(1, 3, 1, 5);
        graph.add_edge(2, 3, 1, 1);

        let (flow, cost) = min_cost_flow(&mut graph, 0, 3).unwrap();
        assert_eq!(flow, 2);
        assert_eq!(cost, 12);
        assert_eq!(graph.flow(1, middle), 0);
    }

    #[test]
    fn test_negative_cost_edges() {
        let mut graph: ResidualGraph<i64> = ResidualGraph::new(3);
        graph.add_edge(0, 1, 10, -2);
        graph.add_edge(1, 2, 10, 1);

        assert_eq!(min_cost_flow(&mut graph, 0, 2), Ok((10, -10)));
    }

    #[test]
    fn test_zero_capacity_terminates() {
        let mut graph: ResidualGraph<i64> = ResidualGraph::new(2);
        graph.add_edge(0, 1, 0, 3);

        assert_eq!(min_cost_flow(&mut graph, 0, 1), Ok((0, 0)));
    }

    #[test]
    fn test_disconnected_sink() {
        let mut graph: ResidualGraph<i64> = ResidualGraph::new(3);
        graph.add_edge(0, 1, 5, 1);

        assert_eq!(min_cost_flow(&mut graph, 0, 2), Ok((0, 0)));
    }

    #[test]
    fn test_negative_cycle_aborts() {
        let mut graph: ResidualGraph<i64> = ResidualGraph::new(4);
        graph.add_edge(0, 1, 10, 5);
        graph.add_edge(1, 2, 5, 10);
        graph.add_edge(2, 1, 5, -11);
        graph.add_edge(2, 3, 10, 1);

        assert_eq!(min_cost_flow(&mut graph, 0, 3), Err(FlowError::NegativeCycle));
    }

    #[test]
    fn test_exhausted_graph_reports_no_path_again() {
        let mut graph = diamond([(0, 1, 3, 1), (1, 3, 3, 1), (0, 2, 2, 2), (2, 3, 2, 2)]);
        min_cost_flow(&mut graph, 0, 3).unwrap();

        assert_eq!(bellman_ford(&graph, 0, 3), Ok(None));
        assert_eq!(bellman_ford(&graph, 0, 3), Ok(None));
        assert_eq!(min_cost_flow(&mut graph, 0, 3), Ok((0, 0)));
    }

    #[test]
    fn test_custom_oracle_is_used() {
        let mut graph = diamond([(0, 1, 3, 1), (1, 3, 3, 1), (0, 2, 2, 2), (2, 3, 2, 2)]);
        let mut calls = 0;
        let res = successive_shortest_paths(&mut graph, 0, 3, |g, s, t| {
            calls += 1;
            bellman_ford(g, s, t)
        });

        assert_eq!(res, Ok((5, 14)));
        // two augmentations and the final "no path" query
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_min_cost_max_flow_on_digraph() {
        let mut graph = DiGraph::<(), (i64, i64)>::new();
        let s = graph.add_node(());
        let a = graph.add_node(());
        let b = graph.add_node(());
        let t = graph.add_node(());
        graph.add_edge(s, a, (3, 1));
        graph.add_edge(a, t, (3, 1));
        graph.add_edge(s, b, (2, 2));
        graph.add_edge(b, t, (2, 2));

        let res = min_cost_max_flow(
            &graph,
            s,
            t,
            |e| Ok::<i64, Infallible>(e.weight().0),
            |e| Ok(e.weight().1),
        )
        .unwrap();

        assert_eq!(res.value, 5);
        assert_eq!(res.cost, 14);
        assert_eq!(res.flow_edges[&(s, a)], 3);
        assert_eq!(res.flow_edges[&(b, t)], 2);
    }

    #[test]
    fn test_min_cost_max_flow_callback_error() {
        let mut graph = DiGraph::<(), i64>::new();
        let s = graph.add_node(());
        let t = graph.add_node(());
        graph.add_edge(s, t, -1);

        let res = min_cost_max_flow(
            &graph,
            s,
            t,
            |e| {
                if *e.weight() < 0 {
                    Err("negative capacity")
                } else {
                    Ok(*e.weight())
                }
            },
            |_| Ok(0),
        );
        assert_eq!(res.unwrap_err(), FlowError::Callback("negative capacity"));
    }

    #[test]
    fn test_min_cost_max_flow_missing_node() {
        let mut graph = DiGraph::<(), i64>::new();
        let s = graph.add_node(());
        let t = graph.add_node(());
        graph.add_edge(s, t, 1);

        let res = min_cost_max_flow(
            &graph,
            s,
            petgraph::graph::NodeIndex::new(7),
            |e| Ok::<i64, Infallible>(*e.weight()),
            |_| Ok(1),
        );
        assert_eq!(res.unwrap_err(), FlowError::NodeNotFound);
    }

    #[test]
    fn test_min_cost_max_flow_graph_map_missing_sink() {
        let graph = petgraph::graphmap::DiGraphMap::<u32, (i64, i64)>::from_edges([(0, 1, (5, 1))]);

        let res = min_cost_max_flow(
            &graph,
            0,
            9,
            |e| Ok::<i64, Infallible>(e.weight().0),
            |e| Ok(e.weight().1),
        );
        assert_eq!(res.unwrap_err(), FlowError::NodeNotFound);
    }
}
