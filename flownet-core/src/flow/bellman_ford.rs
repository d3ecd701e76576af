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

use std::ops::Sub;

use log::{error, trace};
use num_traits::Zero;

use super::residual::ResidualGraph;
use crate::err::FlowError;

/// Single-source shortest-path tree over the edges of a [`ResidualGraph`]
/// that still have capacity.
///
/// `dist[v]` is `None` when `v` is unreachable. For every reached node other
/// than the source, `prev_node[v]` and `prev_edge[v]` name the residual edge
/// `graph.edge(prev_node[v], prev_edge[v])` by which `v` was last reached.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortestPathTree<T> {
    pub dist: Vec<Option<T>>,
    pub prev_node: Vec<Option<usize>>,
    pub prev_edge: Vec<Option<usize>>,
}

impl<T: Copy> ShortestPathTree<T> {
    pub fn distance(&self, v: usize) -> Option<T> {
        self.dist[v]
    }

    /// The `(tail, edge_index)` pairs of the tree path from `source` to
    /// `sink`, in source-to-sink order.
    ///
    /// Returns `None` if `sink` was not reached or the predecessor links do
    /// not lead back to `source`.
    pub fn path_edges(&self, source: usize, sink: usize) -> Option<Vec<(usize, usize)>> {
        self.dist[sink]?;

        let mut path = Vec::new();
        let mut v = sink;
        while v != source {
            if path.len() >= self.dist.len() {
                return None;
            }
            let u = self.prev_node[v]?;
            path.push((u, self.prev_edge[v]?));
            v = u;
        }

        path.reverse();
        Some(path)
    }
}

/// Bellman-Ford shortest paths from `source` over residual edges with
/// positive capacity, weighted by cost.
///
/// Edges are relaxed for at most `n - 1` rounds, stopping early after a
/// round without updates. A final pass that can still relax an edge means a
/// negative cycle is reachable from `source`; that is reported as
/// [`FlowError::NegativeCycle`] and never confused with the absence of a
/// path, which is `Ok(None)`.
///
/// Arguments:
///
/// * `graph` - the residual graph to search
/// * `source` - the start node
/// * `sink` - the node a path must reach for a tree to be returned
///
/// # Example
/// ```rust
/// use flownet_core::flow::{bellman_ford, ResidualGraph};
///
/// let mut graph = ResidualGraph::new(3);
/// graph.add_edge(0, 1, 4, 2);
/// graph.add_edge(1, 2, 4, -1);
/// graph.add_edge(0, 2, 4, 3);
///
/// let tree = bellman_ford(&graph, 0, 2).unwrap().unwrap();
/// assert_eq!(tree.distance(2), Some(1));
/// assert_eq!(tree.path_edges(0, 2), Some(vec![(0, 0), (1, 1)]));
/// ```
pub fn bellman_ford<T>(
    graph: &ResidualGraph<T>,
    source: usize,
    sink: usize,
) -> Result<Option<ShortestPathTree<T>>, FlowError>
where
    T: Copy + Zero + PartialOrd + Sub<Output = T>,
{
    let n = graph.node_count();
    for node in [source, sink] {
        if node >= n {
            return Err(FlowError::IndexOutOfBounds(node));
        }
    }

    let mut dist: Vec<Option<T>> = vec![None; n];
    let mut prev_node: Vec<Option<usize>> = vec![None; n];
    let mut prev_edge: Vec<Option<usize>> = vec![None; n];
    dist[source] = Some(T::zero());

    let mut rounds = 0;
    for _ in 1..n {
        rounds += 1;
        let mut updated = false;

        for u in 0..n {
            let Some(du) = dist[u] else {
                continue;
            };
            for (index, edge) in graph.edges(u).iter().enumerate() {
                if edge.cap > T::zero() && improves(du + edge.cost, dist[edge.to]) {
                    dist[edge.to] = Some(du + edge.cost);
                    prev_node[edge.to] = Some(u);
                    prev_edge[edge.to] = Some(index);
                    updated = true;
                }
            }
        }

        if !updated {
            break;
        }
    }
    trace!("bellman-ford settled after {rounds} rounds on {n} nodes");

    for u in 0..n {
        let Some(du) = dist[u] else {
            continue;
        };
        for edge in graph.edges(u) {
            if edge.cap > T::zero() && improves(du + edge.cost, dist[edge.to]) {
                error!("negative cycle reachable from node {source} through edge {u} -> {}", edge.to);
                return Err(FlowError::NegativeCycle);
            }
        }
    }

    if dist[sink].is_none() {
        return Ok(None);
    }

    Ok(Some(ShortestPathTree {
        dist,
        prev_node,
        prev_edge,
    }))
}

#[inline]
fn improves<T: PartialOrd>(candidate: T, current: Option<T>) -> bool {
    match current {
        Some(current) => candidate < current,
        None => true,
    }
}
