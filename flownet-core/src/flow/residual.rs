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

use std::collections::VecDeque;
use std::hash::Hash;
use std::ops::Sub;

use fixedbitset::FixedBitSet;
use hashbrown::{HashMap, HashSet};
use num_traits::Zero;
use petgraph::visit::{
    EdgeRef, IntoEdgeReferences, IntoEdgesDirected, IntoNodeIdentifiers, NodeIndexable,
};
use petgraph::Direction::{Incoming, Outgoing};

/// A directed edge of a [`ResidualGraph`].
///
/// The tail of the edge is implicit: it is the node whose adjacency list the
/// edge is stored in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResidualEdge<T> {
    /// Head of the edge.
    pub to: usize,
    /// Remaining capacity.
    pub cap: T,
    /// Cost per unit of flow. Reverse edges carry the negated cost.
    pub cost: T,
    /// Position of the paired edge in `to`'s adjacency list.
    pub rev: usize,
}

/// Adjacency-list residual graph with index-paired reverse edges.
///
/// Every call to [`add_edge`](ResidualGraph::add_edge) stores two records:
/// the forward edge and a reverse edge with zero capacity. Each record keeps
/// the position of its partner, so [`push_flow`](ResidualGraph::push_flow)
/// updates both sides in O(1).
#[derive(Debug, Clone)]
pub struct ResidualGraph<T> {
    adjacency: Vec<Vec<ResidualEdge<T>>>,
    // (tail, position) of every forward edge, in insertion order.
    arcs: Vec<(usize, usize)>,
}

impl<T> ResidualGraph<T>
where
    T: Copy + Zero + PartialOrd + Sub<Output = T>,
{
    /// Create an edgeless residual graph over nodes `0..n`.
    pub fn new(n: usize) -> Self {
        ResidualGraph {
            adjacency: vec![Vec::new(); n],
            arcs: Vec::new(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of forward edges added so far.
    pub fn edge_count(&self) -> usize {
        self.arcs.len()
    }

    /// The residual edges leaving `u`, forward and reverse alike.
    pub fn edges(&self, u: usize) -> &[ResidualEdge<T>] {
        &self.adjacency[u]
    }

    pub fn edge(&self, u: usize, index: usize) -> &ResidualEdge<T> {
        &self.adjacency[u][index]
    }

    /// Add the edge `u -> v` together with its reverse edge.
    ///
    /// Returns the position of the forward edge in `u`'s adjacency list.
    /// Capacities are expected to be non-negative.
    pub fn add_edge(&mut self, u: usize, v: usize, cap: T, cost: T) -> usize {
        let fwd_pos = self.adjacency[u].len();
        let rev_pos = if u == v {
            fwd_pos + 1
        } else {
            self.adjacency[v].len()
        };

        self.adjacency[u].push(ResidualEdge {
            to: v,
            cap,
            cost,
            rev: rev_pos,
        });
        self.adjacency[v].push(ResidualEdge {
            to: u,
            cap: T::zero(),
            cost: T::zero() - cost,
            rev: fwd_pos,
        });
        self.arcs.push((u, fwd_pos));

        fwd_pos
    }

    /// Push `amount` units along the `index`-th edge of `u` and return them
    /// as capacity on the paired reverse edge.
    pub fn push_flow(&mut self, u: usize, index: usize, amount: T) {
        let edge = &mut self.adjacency[u][index];
        debug_assert!(amount <= edge.cap, "pushed more flow than residual capacity");
        edge.cap = edge.cap - amount;

        let (to, rev) = (edge.to, edge.rev);
        let reverse = &mut self.adjacency[to][rev];
        reverse.cap = reverse.cap + amount;
    }

    /// Flow currently routed along the forward edge at `index` in `u`'s list.
    pub fn flow(&self, u: usize, index: usize) -> T {
        let edge = &self.adjacency[u][index];
        self.adjacency[edge.to][edge.rev].cap
    }

    /// `(tail, head, flow)` for every forward edge, in insertion order.
    pub fn arc_flows(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        self.arcs
            .iter()
            .map(move |&(u, index)| (u, self.adjacency[u][index].to, self.flow(u, index)))
    }

    /// Build a residual graph from any petgraph graph.
    ///
    /// Nodes are numbered by [`NodeIndexable::to_index`] and edges are added
    /// in [`IntoEdgeReferences`] order, so the `k`-th item of
    /// [`arc_flows`](ResidualGraph::arc_flows) belongs to the `k`-th edge
    /// reference of `graph`.
    pub fn from_graph<G, F, C, E>(graph: G, mut cap_fn: F, mut cost_fn: C) -> Result<Self, E>
    where
        G: IntoEdgeReferences + NodeIndexable,
        F: FnMut(G::EdgeRef) -> Result<T, E>,
        C: FnMut(G::EdgeRef) -> Result<T, E>,
    {
        let mut residual = ResidualGraph::new(graph.node_bound());

        for edge in graph.edge_references() {
            let u = graph.to_index(edge.source());
            let v = graph.to_index(edge.target());
            residual.add_edge(u, v, cap_fn(edge)?, cost_fn(edge)?);
        }

        Ok(residual)
    }
}

/// One step of an augmenting path in the implicit residual view of a graph.
///
/// Both variants hold the step in traversal order `(tail, head)`. A
/// `Forward` step pushes flow on the input edge `(tail, head)`; a
/// `Backward` step cancels flow on the input edge `(head, tail)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResArcType<N> {
    Forward(N, N),
    Backward(N, N),
}

impl<N: Copy> ResArcType<N> {
    /// Key of the input edge this step acts on.
    pub(crate) fn edge(&self) -> (N, N) {
        match *self {
            ResArcType::Forward(u, v) => (u, v),
            ResArcType::Backward(u, v) => (v, u),
        }
    }
}

/// Capacities of `graph` keyed by `(source, target)`.
///
/// Parallel edges are merged by summing their capacities; self-loops can
/// never lie on an augmenting path and are dropped.
pub(crate) fn edge_capacities<G, F, T, E>(
    graph: G,
    mut cap_fn: F,
) -> Result<HashMap<(G::NodeId, G::NodeId), T>, E>
where
    G: IntoEdgeReferences,
    G::NodeId: Eq + Hash,
    F: FnMut(G::EdgeRef) -> Result<T, E>,
    T: Copy + Zero,
{
    let mut caps: HashMap<(G::NodeId, G::NodeId), T> = HashMap::new();

    for edge in graph.edge_references() {
        let capacity = cap_fn(edge)?;
        if edge.source() == edge.target() {
            continue;
        }
        let entry = caps.entry((edge.source(), edge.target())).or_insert_with(T::zero);
        *entry = *entry + capacity;
    }

    Ok(caps)
}

pub(crate) fn node_set<G>(graph: G) -> HashSet<G::NodeId>
where
    G: IntoNodeIdentifiers,
    G::NodeId: Eq + Hash,
{
    graph.node_identifiers().collect()
}

/// Breadth-first search for a hop-count shortest augmenting path.
///
/// `admissible` decides whether a residual step may be used. Forward steps
/// follow the outgoing edges of a node and backward steps its incoming
/// edges. Both endpoints must be nodes of `graph`.
pub(crate) fn find_augmenting_path<G, A>(
    graph: G,
    source: G::NodeId,
    sink: G::NodeId,
    mut admissible: A,
) -> Option<Vec<ResArcType<G::NodeId>>>
where
    G: IntoEdgesDirected + NodeIndexable,
    G::NodeId: Eq,
    A: FnMut(&ResArcType<G::NodeId>) -> bool,
{
    if source == sink {
        return None;
    }

    let mut pred: Vec<Option<ResArcType<G::NodeId>>> = vec![None; graph.node_bound()];
    let mut visited = FixedBitSet::with_capacity(graph.node_bound());
    let mut queue = VecDeque::from([source]);
    visited.insert(graph.to_index(source));

    while let Some(vertex) = queue.pop_front() {
        let forward = graph
            .edges_directed(vertex, Outgoing)
            .map(|edge| ResArcType::Forward(vertex, edge.target()));
        // Depending on the graph type, incoming edge references may report
        // their endpoints either way round.
        let backward = graph.edges_directed(vertex, Incoming).map(|edge| {
            let other = if edge.target() == vertex {
                edge.source()
            } else {
                edge.target()
            };
            ResArcType::Backward(vertex, other)
        });

        for arc in forward.chain(backward) {
            let head = match arc {
                ResArcType::Forward(_, head) | ResArcType::Backward(_, head) => head,
            };
            let head_index = graph.to_index(head);

            if head == vertex || visited.contains(head_index) || !admissible(&arc) {
                continue;
            }

            visited.insert(head_index);
            pred[head_index] = Some(arc);

            if head == sink {
                return Some(trace_path(&graph, source, sink, &pred));
            }
            queue.push_back(head);
        }
    }

    None
}

fn trace_path<G>(
    graph: &G,
    source: G::NodeId,
    sink: G::NodeId,
    pred: &[Option<ResArcType<G::NodeId>>],
) -> Vec<ResArcType<G::NodeId>>
where
    G: NodeIndexable,
    G::NodeId: Eq,
{
    let mut path = Vec::new();
    let mut vertex = sink;

    while vertex != source {
        match pred[graph.to_index(vertex)] {
            Some(arc) => {
                vertex = match arc {
                    ResArcType::Forward(tail, _) | ResArcType::Backward(tail, _) => tail,
                };
                path.push(arc);
            }
            None => break,
        }
    }

    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use petgraph::graph::{DiGraph, NodeIndex};
    use std::convert::Infallible;

    #[test]
    fn test_add_edge_pairs_reverse() {
        let mut graph: ResidualGraph<i64> = ResidualGraph::new(3);
        let a = graph.add_edge(0, 1, 4, 2);
        let b = graph.add_edge(1, 2, 3, 5);
        let c = graph.add_edge(0, 2, 1, -1);

        assert_eq!((a, b, c), (0, 1, 1));
        for u in 0..graph.node_count() {
            for (i, edge) in graph.edges(u).iter().enumerate() {
                let partner = graph.edge(edge.to, edge.rev);
                assert_eq!(partner.to, u);
                assert_eq!(partner.rev, i);
                assert_eq!(partner.cost, -edge.cost);
            }
        }
        assert_eq!(graph.edge(1, 0).cap, 0);
        assert_eq!(graph.edge(1, 0).cost, -2);
    }

    #[test]
    fn test_self_loop_pairs_reverse() {
        let mut graph: ResidualGraph<i64> = ResidualGraph::new(1);
        let fwd = graph.add_edge(0, 0, 5, 1);
        let edge = *graph.edge(0, fwd);

        assert_eq!(edge.rev, 1);
        assert_eq!(graph.edge(0, edge.rev).rev, fwd);
    }

    #[test]
    fn test_push_flow_moves_capacity() {
        let mut graph: ResidualGraph<i64> = ResidualGraph::new(2);
        let e = graph.add_edge(0, 1, 10, 3);

        graph.push_flow(0, e, 4);
        assert_eq!(graph.edge(0, e).cap, 6);
        assert_eq!(graph.flow(0, e), 4);

        let rev = graph.edge(0, e).rev;
        graph.push_flow(1, rev, 1);
        assert_eq!(graph.edge(0, e).cap, 7);
        assert_eq!(graph.flow(0, e), 3);
    }

    #[test]
    fn test_from_graph_keeps_edge_order() {
        let mut graph = DiGraph::<(), (i64, i64)>::new();
        let a = graph.add_node(());
        let b = graph.add_node(());
        let c = graph.add_node(());
        graph.add_edge(a, b, (5, 1));
        graph.add_edge(b, c, (2, 7));

        let residual: ResidualGraph<i64> =
            ResidualGraph::from_graph(&graph, |e| Ok::<i64, Infallible>(e.weight().0), |e| {
                Ok(e.weight().1)
            })
            .unwrap();

        assert_eq!(residual.node_count(), 3);
        assert_eq!(residual.edge_count(), 2);
        let arcs: Vec<(usize, usize, i64)> = residual.arc_flows().collect();
        assert_eq!(arcs, vec![(0, 1, 0), (1, 2, 0)]);
        assert_eq!(residual.edge(1, 1).cost, 7);
    }

    #[test]
    fn test_edge_capacities_merges_parallel_edges() {
        let mut graph = DiGraph::<(), u64>::new();
        let a = graph.add_node(());
        let b = graph.add_node(());
        graph.add_edge(a, b, 3);
        graph.add_edge(a, b, 4);
        graph.add_edge(b, b, 9);

        let caps = edge_capacities(&graph, |e| Ok::<u64, Infallible>(*e.weight())).unwrap();
        assert_eq!(caps.len(), 1);
        assert_eq!(caps[&(a, b)], 7);
    }

    #[test]
    fn test_find_augmenting_path_uses_backward_arcs() {
        // s -> a -> t plus b -> a, so from s the only way to b is the
        // backward step a -> b.
        let mut graph = DiGraph::<(), ()>::new();
        let s = graph.add_node(());
        let a = graph.add_node(());
        let b = graph.add_node(());
        graph.add_edge(s, a, ());
        graph.add_edge(b, a, ());

        let path = find_augmenting_path(&graph, s, b, |_| true).unwrap();
        assert_eq!(
            path,
            vec![ResArcType::Forward(s, a), ResArcType::Backward(a, b)]
        );
        assert_eq!(path[1].edge(), (b, a));

        let none = find_augmenting_path(&graph, s, b, |arc| {
            matches!(arc, ResArcType::Forward(..))
        });
        assert!(none.is_none());
    }

    #[test]
    fn test_find_augmenting_path_is_hop_shortest() {
        let mut graph = DiGraph::<(), ()>::new();
        let nodes: Vec<NodeIndex> = (0..5).map(|_| graph.add_node(())).collect();
        graph.add_edge(nodes[0], nodes[1], ());
        graph.add_edge(nodes[1], nodes[2], ());
        graph.add_edge(nodes[2], nodes[4], ());
        graph.add_edge(nodes[0], nodes[3], ());
        graph.add_edge(nodes[3], nodes[4], ());

        let path = find_augmenting_path(&graph, nodes[0], nodes[4], |_| true).unwrap();
        assert_eq!(
            path,
            vec![
                ResArcType::Forward(nodes[0], nodes[3]),
                ResArcType::Forward(nodes[3], nodes[4])
            ]
        );
        assert!(find_augmenting_path(&graph, nodes[0], nodes[0], |_| true).is_none());
    }
}
