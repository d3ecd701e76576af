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

use log::{debug, warn};
use num_traits::PrimInt;
use petgraph::visit::{IntoEdgeReferences, IntoEdgesDirected, IntoNodeIdentifiers, NodeIndexable};

use super::ford_fulkerson::{check_terminals, FlowState, MaxFlowReturn};
use super::residual::{edge_capacities, find_augmenting_path};
use crate::err::FlowError;

/// Largest power of two not exceeding `value`, or `None` if `value < 1`.
fn largest_power_of_two<T: PrimInt>(value: T) -> Option<T> {
    if value < T::one() {
        return None;
    }
    let mut delta = T::one();
    while delta <= value >> 1 {
        delta = delta << 1;
    }
    Some(delta)
}

/// Compute a maximum flow from `source` to `sink` with capacity scaling.
///
/// The search for augmenting paths is restricted to residual steps with
/// capacity at least Δ. Δ starts at the largest power of two not exceeding
/// the largest edge capacity; each phase augments along hop-shortest
/// Δ-paths until none is left and then halves Δ. The last phase (Δ = 1) is
/// an unrestricted augmenting-path search, so the result is a maximum flow,
/// reached after O(E·log(C)) augmentations where `C` is the largest
/// capacity.
///
/// Capacities must be integers. Parallel edges are merged into a single
/// edge with the summed capacity and self-loops are ignored.
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
/// use flownet_core::flow::{capacity_scaling, ford_fulkerson};
/// use flownet_core::petgraph::graph::DiGraph;
/// use flownet_core::petgraph::visit::EdgeRef;
///
/// let mut graph = DiGraph::<(), u64>::new();
/// let s = graph.add_node(());
/// let a = graph.add_node(());
/// let t = graph.add_node(());
/// graph.extend_with_edges([(s, a, 1000), (a, t, 999), (s, t, 3)]);
///
/// let scaled = capacity_scaling(&graph, s, t, |e| Ok::<u64, Infallible>(*e.weight())).unwrap();
/// let plain = ford_fulkerson(&graph, s, t, |e| Ok::<u64, Infallible>(*e.weight())).unwrap();
/// assert_eq!(scaled.value, 1002);
/// assert_eq!(scaled.value, plain.value);
/// ```
pub fn capacity_scaling<G, F, T, E>(
    graph: G,
    source: G::NodeId,
    sink: G::NodeId,
    cap_fn: F,
) -> Result<MaxFlowReturn<G::NodeId, T>, FlowError<E>>
where
    G: IntoEdgeReferences + IntoEdgesDirected + IntoNodeIdentifiers + NodeIndexable,
    G::NodeId: Eq + Hash,
    F: FnMut(G::EdgeRef) -> Result<T, E>,
    T: PrimInt,
{
    check_terminals(graph, source, sink)?;
    let caps = edge_capacities(graph, cap_fn).map_err(FlowError::Callback)?;
    let max_cap = caps.values().copied().max();
    let mut state = FlowState::new(caps);

    let mut delta = max_cap.and_then(largest_power_of_two);
    while let Some(threshold) = delta {
        let before = state.augmentations;

        while let Some(path) = find_augmenting_path(graph, source, sink, |arc| {
            state.residual_capacity(arc) >= threshold
        }) {
            if state.augment(&path) <= T::zero() {
                warn!("augmenting path with non-positive bottleneck; stopping phase");
                break;
            }
        }

        debug!(
            "scaling phase finished with {} augmentations",
            state.augmentations - before
        );
        delta = largest_power_of_two(threshold >> 1);
    }

    debug!("max flow found after {} augmentations", state.augmentations);
    Ok(state.into_return(source))
}
