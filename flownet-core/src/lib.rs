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

//! # flownet-core
//!
//! Flow network algorithms built on paired forward/reverse residual edges.
//!
//! The crate offers two ways into the engines:
//!
//! * [`flow::ResidualGraph`] is an adjacency-list residual graph with
//!   index-paired reverse edges. The minimum-cost flow engine
//!   ([`flow::successive_shortest_paths`]) runs directly on it.
//! * The maximum-flow engines ([`flow::ford_fulkerson`],
//!   [`flow::capacity_scaling`]) and the multi-commodity heuristic
//!   ([`flow::multi_commodity_flow`]) are generic over [`petgraph`] graphs
//!   and read edge capacities through a callback, in the same way as the
//!   rest of the petgraph ecosystem.
//!
//! Random instance producers live in [`generators`].
//!
//! ```rust
//! use std::convert::Infallible;
//! use flownet_core::flow::ford_fulkerson;
//! use flownet_core::petgraph::graph::DiGraph;
//! use flownet_core::petgraph::visit::EdgeRef;
//!
//! let mut graph = DiGraph::<(), u64>::new();
//! let s = graph.add_node(());
//! let t = graph.add_node(());
//! graph.add_edge(s, t, 7);
//!
//! let res = ford_fulkerson(&graph, s, t, |e| Ok::<u64, Infallible>(*e.weight())).unwrap();
//! assert_eq!(res.value, 7);
//! assert_eq!(res.augmentations, 1);
//! ```

pub mod err;
pub mod flow;
pub mod generators;

pub use err::FlowError;

// re-export petgraph so there is only one version available
pub use petgraph;
