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

//! Error type shared by the flow engines.

use std::convert::Infallible;

use thiserror::Error;

/// Failure modes of a flow computation.
///
/// "No augmenting path" is never an error: it is how every engine stops.
/// `E` is the error type of the caller's capacity/cost callbacks.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlowError<E = Infallible> {
    /// A negative-cost cycle is reachable from the source in the residual
    /// graph. Either the input costs were malformed or the residual graph
    /// was corrupted; the run is aborted.
    #[error("negative cycle detected in the residual graph")]
    NegativeCycle,
    /// The source or sink is not a node of the input graph.
    #[error("source or sink is not a node of the graph")]
    NodeNotFound,
    /// A node index is not below the node count of a residual graph.
    #[error("node index \"{0}\" out of graph bound")]
    IndexOutOfBounds(usize),
    /// A capacity or cost callback returned an error.
    #[error("edge attribute callback failed: {0:?}")]
    Callback(E),
}

impl FlowError<Infallible> {
    /// Lift an error from a callback-free computation into one that also
    /// carries callback failures.
    pub fn widen<E>(self) -> FlowError<E> {
        match self {
            FlowError::NegativeCycle => FlowError::NegativeCycle,
            FlowError::NodeNotFound => FlowError::NodeNotFound,
            FlowError::IndexOutOfBounds(index) => FlowError::IndexOutOfBounds(index),
            FlowError::Callback(never) => match never {},
        }
    }
}
