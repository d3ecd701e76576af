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

mod bellman_ford;
mod capacity_scaling;
mod ford_fulkerson;
mod multi_commodity;
mod residual;
mod successive_shortest_paths;

pub use bellman_ford::{bellman_ford, ShortestPathTree};
pub use capacity_scaling::capacity_scaling;
pub use ford_fulkerson::{ford_fulkerson, MaxFlowReturn};
pub use multi_commodity::{multi_commodity_flow, Commodity, MultiCommodityReturn};
pub use residual::{ResidualEdge, ResidualGraph};
pub use successive_shortest_paths::{
    min_cost_flow, min_cost_max_flow, successive_shortest_paths, MCFReturn,
};
