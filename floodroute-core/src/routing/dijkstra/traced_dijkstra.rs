use std::collections::BinaryHeap;

use fixedbitset::FixedBitSet;
use hashbrown::HashMap;
use petgraph::graph::NodeIndex;

use super::state::State;
use crate::{Cost, RoadGraph, model::RoadEdge};

/// Node sequence from source to target with its accumulated cost
#[derive(Debug, Clone, PartialEq)]
pub struct ShortestPath {
    pub cost: Cost,
    pub nodes: Vec<NodeIndex>,
}

/// Dijkstra's algorithm from `start` to `target` over the road graph.
///
/// Edge weights are computed on demand by `weight`, so the same graph can be
/// searched with a different cost function on every call. Edges with a
/// non-finite weight are never relaxed. All search state is local to the
/// call.
///
/// Returns `None` when `target` is unreachable or either node does not
/// exist.
pub fn shortest_path<W>(
    graph: &RoadGraph,
    start: NodeIndex,
    target: NodeIndex,
    weight: W,
) -> Option<ShortestPath>
where
    W: Fn(&RoadEdge) -> Cost,
{
    let node_count = graph.node_count();
    if start.index() >= node_count || target.index() >= node_count {
        return None;
    }

    // Estimate capacity based on graph size
    let estimated_nodes = node_count.min(1000);
    let mut distances: HashMap<NodeIndex, Cost> = HashMap::with_capacity(estimated_nodes);
    let mut predecessors: HashMap<NodeIndex, NodeIndex> = HashMap::with_capacity(estimated_nodes);
    let mut settled = FixedBitSet::with_capacity(node_count);
    let mut heap = BinaryHeap::with_capacity(estimated_nodes / 4);

    heap.push(State {
        cost: 0.0,
        node: start,
    });
    distances.insert(start, 0.0);

    while let Some(State { cost, node }) = heap.pop() {
        if node == target {
            return Some(ShortestPath {
                cost,
                nodes: trace_back(&predecessors, start, target),
            });
        }

        // Stale heap entry
        if settled.put(node.index()) {
            continue;
        }

        for (next, edge) in graph.neighbors(node) {
            if settled.contains(next.index()) {
                continue;
            }

            let edge_cost = weight(edge);
            if !edge_cost.is_finite() {
                continue;
            }
            debug_assert!(edge_cost >= 0.0, "negative edge weight {edge_cost}");
            let next_cost = cost + edge_cost;

            match distances.entry(next) {
                hashbrown::hash_map::Entry::Vacant(entry) => {
                    entry.insert(next_cost);
                    heap.push(State {
                        cost: next_cost,
                        node: next,
                    });
                    predecessors.insert(next, node);
                }
                hashbrown::hash_map::Entry::Occupied(mut entry) => {
                    if next_cost < *entry.get() {
                        *entry.get_mut() = next_cost;
                        heap.push(State {
                            cost: next_cost,
                            node: next,
                        });
                        predecessors.insert(next, node);
                    }
                }
            }
        }
    }

    None
}

/// Follow predecessors backward from target to start
fn trace_back(
    predecessors: &HashMap<NodeIndex, NodeIndex>,
    start: NodeIndex,
    target: NodeIndex,
) -> Vec<NodeIndex> {
    let mut path = vec![target];
    let mut current = target;
    while current != start {
        match predecessors.get(&current) {
            Some(&prev) => {
                path.push(prev);
                current = prev;
            }
            None => break,
        }
    }
    path.reverse();
    path
}
