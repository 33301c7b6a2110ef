//! Road graph: an undirected multigraph of road segments with a spatial
//! index over its nodes.

use geo::{Coord, Distance, Haversine, Point};
use hashbrown::HashMap;
use log::trace;
use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use rstar::RTree;
use rstar::primitives::GeomWithData;

use super::components::{NodeKey, RoadEdge, RoadNode};
use crate::{Cost, DEFAULT_NODE_PRECISION, Error};

/// Node position on the unit sphere, tagged with its graph index.
///
/// Chord length on the unit sphere grows monotonically with great-circle
/// distance, so a euclidean nearest-neighbour query over these points
/// returns the great-circle nearest node.
pub type IndexedPoint = GeomWithData<[f64; 3], NodeIndex>;

fn unit_sphere(point: Point<f64>) -> [f64; 3] {
    let (lon, lat) = (point.x().to_radians(), point.y().to_radians());
    [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()]
}

/// Build metadata carried alongside the graph
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoadGraphMeta {
    /// Rainfall intensity the flood depths were derived for (mm/hr)
    pub rain_mm: f64,
    /// Decimal places of the node keys
    pub node_precision: u32,
}

impl Default for RoadGraphMeta {
    fn default() -> Self {
        Self {
            rain_mm: 0.0,
            node_precision: DEFAULT_NODE_PRECISION,
        }
    }
}

/// Immutable road network used for routing.
///
/// Parallel edges between the same pair of nodes are kept; every lookup
/// that needs a single edge picks the cheapest one for the cost function
/// at hand.
#[derive(Debug, Clone)]
pub struct RoadGraph {
    pub(crate) graph: UnGraph<RoadNode, RoadEdge>,
    rtree: RTree<IndexedPoint>,
    meta: RoadGraphMeta,
}

impl RoadGraph {
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn meta(&self) -> RoadGraphMeta {
        self.meta
    }

    /// Node indices in insertion order
    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    pub fn node(&self, node: NodeIndex) -> Option<&RoadNode> {
        self.graph.node_weight(node)
    }

    pub fn node_position(&self, node: NodeIndex) -> Option<Point<f64>> {
        self.graph.node_weight(node).map(|n| n.geometry)
    }

    pub fn edge(&self, edge: EdgeIndex) -> Option<&RoadEdge> {
        self.graph.edge_weight(edge)
    }

    /// Find the nearest graph node to a point.
    ///
    /// Returns the node and its great-circle distance in meters, or `None`
    /// for an empty graph. Equidistant nodes resolve to the one inserted
    /// first.
    pub fn nearest_node(&self, point: &Point<f64>) -> Option<(NodeIndex, f64)> {
        let query = unit_sphere(*point);
        let mut candidates = self.rtree.nearest_neighbor_iter_with_distance_2(&query);
        let (first, best_d2) = candidates.next()?;

        let node = candidates
            .take_while(|(_, d2)| *d2 <= best_d2)
            .map(|(candidate, _)| candidate.data)
            .fold(first.data, NodeIndex::min);

        let position = self.graph[node].geometry;
        Some((node, Haversine.distance(*point, position)))
    }

    /// Neighbouring nodes together with the connecting edge.
    ///
    /// A neighbour reached over parallel edges is yielded once per edge.
    pub fn neighbors(&self, node: NodeIndex) -> impl Iterator<Item = (NodeIndex, &RoadEdge)> + '_ {
        self.graph.edges(node).map(move |edge| {
            let other = if edge.source() == node {
                edge.target()
            } else {
                edge.source()
            };
            (other, edge.weight())
        })
    }

    /// All edges directly connecting `a` and `b`
    pub fn edges_between(
        &self,
        a: NodeIndex,
        b: NodeIndex,
    ) -> impl Iterator<Item = &RoadEdge> + '_ {
        self.graph.edges_connecting(a, b).map(|edge| edge.weight())
    }

    /// Cheapest edge between `a` and `b` under `cost`, first inserted on ties
    pub fn cheapest_edge<W>(&self, a: NodeIndex, b: NodeIndex, cost: W) -> Option<(&RoadEdge, Cost)>
    where
        W: Fn(&RoadEdge) -> Cost,
    {
        self.edges_between(a, b)
            .map(|edge| (edge, cost(edge)))
            .fold(None, |best, (edge, c)| match best {
                Some((_, best_cost)) if best_cost <= c => best,
                _ => Some((edge, c)),
            })
    }

    /// Sum of the cheapest edge costs along a node path.
    ///
    /// Returns `None` if two consecutive nodes are not connected. A single
    /// node path costs nothing.
    pub fn path_cost<W>(&self, path: &[NodeIndex], cost: W) -> Option<Cost>
    where
        W: Fn(&RoadEdge) -> Cost,
    {
        path.windows(2).try_fold(0.0, |total, pair| {
            self.cheapest_edge(pair[0], pair[1], &cost)
                .map(|(_, c)| total + c)
        })
    }
}

/// Incremental construction of a [`RoadGraph`]
#[derive(Debug)]
pub struct RoadGraphBuilder {
    graph: UnGraph<RoadNode, RoadEdge>,
    node_keys: HashMap<NodeKey, NodeIndex>,
    meta: RoadGraphMeta,
}

impl Default for RoadGraphBuilder {
    fn default() -> Self {
        Self::new(RoadGraphMeta::default())
    }
}

impl RoadGraphBuilder {
    pub fn new(meta: RoadGraphMeta) -> Self {
        Self {
            graph: UnGraph::default(),
            node_keys: HashMap::new(),
            meta,
        }
    }

    /// Node for a coordinate, created on first sight of its key
    pub fn add_node(&mut self, coord: Coord<f64>) -> NodeIndex {
        let key = NodeKey::quantize(coord.x, coord.y, self.meta.node_precision);
        *self.node_keys.entry(key).or_insert_with(|| {
            self.graph.add_node(RoadNode {
                key,
                geometry: Point::from(coord),
            })
        })
    }

    /// Add a segment between two coordinates.
    ///
    /// Segments whose endpoints collapse into the same node are dropped.
    pub fn add_segment(
        &mut self,
        from: Coord<f64>,
        to: Coord<f64>,
        edge: RoadEdge,
    ) -> Option<EdgeIndex> {
        let a = self.add_node(from);
        let b = self.add_node(to);
        if a == b {
            trace!("Dropping degenerate segment of road {}", edge.road_id);
            return None;
        }
        Some(self.graph.add_edge(a, b, edge))
    }

    /// Connect two existing nodes
    pub fn add_edge(
        &mut self,
        a: NodeIndex,
        b: NodeIndex,
        edge: RoadEdge,
    ) -> Result<EdgeIndex, Error> {
        if a.index() >= self.graph.node_count() || b.index() >= self.graph.node_count() {
            return Err(Error::InvalidNodeIndex);
        }
        Ok(self.graph.add_edge(a, b, edge))
    }

    pub fn build(self) -> RoadGraph {
        let points = self
            .graph
            .node_indices()
            .map(|idx| IndexedPoint::new(unit_sphere(self.graph[idx].geometry), idx))
            .collect();

        RoadGraph {
            graph: self.graph,
            rtree: RTree::bulk_load(points),
            meta: self.meta,
        }
    }
}
