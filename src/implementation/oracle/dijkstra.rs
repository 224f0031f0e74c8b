// Copyright 2020 Xavier Gillard
//
// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! This module provides the Dijkstra shortest path algorithm over an extended
//! graph. It is used both by the preprocessing (with physical lengths) and by
//! the oracle (with lagrangian costs). All weights must be non negative.

use std::cmp::Ordering;

use binary_heap_plus::BinaryHeap;
use compare::Compare;
use ordered_float::OrderedFloat;

use crate::{ArcId, ExtendedGraph, NodeId};

/// The direction in which the arcs are traversed
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Direction {
    /// Follow arcs from tail to head (distances *from* the origin)
    Forward,
    /// Follow arcs from head to tail (distances *to* the origin)
    Backward,
}

/// An entry of the priority queue
#[derive(Debug, Copy, Clone)]
struct Visit {
    node: NodeId,
    dist: OrderedFloat<f64>,
}

/// Pops the closest node first. Ties are broken on the node id so that the
/// exploration order never depends on anything but the graph.
#[derive(Debug, Default, Copy, Clone)]
struct ClosestFirst;
impl Compare<Visit> for ClosestFirst {
    fn compare(&self, l: &Visit, r: &Visit) -> Ordering {
        r.dist.cmp(&l.dist).then_with(|| r.node.cmp(&l.node))
    }
}

/// The shortest path tree computed by `dijkstra`
#[derive(Debug, Clone)]
pub struct ShortestPaths {
    dist: Vec<f64>,
    pred: Vec<Option<ArcId>>,
}
impl ShortestPaths {
    /// The distance between the origin and the given node (if reachable)
    pub fn distance(&self, node: NodeId) -> Option<f64> {
        let d = self.dist[node.0];
        if d.is_finite() { Some(d) } else { None }
    }
    /// The arcs of a shortest path between the origin and the given node,
    /// in the traversal order. Only meaningful for a forward search.
    pub fn path_to(&self, graph: &ExtendedGraph, node: NodeId) -> Option<Vec<ArcId>> {
        self.distance(node)?;
        let mut path = vec![];
        let mut current = node;
        while let Some(arc) = self.pred[current.0] {
            path.push(arc);
            current = graph.arc(arc).tail;
        }
        path.reverse();
        Some(path)
    }
}

/// Computes the shortest paths from `origin` over the live arcs of the
/// graph. When `stop_at` is given, the search stops as soon as that node has
/// been settled.
pub fn dijkstra<F>(graph: &ExtendedGraph, origin: NodeId, direction: Direction, weight: F, stop_at: Option<NodeId>) -> ShortestPaths
    where F: Fn(ArcId) -> f64
{
    let n        = graph.nb_nodes();
    let mut dist = vec![f64::INFINITY; n];
    let mut pred = vec![None; n];
    let mut done = vec![false; n];
    let mut heap = BinaryHeap::from_vec_cmp(vec![], ClosestFirst);

    dist[origin.0] = 0.0;
    heap.push(Visit { node: origin, dist: OrderedFloat(0.0) });

    while let Some(Visit { node, dist: d }) = heap.pop() {
        if done[node.0] {
            continue;
        }
        done[node.0] = true;
        if Some(node) == stop_at {
            break;
        }

        let mut relax = |arc: ArcId, next: NodeId| {
            let candidate = d.0 + weight(arc);
            if candidate < dist[next.0] {
                dist[next.0] = candidate;
                pred[next.0] = Some(arc);
                heap.push(Visit { node: next, dist: OrderedFloat(candidate) });
            }
        };
        match direction {
            Direction::Forward  => graph.outbound(node).for_each(|a| relax(a, graph.arc(a).head)),
            Direction::Backward => graph.inbound(node).for_each(|a| relax(a, graph.arc(a).tail)),
        }
    }

    ShortestPaths { dist, pred }
}


// ############################################################################
// #### TESTS #################################################################
// ############################################################################
