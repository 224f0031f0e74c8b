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

//! This module provides the arena based representation of the extended graph
//! of one demand. Each node of that graph is a pair (node label, slice) and
//! each arc stands for the use of a physical link with a window of slices
//! ending at the arc slice.

use fxhash::FxHashMap;

use crate::Demand;

/// The identifier of a node in an extended graph (its index in the arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub usize);

/// The identifier of an arc in an extended graph. Once the graph has been
/// contracted, this is also the dense index of the arc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArcId(pub usize);
impl ArcId {
    #[inline]
    pub fn id(self) -> usize {
        self.0
    }
}

/// A node of the extended graph
#[derive(Debug, Clone)]
pub struct ExtendedNode {
    /// The label of the physical node
    pub label: usize,
    /// The slice of the node. It is `None` for the contracted source and
    /// target nodes.
    pub slice: Option<usize>,
    outbound: Vec<ArcId>,
    inbound : Vec<ArcId>,
}

/// An arc of the extended graph
#[derive(Debug, Clone)]
pub struct ExtendedArc {
    pub tail  : NodeId,
    pub head  : NodeId,
    /// The physical link this arc travels through
    pub link  : usize,
    /// The last slice of the window occupied on the link
    pub slice : usize,
    /// The physical length of the link
    pub length: f64,
    alive: bool,
}

/// The extended graph of one single demand. Arcs are never physically removed
/// before the graph gets contracted: erasing an arc simply flags it dead.
#[derive(Debug, Clone)]
pub struct ExtendedGraph {
    demand: Demand,
    nodes : Vec<ExtendedNode>,
    arcs  : Vec<ExtendedArc>,
    lookup: FxHashMap<(usize, usize), NodeId>,
    source: Option<NodeId>,
    target: Option<NodeId>,
    nb_alive: usize,
    contracted: bool,
}
impl ExtendedGraph {
    /// Creates an empty graph for the given demand
    pub fn new(demand: Demand) -> Self {
        ExtendedGraph {
            demand,
            nodes: vec![],
            arcs: vec![],
            lookup: FxHashMap::default(),
            source: None,
            target: None,
            nb_alive: 0,
            contracted: false,
        }
    }
    /// The demand owning this graph
    pub fn demand(&self) -> &Demand {
        &self.demand
    }
    /// Returns the node (label, slice), creating it on first use
    pub fn node_at(&mut self, label: usize, slice: usize) -> NodeId {
        if let Some(id) = self.lookup.get(&(label, slice)) {
            return *id;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(ExtendedNode { label, slice: Some(slice), outbound: vec![], inbound: vec![] });
        self.lookup.insert((label, slice), id);
        id
    }
    /// Returns the node (label, slice) if it was ever created
    pub fn find(&self, label: usize, slice: usize) -> Option<NodeId> {
        self.lookup.get(&(label, slice)).copied()
    }
    /// Adds a new arc between two existing nodes
    pub fn add_arc(&mut self, tail: NodeId, head: NodeId, link: usize, slice: usize, length: f64) -> ArcId {
        let id = ArcId(self.arcs.len());
        self.arcs.push(ExtendedArc { tail, head, link, slice, length, alive: true });
        self.nodes[tail.0].outbound.push(id);
        self.nodes[head.0].inbound.push(id);
        self.nb_alive += 1;
        id
    }
    /// Erases an arc. Returns true iff the arc was still alive.
    pub fn erase(&mut self, arc: ArcId) -> bool {
        let a = &mut self.arcs[arc.0];
        if a.alive {
            a.alive = false;
            self.nb_alive -= 1;
            true
        } else {
            false
        }
    }
    pub fn is_alive(&self, arc: ArcId) -> bool {
        self.arcs[arc.0].alive
    }
    /// The number of live arcs
    pub fn nb_arcs(&self) -> usize {
        self.nb_alive
    }
    /// The number of nodes in the arena (some may have lost all their arcs)
    pub fn nb_nodes(&self) -> usize {
        self.nodes.len()
    }
    pub fn arc(&self, id: ArcId) -> &ExtendedArc {
        &self.arcs[id.0]
    }
    pub fn node(&self, id: NodeId) -> &ExtendedNode {
        &self.nodes[id.0]
    }
    /// Iterates over the live arcs of the graph
    pub fn arcs(&self) -> impl Iterator<Item = ArcId> + '_ {
        self.arcs.iter().enumerate()
            .filter(|(_, a)| a.alive)
            .map(|(i, _)| ArcId(i))
    }
    /// Iterates over the live arcs leaving the given node
    pub fn outbound(&self, node: NodeId) -> impl Iterator<Item = ArcId> + '_ {
        self.nodes[node.0].outbound.iter().copied().filter(|a| self.arcs[a.0].alive)
    }
    /// Iterates over the live arcs entering the given node
    pub fn inbound(&self, node: NodeId) -> impl Iterator<Item = ArcId> + '_ {
        self.nodes[node.0].inbound.iter().copied().filter(|a| self.arcs[a.0].alive)
    }
    /// A node exists as long as at least one live arc is incident to it
    pub fn has_live_arc(&self, node: NodeId) -> bool {
        self.outbound(node).next().is_some() || self.inbound(node).next().is_some()
    }
    /// The contracted source node (available after contraction)
    pub fn source(&self) -> Option<NodeId> {
        self.source
    }
    /// The contracted target node (available after contraction)
    pub fn target(&self) -> Option<NodeId> {
        self.target
    }
    pub fn is_contracted(&self) -> bool {
        self.contracted
    }

    /// Merges all the nodes labelled with the demand source into one single
    /// node without slice (idem for the target), drops the dead arcs and the
    /// isolated nodes. After this call, the id of each arc is its dense index.
    pub fn contract(&mut self) {
        let src_label = self.demand.source;
        let tgt_label = self.demand.target;

        let mut nodes : Vec<ExtendedNode> = vec![];
        let mut lookup = FxHashMap::default();
        let mut remap  = vec![None; self.nodes.len()];
        let mut source = None;
        let mut target = None;

        for (i, node) in self.nodes.iter().enumerate() {
            if !self.has_live_arc(NodeId(i)) {
                continue;
            }
            let contracted = if node.label == src_label {
                Some(&mut source)
            } else if node.label == tgt_label {
                Some(&mut target)
            } else {
                None
            };
            let id = match contracted {
                Some(Some(id)) => *id,
                Some(slot) => {
                    let id = NodeId(nodes.len());
                    nodes.push(ExtendedNode { label: node.label, slice: None, outbound: vec![], inbound: vec![] });
                    *slot = Some(id);
                    id
                },
                None => {
                    let id = NodeId(nodes.len());
                    nodes.push(ExtendedNode { label: node.label, slice: node.slice, outbound: vec![], inbound: vec![] });
                    if let Some(slice) = node.slice {
                        lookup.insert((node.label, slice), id);
                    }
                    id
                }
            };
            remap[i] = Some(id);
        }

        let mut arcs = vec![];
        for arc in self.arcs.iter().filter(|a| a.alive) {
            if let (Some(tail), Some(head)) = (remap[arc.tail.0], remap[arc.head.0]) {
                let id = ArcId(arcs.len());
                arcs.push(ExtendedArc { tail, head, link: arc.link, slice: arc.slice, length: arc.length, alive: true });
                nodes[tail.0].outbound.push(id);
                nodes[head.0].inbound.push(id);
            }
        }

        self.nb_alive   = arcs.len();
        self.nodes      = nodes;
        self.arcs       = arcs;
        self.lookup     = lookup;
        self.source     = source;
        self.target     = target;
        self.contracted = true;
    }
}


// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_extended_graph {
    use crate::*;

    fn demand() -> Demand {
        Demand::new(0, 0, 2, 1, 10.0)
    }

    #[test]
    fn nodes_are_created_lazily_and_only_once() {
        let mut g = ExtendedGraph::new(demand());
        let a = g.node_at(0, 3);
        let b = g.node_at(0, 3);
        assert_eq!(a, b);
        assert_eq!(1, g.nb_nodes());
        assert_eq!(Some(a), g.find(0, 3));
        assert_eq!(None, g.find(0, 2));
    }
    #[test]
    fn erasing_an_arc_twice_only_counts_once() {
        let mut g = ExtendedGraph::new(demand());
        let a = g.node_at(0, 0);
        let b = g.node_at(1, 0);
        let arc = g.add_arc(a, b, 0, 0, 1.0);
        assert_eq!(1, g.nb_arcs());
        assert!(g.erase(arc));
        assert!(!g.erase(arc));
        assert_eq!(0, g.nb_arcs());
        assert!(!g.has_live_arc(a));
    }
    #[test]
    fn contraction_merges_source_and_target_nodes_across_slices() {
        let mut g = ExtendedGraph::new(demand());
        for s in 0..2 {
            let a = g.node_at(0, s);
            let b = g.node_at(1, s);
            let c = g.node_at(2, s);
            g.add_arc(a, b, 0, s, 1.0);
            g.add_arc(b, c, 1, s, 1.0);
        }
        g.contract();
        assert!(g.is_contracted());
        assert_eq!(4, g.nb_arcs());
        // one source, one target, two intermediate nodes
        assert_eq!(4, g.nb_nodes());
        let src = g.source().unwrap();
        let tgt = g.target().unwrap();
        assert_eq!(None, g.node(src).slice);
        assert_eq!(None, g.node(tgt).slice);
        assert_eq!(2, g.outbound(src).count());
        assert_eq!(2, g.inbound(tgt).count());
    }
    #[test]
    fn contraction_assigns_dense_indices_to_live_arcs() {
        let mut g = ExtendedGraph::new(demand());
        let a = g.node_at(0, 0);
        let b = g.node_at(1, 0);
        let c = g.node_at(2, 0);
        let dead = g.add_arc(b, a, 0, 0, 1.0);
        g.add_arc(a, b, 0, 0, 1.0);
        g.add_arc(b, c, 1, 0, 1.0);
        g.erase(dead);
        g.contract();
        let ids: Vec<usize> = g.arcs().map(|a| a.id()).collect();
        assert_eq!(vec![0, 1], ids);
    }
    #[test]
    fn contraction_of_an_empty_graph_has_no_source_nor_target() {
        let mut g = ExtendedGraph::new(demand());
        let a = g.node_at(0, 0);
        let b = g.node_at(1, 0);
        let arc = g.add_arc(a, b, 0, 0, 1.0);
        g.erase(arc);
        g.contract();
        assert_eq!(None, g.source());
        assert_eq!(None, g.target());
        assert_eq!(0, g.nb_arcs());
    }
}
