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

//! This module defines the physical network (nodes, links and their spectrum)
//! as well as the traffic demands that must be routed on top of it. An
//! `Instance` is the immutable snapshot the lagrangian engine works on during
//! one routing round.

use crate::{Error, Outcome};

// ----------------------------------------------------------------------------
// --- PHYSICAL LINK ----------------------------------------------------------
// ----------------------------------------------------------------------------
/// A fiber link of the physical topology. Its spectrum is split in a fixed
/// number of frequency slices, some of which may already be occupied by the
/// demands routed during previous rounds.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalLink {
    /// The identifier of the link. It must match its position in the topology
    pub id: usize,
    /// One endpoint of the (undirected) link
    pub source: usize,
    /// The other endpoint of the (undirected) link
    pub target: usize,
    /// The physical length of the link
    pub length: f64,
    /// occupied[s] is true iff slice s is already in use on this link
    occupied: Vec<bool>,
}
impl PhysicalLink {
    /// Creates a new link whose `nb_slices` slices are all free
    pub fn new(id: usize, source: usize, target: usize, length: f64, nb_slices: usize) -> Self {
        PhysicalLink { id, source, target, length, occupied: vec![false; nb_slices] }
    }
    /// Marks the given slices as occupied (out of range slices are ignored)
    pub fn with_occupied(mut self, slices: &[usize]) -> Self {
        for s in slices.iter().copied() {
            self.occupy(s);
        }
        self
    }
    /// The number of slices on the link
    pub fn nb_slices(&self) -> usize {
        self.occupied.len()
    }
    /// Returns true iff the given slice exists and is free
    pub fn is_free(&self, slice: usize) -> bool {
        slice < self.occupied.len() && !self.occupied[slice]
    }
    /// Returns true iff the window of `load` slices ending at `last_slice`
    /// lies on the link and is entirely free.
    pub fn is_window_free(&self, last_slice: usize, load: usize) -> bool {
        if load == 0 || last_slice + 1 < load || last_slice >= self.occupied.len() {
            return false;
        }
        (last_slice + 1 - load..=last_slice).all(|s| !self.occupied[s])
    }
    /// Marks a slice as occupied
    pub fn occupy(&mut self, slice: usize) {
        if let Some(s) = self.occupied.get_mut(slice) {
            *s = true;
        }
    }
    /// The index of the highest occupied slice, if any
    pub fn max_used_slice(&self) -> Option<usize> {
        self.occupied.iter().rposition(|used| *used)
    }
}

// ----------------------------------------------------------------------------
// --- DEMAND -----------------------------------------------------------------
// ----------------------------------------------------------------------------
/// A traffic request between two nodes of the topology
#[derive(Debug, Clone, PartialEq)]
pub struct Demand {
    pub id: usize,
    pub source: usize,
    pub target: usize,
    /// The number of contiguous slices this demand requires
    pub load: usize,
    /// The maximum physical length of the path (optical reach)
    pub max_length: f64,
    /// Set once the demand has been routed in some earlier round
    pub routed: bool,
}
impl Demand {
    pub fn new(id: usize, source: usize, target: usize, load: usize, max_length: f64) -> Self {
        Demand { id, source, target, load, max_length, routed: false }
    }
}

// ----------------------------------------------------------------------------
// --- INSTANCE ---------------------------------------------------------------
// ----------------------------------------------------------------------------
/// The snapshot of the network and of the demands for one routing round.
///
/// # Example
/// ```
/// # use lagrsa::*;
/// let instance = Instance::new(3,
///     vec![PhysicalLink::new(0, 0, 1, 1.0, 4), PhysicalLink::new(1, 1, 2, 1.0, 4)],
///     vec![Demand::new(0, 0, 2, 2, 10.0)]).unwrap();
/// assert_eq!(1, instance.pending_demands().len());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    nb_nodes: usize,
    links   : Vec<PhysicalLink>,
    demands : Vec<Demand>,
}
impl Instance {
    /// Creates a new instance after having checked its consistency.
    pub fn new(nb_nodes: usize, links: Vec<PhysicalLink>, demands: Vec<Demand>) -> Result<Self, Error> {
        for (i, link) in links.iter().enumerate() {
            if link.id != i {
                return Err(Error::InvalidInstance(format!("link {} is stored at position {i}", link.id)));
            }
            if link.source >= nb_nodes || link.target >= nb_nodes {
                return Err(Error::InvalidInstance(format!("link {i} references an unknown node")));
            }
            if link.source == link.target {
                return Err(Error::InvalidInstance(format!("link {i} is a self loop")));
            }
            if !link.length.is_finite() || link.length < 0.0 {
                return Err(Error::InvalidInstance(format!("link {i} has an invalid length {}", link.length)));
            }
        }
        for demand in demands.iter() {
            if demand.source >= nb_nodes || demand.target >= nb_nodes {
                return Err(Error::InvalidInstance(format!("demand {} references an unknown node", demand.id)));
            }
            if demand.source == demand.target {
                return Err(Error::InvalidInstance(format!("demand {} has identical endpoints", demand.id)));
            }
            if demand.load == 0 {
                return Err(Error::InvalidInstance(format!("demand {} has a null load", demand.id)));
            }
            if !demand.max_length.is_finite() || demand.max_length < 0.0 {
                return Err(Error::InvalidInstance(format!("demand {} has an invalid max length", demand.id)));
            }
        }
        Ok(Instance { nb_nodes, links, demands })
    }
    pub fn nb_nodes(&self) -> usize {
        self.nb_nodes
    }
    pub fn links(&self) -> &[PhysicalLink] {
        &self.links
    }
    pub fn link(&self, id: usize) -> &PhysicalLink {
        &self.links[id]
    }
    pub fn demands(&self) -> &[Demand] {
        &self.demands
    }
    /// The demands that still need to be routed, in their original order.
    pub fn pending_demands(&self) -> Vec<Demand> {
        self.demands.iter().filter(|d| !d.routed).cloned().collect()
    }
    /// Produces the snapshot of the next round: the windows of all routed
    /// paths become occupied and the corresponding demands are flagged as
    /// routed.
    pub fn apply(&self, outcome: &Outcome) -> Instance {
        let mut next = self.clone();
        for path in outcome.routing.iter().filter_map(|r| r.path()) {
            for hop in path.hops.iter() {
                let link = &mut next.links[hop.link];
                for s in path.first_slice..=hop.slice {
                    link.occupy(s);
                }
            }
            for demand in next.demands.iter_mut().filter(|d| d.id == path.demand) {
                demand.routed = true;
            }
        }
        next
    }
}


// ############################################################################
// #### TESTS #################################################################
// ############################################################################
