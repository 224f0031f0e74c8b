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

//! This module provides the flat tables in which the lagrangian multipliers
//! (and everything that has the same shape: slacks, directions, ...) are
//! stored. The position of each relaxed constraint is computed from its
//! coordinates by the `ConstraintLayout`.

use crate::{Demand, Instance};

// ----------------------------------------------------------------------------
// --- LOAD CLASSES -----------------------------------------------------------
// ----------------------------------------------------------------------------
/// The distinct loads of the demands of a round, sorted in increasing order.
/// The position of a load in that sequence is its load class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadClasses {
    loads: Vec<usize>,
}
impl LoadClasses {
    pub fn from_demands(demands: &[Demand]) -> Self {
        let mut loads: Vec<usize> = demands.iter().map(|d| d.load).collect();
        loads.sort_unstable();
        loads.dedup();
        LoadClasses { loads }
    }
    pub fn len(&self) -> usize {
        self.loads.len()
    }
    pub fn is_empty(&self) -> bool {
        self.loads.is_empty()
    }
    /// The load of the given class
    pub fn load(&self, class: usize) -> usize {
        self.loads[class]
    }
    /// The class of the given load (if that load appears in the round)
    pub fn class_of(&self, load: usize) -> Option<usize> {
        self.loads.binary_search(&load).ok()
    }
}

// ----------------------------------------------------------------------------
// --- SLICE LAYOUT -----------------------------------------------------------
// ----------------------------------------------------------------------------
/// Maps every (link, slice) pair of the topology onto a dense position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceLayout {
    offsets: Vec<usize>,
    sizes  : Vec<usize>,
    total  : usize,
}
impl SliceLayout {
    pub fn new(instance: &Instance) -> Self {
        let mut offsets = Vec::with_capacity(instance.links().len());
        let mut sizes   = Vec::with_capacity(instance.links().len());
        let mut total   = 0;
        for link in instance.links() {
            offsets.push(total);
            sizes.push(link.nb_slices());
            total += link.nb_slices();
        }
        SliceLayout { offsets, sizes, total }
    }
    #[inline]
    pub fn position(&self, link: usize, slice: usize) -> usize {
        self.offsets[link] + slice
    }
    pub fn nb_links(&self) -> usize {
        self.sizes.len()
    }
    pub fn nb_slices(&self, link: usize) -> usize {
        self.sizes[link]
    }
    /// The total number of (link, slice) pairs
    pub fn total(&self) -> usize {
        self.total
    }
    /// The slices of `link` that lie in the (inclusive) window [from, to].
    /// Bounds falling outside of the link spectrum are clipped.
    pub fn window(&self, link: usize, from: isize, to: isize) -> std::ops::Range<usize> {
        let lo = from.max(0) as usize;
        let hi = (to + 1).clamp(0, self.sizes[link] as isize) as usize;
        lo..hi.max(lo)
    }
}

// ----------------------------------------------------------------------------
// --- CONSTRAINT LAYOUT ------------------------------------------------------
// ----------------------------------------------------------------------------
/// Computes where each relaxed constraint is stored in the flat tables.
///
/// * The length constraints are indexed by demand.
/// * The first non-overlap family is indexed by (demand, class, link, slice).
/// * The second non-overlap family is indexed by (class pair, link, slice)
///   where only the pairs `w1 <= w2` are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintLayout {
    nb_demands: usize,
    classes   : LoadClasses,
    class_of  : Vec<usize>,
    slices    : SliceLayout,
    pairs     : Vec<(usize, usize)>,
    pairs_of  : Vec<Vec<usize>>,
}
impl ConstraintLayout {
    /// Creates the layout for the given demands of the round
    pub fn new(instance: &Instance, demands: &[Demand]) -> Self {
        let classes  = LoadClasses::from_demands(demands);
        let class_of = demands.iter()
            .map(|d| classes.class_of(d.load).unwrap_or_default())
            .collect();
        let w = classes.len();
        let mut pairs    = vec![];
        let mut pairs_of = vec![vec![]; w];
        for w1 in 0..w {
            for w2 in w1..w {
                let p = pairs.len();
                pairs.push((w1, w2));
                pairs_of[w1].push(p);
                if w1 != w2 {
                    pairs_of[w2].push(p);
                }
            }
        }
        ConstraintLayout { nb_demands: demands.len(), classes, class_of, slices: SliceLayout::new(instance), pairs, pairs_of }
    }
    pub fn nb_demands(&self) -> usize {
        self.nb_demands
    }
    pub fn classes(&self) -> &LoadClasses {
        &self.classes
    }
    pub fn nb_classes(&self) -> usize {
        self.classes.len()
    }
    /// The load class of the d-th demand of the round
    pub fn class_of_demand(&self, d: usize) -> usize {
        self.class_of[d]
    }
    pub fn slices(&self) -> &SliceLayout {
        &self.slices
    }
    pub fn nb_pairs(&self) -> usize {
        self.pairs.len()
    }
    /// The classes (w1 <= w2) of the given pair
    pub fn pair(&self, p: usize) -> (usize, usize) {
        self.pairs[p]
    }
    /// The pairs the given class is part of
    pub fn pairs_of(&self, class: usize) -> &[usize] {
        &self.pairs_of[class]
    }
    /// The index of the pair made of the two given classes
    pub fn pair_index(&self, w1: usize, w2: usize) -> usize {
        let (a, b) = if w1 <= w2 { (w1, w2) } else { (w2, w1) };
        let w = self.nb_classes();
        a * (2 * w - a + 1) / 2 + (b - a)
    }

    #[inline]
    pub fn overlap1_index(&self, demand: usize, class: usize, link: usize, slice: usize) -> usize {
        (demand * self.nb_classes() + class) * self.slices.total() + self.slices.position(link, slice)
    }
    #[inline]
    pub fn overlap2_index(&self, pair: usize, link: usize, slice: usize) -> usize {
        pair * self.slices.total() + self.slices.position(link, slice)
    }
    pub fn overlap1_len(&self) -> usize {
        self.nb_demands * self.nb_classes() * self.slices.total()
    }
    pub fn overlap2_len(&self) -> usize {
        self.nb_pairs() * self.slices.total()
    }
    /// The total number of relaxed constraints
    pub fn nb_constraints(&self) -> usize {
        self.nb_demands + self.overlap1_len() + self.overlap2_len()
    }
}

// ----------------------------------------------------------------------------
// --- CONSTRAINT VECTOR ------------------------------------------------------
// ----------------------------------------------------------------------------
/// A value for each relaxed constraint, grouped by family.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintVector {
    pub length  : Vec<f64>,
    pub overlap1: Vec<f64>,
    pub overlap2: Vec<f64>,
}
impl ConstraintVector {
    /// A vector with the same value for every constraint
    pub fn filled(layout: &ConstraintLayout, value: f64) -> Self {
        ConstraintVector {
            length  : vec![value; layout.nb_demands()],
            overlap1: vec![value; layout.overlap1_len()],
            overlap2: vec![value; layout.overlap2_len()],
        }
    }
    pub fn zeros(layout: &ConstraintLayout) -> Self {
        Self::filled(layout, 0.0)
    }
    pub fn len(&self) -> usize {
        self.length.len() + self.overlap1.len() + self.overlap2.len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Iterates over all the values, family after family
    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.length.iter().chain(self.overlap1.iter()).chain(self.overlap2.iter())
    }
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut f64> {
        self.length.iter_mut().chain(self.overlap1.iter_mut()).chain(self.overlap2.iter_mut())
    }
    pub fn sum(&self) -> f64 {
        self.iter().sum()
    }
    pub fn dot(&self, other: &ConstraintVector) -> f64 {
        self.iter().zip(other.iter()).map(|(a, b)| a * b).sum()
    }
    pub fn norm2(&self) -> f64 {
        self.dot(self)
    }
    /// self <- alpha * other + (1 - alpha) * self
    pub fn blend(&mut self, alpha: f64, other: &ConstraintVector) {
        for (x, y) in self.iter_mut().zip(other.iter()) {
            *x = alpha * y + (1.0 - alpha) * *x;
        }
    }
}


// ############################################################################
// #### TESTS #################################################################
// ############################################################################
