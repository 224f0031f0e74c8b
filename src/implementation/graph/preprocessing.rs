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

//! This module provides the reductions that are applied to an extended graph
//! before it gets contracted. Each of them only ever removes arcs that cannot
//! belong to any feasible path of the demand.

use std::collections::BTreeMap;

use crate::{dijkstra, ArcId, Direction, ExtendedGraph, Instance, PreprocessingLevel};

/// The number of arcs removed by each reduction
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct PreprocessingStats {
    pub non_routable : usize,
    pub path_existence: usize,
    pub length: usize,
}
impl PreprocessingStats {
    pub fn total(&self) -> usize {
        self.non_routable + self.path_existence + self.length
    }
}

/// Groups the live arcs of the graph by slice
fn arcs_by_slice(graph: &ExtendedGraph) -> BTreeMap<usize, Vec<ArcId>> {
    let mut layers: BTreeMap<usize, Vec<ArcId>> = BTreeMap::new();
    for arc in graph.arcs() {
        layers.entry(graph.arc(arc).slice).or_default().push(arc);
    }
    layers
}

/// Removes the arcs that can never be used by the demand: those whose window
/// does not fit in the free spectrum of the link, those leaving the target and
/// those entering the source. Returns the number of erased arcs.
pub fn erase_non_routable_arcs(graph: &mut ExtendedGraph, instance: &Instance) -> usize {
    let demand = graph.demand().clone();
    let doomed: Vec<ArcId> = graph.arcs()
        .filter(|a| {
            let arc = graph.arc(*a);
            !instance.link(arc.link).is_window_free(arc.slice, demand.load)
                || graph.node(arc.tail).label == demand.target
                || graph.node(arc.head).label == demand.source
        })
        .collect();

    doomed.into_iter().filter(|a| graph.erase(*a)).count()
}

/// Removes all the arcs of the slices where the demand source or target node
/// does not exist (anymore). It loops until a full pass removes nothing and
/// returns the number of erased arcs.
pub fn path_existence_preprocessing(graph: &mut ExtendedGraph) -> usize {
    let source = graph.demand().source;
    let target = graph.demand().target;
    let mut erased = 0;
    loop {
        let mut pass = 0;
        for (slice, arcs) in arcs_by_slice(graph) {
            let exists = |label| graph.find(label, slice).map_or(false, |n| graph.has_live_arc(n));
            if !exists(source) || !exists(target) {
                pass += arcs.into_iter().filter(|a| graph.erase(*a)).count();
            }
        }
        erased += pass;
        if pass == 0 {
            return erased;
        }
    }
}

/// Removes every arc that cannot be part of a path whose length fits in the
/// demand reach. That is, an arc is removed when the shortest path from the
/// source to its tail, plus its own length, plus the shortest path from its
/// head to the target exceeds the max length of the demand. Returns the
/// number of erased arcs.
pub fn length_preprocessing(graph: &mut ExtendedGraph, epsilon: f64) -> usize {
    let source = graph.demand().source;
    let target = graph.demand().target;
    let max_length = graph.demand().max_length;

    let mut doomed = vec![];
    for (slice, arcs) in arcs_by_slice(graph) {
        let (src, tgt) = match (graph.find(source, slice), graph.find(target, slice)) {
            (Some(s), Some(t)) => (s, t),
            _ => {
                doomed.extend(arcs);
                continue;
            }
        };
        let from_src = dijkstra(graph, src, Direction::Forward,  |a| graph.arc(a).length, None);
        let to_tgt   = dijkstra(graph, tgt, Direction::Backward, |a| graph.arc(a).length, None);

        for a in arcs {
            let arc = graph.arc(a);
            let keep = match (from_src.distance(arc.tail), to_tgt.distance(arc.head)) {
                (Some(before), Some(after)) => before + arc.length + after <= max_length + epsilon,
                _ => false,
            };
            if !keep {
                doomed.push(a);
            }
        }
    }
    doomed.into_iter().filter(|a| graph.erase(*a)).count()
}

/// Applies the reductions corresponding to the given preprocessing level
pub fn preprocess(graph: &mut ExtendedGraph, instance: &Instance, level: PreprocessingLevel, epsilon: f64) -> PreprocessingStats {
    let mut stats = PreprocessingStats { non_routable: erase_non_routable_arcs(graph, instance), ..Default::default() };
    match level {
        PreprocessingLevel::None => {},
        PreprocessingLevel::Partial => {
            stats.path_existence += path_existence_preprocessing(graph);
            stats.length         += length_preprocessing(graph, epsilon);
        },
        PreprocessingLevel::Full => loop {
            stats.path_existence += path_existence_preprocessing(graph);
            let removed = length_preprocessing(graph, epsilon);
            stats.length += removed;
            if removed == 0 {
                break;
            }
        },
    }
    stats
}


// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_preprocessing {
    use crate::*;

    /// 0 -(1.0)- 1 -(1.0)- 2 with a shortcut 0 -(5.0)- 2
    fn triangle(slices: usize, occupied_on_second: &[usize]) -> Instance {
        Instance::new(3, vec![
            PhysicalLink::new(0, 0, 1, 1.0, slices),
            PhysicalLink::new(1, 1, 2, 1.0, slices).with_occupied(occupied_on_second),
            PhysicalLink::new(2, 0, 2, 5.0, slices),
        ], vec![]).unwrap()
    }

    fn expand(instance: &Instance, demand: Demand) -> ExtendedGraph {
        ExtendedGraphBuilder::new(instance).expand(&demand)
    }

    #[test]
    fn non_routable_arcs_exclude_those_entering_the_source_or_leaving_the_target() {
        let instance = triangle(1, &[]);
        let mut g = expand(&instance, Demand::new(0, 0, 2, 1, 100.0));
        assert_eq!(6, g.nb_arcs());
        let erased = erase_non_routable_arcs(&mut g, &instance);
        // 1->0, 2->1, 2->0
        assert_eq!(3, erased);
        for a in g.arcs() {
            let arc = g.arc(a);
            assert_ne!(0, g.node(arc.head).label);
            assert_ne!(2, g.node(arc.tail).label);
        }
    }
    #[test]
    fn non_routable_arcs_exclude_windows_that_do_not_fit() {
        let instance = triangle(3, &[1]);
        let mut g = expand(&instance, Demand::new(0, 0, 2, 2, 100.0));
        erase_non_routable_arcs(&mut g, &instance);
        for a in g.arcs() {
            let arc = g.arc(a);
            assert!(instance.link(arc.link).is_window_free(arc.slice, 2));
            assert!(arc.slice >= 1);
        }
    }
    #[test]
    fn path_existence_removes_slices_without_target() {
        // the second link is occupied on slice 0
        let instance = Instance::new(3, vec![
            PhysicalLink::new(0, 0, 1, 1.0, 2),
            PhysicalLink::new(1, 1, 2, 1.0, 2).with_occupied(&[0]),
        ], vec![]).unwrap();
        let mut g = expand(&instance, Demand::new(0, 0, 2, 1, 100.0));
        erase_non_routable_arcs(&mut g, &instance);
        let erased = path_existence_preprocessing(&mut g);
        assert_eq!(1, erased);
        assert!(g.arcs().all(|a| g.arc(a).slice == 1));
    }
    #[test]
    fn length_preprocessing_removes_arcs_of_too_long_paths() {
        let instance = triangle(1, &[]);
        let mut g = expand(&instance, Demand::new(0, 0, 2, 1, 3.0));
        erase_non_routable_arcs(&mut g, &instance);
        let erased = length_preprocessing(&mut g, 1e-6);
        // the shortcut (length 5) exceeds the reach
        assert_eq!(1, erased);
        assert!(g.arcs().all(|a| g.arc(a).link != 2));
    }
    #[test]
    fn length_preprocessing_removes_arcs_unreachable_from_the_source() {
        // the link 3 - 4 is disconnected from the rest of the network
        let instance = Instance::new(5, vec![
            PhysicalLink::new(0, 0, 1, 1.0, 1),
            PhysicalLink::new(1, 1, 2, 1.0, 1),
            PhysicalLink::new(2, 3, 4, 1.0, 1),
        ], vec![]).unwrap();
        let mut g = expand(&instance, Demand::new(0, 0, 2, 1, 100.0));
        erase_non_routable_arcs(&mut g, &instance);
        assert_eq!(2, length_preprocessing(&mut g, 1e-6));
        assert_eq!(2, g.nb_arcs());
        assert!(g.arcs().all(|a| g.arc(a).link != 2));
    }
    #[test]
    fn full_preprocessing_is_idempotent() {
        let instance = triangle(4, &[0, 2]);
        let demand = Demand::new(0, 0, 2, 1, 3.0);
        let mut g = expand(&instance, demand);
        preprocess(&mut g, &instance, PreprocessingLevel::Full, 1e-6);
        let before: Vec<ArcId> = g.arcs().collect();
        let again = preprocess(&mut g, &instance, PreprocessingLevel::Full, 1e-6);
        let after: Vec<ArcId> = g.arcs().collect();
        assert_eq!(0, again.total());
        assert_eq!(before, after);
    }
    #[test]
    fn no_preprocessing_only_removes_non_routable_arcs() {
        let instance = triangle(1, &[]);
        let mut g = expand(&instance, Demand::new(0, 0, 2, 1, 3.0));
        let stats = preprocess(&mut g, &instance, PreprocessingLevel::None, 1e-6);
        assert_eq!(3, stats.non_routable);
        assert_eq!(0, stats.path_existence + stats.length);
        assert_eq!(3, g.nb_arcs());
    }
}
