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

//! This module provides the builder that turns the physical topology into the
//! extended graph of each demand of the round.

use crate::{preprocess, Demand, ExtendedGraph, Instance, PreprocessingLevel};

/// Builds, preprocesses and contracts the extended graph of every demand.
///
/// # Example
/// ```
/// # use lagrsa::*;
/// let instance = Instance::new(3,
///     vec![PhysicalLink::new(0, 0, 1, 1.0, 2), PhysicalLink::new(1, 1, 2, 1.0, 2)],
///     vec![Demand::new(0, 0, 2, 1, 10.0)]).unwrap();
///
/// let graphs = ExtendedGraphBuilder::new(&instance)
///     .with_preprocessing(PreprocessingLevel::Full)
///     .build(&instance.pending_demands());
/// // two hops on each of the two slices
/// assert_eq!(4, graphs[0].nb_arcs());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ExtendedGraphBuilder<'a> {
    instance: &'a Instance,
    level   : PreprocessingLevel,
    epsilon : f64,
}
impl <'a> ExtendedGraphBuilder<'a> {
    pub fn new(instance: &'a Instance) -> Self {
        ExtendedGraphBuilder { instance, level: PreprocessingLevel::Full, epsilon: 1e-6 }
    }
    pub fn with_preprocessing(mut self, level: PreprocessingLevel) -> Self {
        self.level = level;
        self
    }
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Creates the raw extended graph of a demand: for each link and each
    /// free slice of that link, one arc in each direction.
    pub fn expand(&self, demand: &Demand) -> ExtendedGraph {
        let mut graph = ExtendedGraph::new(demand.clone());
        for link in self.instance.links() {
            for slice in (0..link.nb_slices()).filter(|s| link.is_free(*s)) {
                let u = graph.node_at(link.source, slice);
                let v = graph.node_at(link.target, slice);
                graph.add_arc(u, v, link.id, slice, link.length);
                graph.add_arc(v, u, link.id, slice, link.length);
            }
        }
        graph
    }

    /// Builds the final (preprocessed and contracted) graph of one demand
    pub fn build_one(&self, demand: &Demand) -> ExtendedGraph {
        let mut graph = self.expand(demand);
        let initial   = graph.nb_arcs();
        let stats     = preprocess(&mut graph, self.instance, self.level, self.epsilon);
        graph.contract();
        log::debug!("demand {}: {} arcs, {} after preprocessing ({} non routable, {} path existence, {} length)",
            demand.id, initial, graph.nb_arcs(), stats.non_routable, stats.path_existence, stats.length);
        graph
    }

    /// Builds the final graphs of all the given demands (in the same order)
    pub fn build(&self, demands: &[Demand]) -> Vec<ExtendedGraph> {
        let graphs: Vec<ExtendedGraph> = demands.iter().map(|d| self.build_one(d)).collect();
        log::info!("extended graphs built for {} demands ({} arcs)",
            graphs.len(), graphs.iter().map(|g| g.nb_arcs()).sum::<usize>());
        graphs
    }
}


// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_builder {
    use crate::*;

    fn path(second_link_occupied: &[usize]) -> Instance {
        Instance::new(3, vec![
            PhysicalLink::new(0, 0, 1, 1.0, 1),
            PhysicalLink::new(1, 1, 2, 1.0, 1).with_occupied(second_link_occupied),
        ], vec![Demand::new(0, 0, 2, 1, 10.0)]).unwrap()
    }

    #[test]
    fn expansion_creates_two_arcs_per_free_slice() {
        let instance = Instance::new(2, vec![
            PhysicalLink::new(0, 0, 1, 1.0, 4).with_occupied(&[1]),
        ], vec![]).unwrap();
        let g = ExtendedGraphBuilder::new(&instance).expand(&Demand::new(0, 0, 1, 1, 10.0));
        assert_eq!(6, g.nb_arcs());
        assert_eq!(None, g.find(0, 1));
    }
    #[test]
    fn built_graph_of_a_path_has_one_arc_per_hop() {
        let instance = path(&[]);
        let g = ExtendedGraphBuilder::new(&instance).build_one(&instance.demands()[0]);
        assert!(g.is_contracted());
        assert_eq!(2, g.nb_arcs());
        let src = g.source().unwrap();
        let tgt = g.target().unwrap();
        assert_eq!(1, g.outbound(src).count());
        assert_eq!(1, g.inbound(tgt).count());
    }
    #[test]
    fn built_graph_is_empty_when_a_link_is_full() {
        let instance = path(&[0]);
        let g = ExtendedGraphBuilder::new(&instance).build_one(&instance.demands()[0]);
        assert_eq!(0, g.nb_arcs());
        assert_eq!(None, g.source());
        assert_eq!(None, g.target());
    }
    #[test]
    fn every_arc_is_the_end_of_a_free_window() {
        let instance = Instance::new(3, vec![
            PhysicalLink::new(0, 0, 1, 1.0, 6).with_occupied(&[0, 3]),
            PhysicalLink::new(1, 1, 2, 1.0, 6).with_occupied(&[5]),
        ], vec![Demand::new(0, 0, 2, 2, 10.0)]).unwrap();
        let g = ExtendedGraphBuilder::new(&instance)
            .with_preprocessing(PreprocessingLevel::None)
            .build_one(&instance.demands()[0]);
        assert!(g.nb_arcs() > 0);
        for a in g.arcs() {
            let arc = g.arc(a);
            assert!(instance.link(arc.link).is_window_free(arc.slice, 2));
        }
    }
    #[test]
    fn build_keeps_the_order_of_demands() {
        let instance = Instance::new(3, vec![
            PhysicalLink::new(0, 0, 1, 1.0, 2),
            PhysicalLink::new(1, 1, 2, 1.0, 2),
        ], vec![Demand::new(7, 0, 2, 1, 10.0), Demand::new(3, 1, 2, 2, 10.0)]).unwrap();
        let graphs = ExtendedGraphBuilder::new(&instance).build(&instance.pending_demands());
        assert_eq!(7, graphs[0].demand().id);
        assert_eq!(3, graphs[1].demand().id);
        // the second demand needs both slices: one window on one link
        assert_eq!(1, graphs[1].nb_arcs());
    }
}
