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

//! This module provides the lagrangian cost model: it owns the multipliers
//! of all the relaxed constraints and derives, for every arc of every
//! extended graph, the cost this arc has in the lagrangian subproblem.

use crate::{ArcId, ConstraintLayout, ConstraintVector, Demand, ExtendedGraph, Instance, ObjectiveMetric};

/// Computes the base cost coefficient of an arc: the contribution of that arc
/// to the objective of the original problem. It only depends on the static
/// attributes of the arc.
pub fn base_coefficient(metric: ObjectiveMetric, instance: &Instance, graph: &ExtendedGraph, arc: ArcId) -> f64 {
    let a = graph.arc(arc);
    match metric {
        ObjectiveMetric::Zero => 0.0,
        ObjectiveMetric::SliceOrder => {
            if Some(a.tail) == graph.source() {
                (instance.links().len() * (a.slice + 1)) as f64
            } else {
                1.0
            }
        },
        ObjectiveMetric::MaxUsedSlicePerLink => {
            let used = instance.link(a.link).max_used_slice().unwrap_or(0);
            used.max(a.slice) as f64
        },
        ObjectiveMetric::HopCount   => 1.0,
        ObjectiveMetric::PathLength => a.length,
    }
}

/// The lagrangian cost model of a round.
///
/// The cost of an arc `a` of demand `d` (link `e`, last slice `s`) is its
/// base coefficient, plus the length multiplier of `d` times the arc length,
/// plus the multipliers of every non-overlap constraint in which the arc
/// variable appears with a unit coefficient.
#[derive(Debug, Clone)]
pub struct LagrangianCostModel {
    layout      : ConstraintLayout,
    demands     : Vec<Demand>,
    coefficients: Vec<Vec<f64>>,
    costs       : Vec<Vec<f64>>,
    multipliers : ConstraintVector,
    /// column[w][pos] = sum over all demands d of overlap1[d][w][pos]
    column      : Vec<f64>,
}
impl LagrangianCostModel {
    /// Creates the cost model of the given (contracted) graphs with all the
    /// multipliers set to `initial_multiplier`. The costs are up to date
    /// upon return.
    pub fn new(instance: &Instance, graphs: &[ExtendedGraph], metric: ObjectiveMetric, initial_multiplier: f64) -> Self {
        let demands: Vec<Demand> = graphs.iter().map(|g| g.demand().clone()).collect();
        let layout  = ConstraintLayout::new(instance, &demands);
        let coefficients: Vec<Vec<f64>> = graphs.iter()
            .map(|g| g.arcs().map(|a| base_coefficient(metric, instance, g, a)).collect())
            .collect();
        let costs       = coefficients.clone();
        let multipliers = ConstraintVector::filled(&layout, initial_multiplier);
        let column      = vec![0.0; layout.nb_classes() * layout.slices().total()];

        let mut model = LagrangianCostModel { layout, demands, coefficients, costs, multipliers, column };
        model.update_costs(graphs);
        model
    }

    pub fn layout(&self) -> &ConstraintLayout {
        &self.layout
    }
    pub fn demands(&self) -> &[Demand] {
        &self.demands
    }
    pub fn multipliers(&self) -> &ConstraintVector {
        &self.multipliers
    }
    /// Replaces the multipliers. The costs must be recomputed with
    /// `update_costs` before they are used again.
    pub fn set_multipliers(&mut self, multipliers: ConstraintVector) {
        self.multipliers = multipliers;
    }
    /// The base coefficient of every arc of the d-th demand (by dense index)
    pub fn coefficients(&self, d: usize) -> &[f64] {
        &self.coefficients[d]
    }
    /// The current lagrangian cost of every arc of the d-th demand
    pub fn costs(&self, d: usize) -> &[f64] {
        &self.costs[d]
    }

    /// The constant term of the lagrangian function: the multipliers weighted
    /// by the right hand side of their constraint.
    pub fn dual_correction(&self) -> f64 {
        let length: f64 = self.multipliers.length.iter().zip(self.demands.iter())
            .map(|(u, d)| u * d.max_length)
            .sum();
        let overlap1: f64 = self.multipliers.overlap1.iter().sum();
        let overlap2: f64 = self.multipliers.overlap2.iter().sum();
        length + overlap1 + overlap2
    }

    /// A value that is larger than the cost of any routing: the sum of the
    /// coefficients of all arcs of all graphs, plus one.
    pub fn initial_upper_bound(&self) -> f64 {
        self.coefficients.iter().flat_map(|c| c.iter()).sum::<f64>() + 1.0
    }

    /// Recomputes the lagrangian cost of every arc from the current
    /// multipliers.
    pub fn update_costs(&mut self, graphs: &[ExtendedGraph]) {
        let total   = self.layout.slices().total();
        let classes = self.layout.nb_classes();

        self.column.iter_mut().for_each(|x| *x = 0.0);
        for d in 0..self.layout.nb_demands() {
            for w in 0..classes {
                let from = (d * classes + w) * total;
                let row  = &self.multipliers.overlap1[from..from + total];
                for (acc, m) in self.column[w * total..(w + 1) * total].iter_mut().zip(row.iter()) {
                    *acc += m;
                }
            }
        }

        for (d, graph) in graphs.iter().enumerate() {
            let load   = self.demands[d].load as isize;
            let class  = self.layout.class_of_demand(d);
            let length_mult = self.multipliers.length[d];

            for a in graph.arcs() {
                let arc  = graph.arc(a);
                let pos  = self.layout.slices().position(arc.link, arc.slice);
                let last = arc.slice as isize;
                let mut cost = self.coefficients[d][a.id()] + length_mult * arc.length;

                // as 'other' demand in the constraints of the other demands
                for w in 0..=class {
                    let own = self.multipliers.overlap1[self.layout.overlap1_index(d, w, arc.link, arc.slice)];
                    cost += (self.column[w * total + pos] - own).max(0.0);
                }
                // as 'own' demand in its own constraints
                for w in 0..classes {
                    let width = self.layout.classes().load(w) as isize;
                    for s in self.layout.slices().window(arc.link, last - load + 1, last + width - 1) {
                        cost += self.multipliers.overlap1[self.layout.overlap1_index(d, w, arc.link, s)];
                    }
                }
                // in the aggregated constraints of its class pairs
                for p in self.layout.pairs_of(class).iter().copied() {
                    for s in self.layout.slices().window(arc.link, last - load + 1, last) {
                        cost += self.multipliers.overlap2[self.layout.overlap2_index(p, arc.link, s)];
                    }
                }

                self.costs[d][a.id()] = cost;
            }
        }
    }
}


// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_cost_model {
    use crate::*;

    /// Two demands 0 -> 1 on a single link with two slices
    fn setup(loads: [usize; 2]) -> (Instance, Vec<ExtendedGraph>) {
        let instance = Instance::new(2, vec![PhysicalLink::new(0, 0, 1, 2.0, 2)], vec![
            Demand::new(0, 0, 1, loads[0], 10.0),
            Demand::new(1, 0, 1, loads[1], 10.0),
        ]).unwrap();
        let graphs = ExtendedGraphBuilder::new(&instance).build(&instance.pending_demands());
        (instance, graphs)
    }

    fn arc_at(graph: &ExtendedGraph, slice: usize) -> ArcId {
        graph.arcs().find(|a| graph.arc(*a).slice == slice).unwrap()
    }

    #[test]
    fn costs_equal_coefficients_when_multipliers_are_null() {
        let (instance, graphs) = setup([1, 1]);
        let model = LagrangianCostModel::new(&instance, &graphs, ObjectiveMetric::SliceOrder, 0.0);
        assert_eq!(model.coefficients(0), model.costs(0));
        // arcs leave the source: nb_links * (slice + 1)
        let a1 = arc_at(&graphs[0], 1);
        assert_eq!(2.0, model.costs(0)[a1.id()]);
    }
    #[test]
    fn objective_metrics_give_their_coefficients() {
        let (instance, graphs) = setup([1, 1]);
        let a = arc_at(&graphs[0], 1);
        assert_eq!(0.0, base_coefficient(ObjectiveMetric::Zero, &instance, &graphs[0], a));
        assert_eq!(1.0, base_coefficient(ObjectiveMetric::HopCount, &instance, &graphs[0], a));
        assert_eq!(2.0, base_coefficient(ObjectiveMetric::PathLength, &instance, &graphs[0], a));
        assert_eq!(1.0, base_coefficient(ObjectiveMetric::MaxUsedSlicePerLink, &instance, &graphs[0], a));
    }
    #[test]
    fn length_multiplier_is_weighted_by_the_arc_length() {
        let (instance, graphs) = setup([1, 1]);
        let mut model = LagrangianCostModel::new(&instance, &graphs, ObjectiveMetric::Zero, 0.0);
        let mut m = model.multipliers().clone();
        m.length[0] = 0.5;
        model.set_multipliers(m);
        model.update_costs(&graphs);
        assert!(model.costs(0).iter().all(|c| (*c - 1.0).abs() < 1e-12));
        assert!(model.costs(1).iter().all(|c| *c == 0.0));
    }
    #[test]
    fn overlap1_multiplier_of_a_demand_charges_both_roles() {
        let (instance, graphs) = setup([1, 1]);
        let mut model = LagrangianCostModel::new(&instance, &graphs, ObjectiveMetric::Zero, 0.0);
        let idx = model.layout().overlap1_index(0, 0, 0, 1);
        let mut m = model.multipliers().clone();
        m.overlap1[idx] = 1.0;
        model.set_multipliers(m);
        model.update_costs(&graphs);
        // demand 0 (own role) pays on the window [1-1+1, 1+1-1] = {1}
        assert_eq!(1.0, model.costs(0)[arc_at(&graphs[0], 1).id()]);
        assert_eq!(0.0, model.costs(0)[arc_at(&graphs[0], 0).id()]);
        // demand 1 (other role) pays on slice 1 only
        assert_eq!(1.0, model.costs(1)[arc_at(&graphs[1], 1).id()]);
        assert_eq!(0.0, model.costs(1)[arc_at(&graphs[1], 0).id()]);
    }
    #[test]
    fn overlap1_other_role_only_concerns_large_enough_demands() {
        let (instance, graphs) = setup([1, 2]);
        let mut model = LagrangianCostModel::new(&instance, &graphs, ObjectiveMetric::Zero, 0.0);
        // constraint of demand 1 for class 1 (load 2): demand 0 (load 1) is not concerned
        let idx = model.layout().overlap1_index(1, 1, 0, 1);
        let mut m = model.multipliers().clone();
        m.overlap1[idx] = 1.0;
        model.set_multipliers(m);
        model.update_costs(&graphs);
        assert!(model.costs(0).iter().all(|c| *c == 0.0));
        // demand 1 is concerned as own demand
        assert_eq!(1.0, model.costs(1)[arc_at(&graphs[1], 1).id()]);
    }
    #[test]
    fn overlap2_multiplier_charges_every_window_covering_the_slice() {
        let (instance, graphs) = setup([1, 2]);
        let mut model = LagrangianCostModel::new(&instance, &graphs, ObjectiveMetric::Zero, 0.0);
        let pair = model.layout().pair_index(0, 1);
        let idx  = model.layout().overlap2_index(pair, 0, 0);
        let mut m = model.multipliers().clone();
        m.overlap2[idx] = 1.0;
        model.set_multipliers(m);
        model.update_costs(&graphs);
        assert_eq!(1.0, model.costs(0)[arc_at(&graphs[0], 0).id()]);
        assert_eq!(0.0, model.costs(0)[arc_at(&graphs[0], 1).id()]);
        // the window [0, 1] of demand 1 covers slice 0
        assert_eq!(1.0, model.costs(1)[arc_at(&graphs[1], 1).id()]);
    }
    #[test]
    fn dual_correction_weights_the_right_hand_sides() {
        let (instance, graphs) = setup([1, 1]);
        let model = LagrangianCostModel::new(&instance, &graphs, ObjectiveMetric::Zero, 1.0);
        let layout = model.layout();
        let expected = 2.0 * 10.0 + layout.overlap1_len() as f64 + layout.overlap2_len() as f64;
        assert!((model.dual_correction() - expected).abs() < 1e-9);
    }
    #[test]
    fn initial_upper_bound_exceeds_every_routing() {
        let (instance, graphs) = setup([1, 1]);
        let model = LagrangianCostModel::new(&instance, &graphs, ObjectiveMetric::SliceOrder, 0.0);
        // two graphs with arcs of coefficient 1 and 2
        assert_eq!(7.0, model.initial_upper_bound());
    }
}
