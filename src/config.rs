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

//! This module defines the knobs that drive a lagrangian solver: which dual
//! ascent method to use, which objective to optimize, how aggressively the
//! extended graphs are preprocessed and the numeric parameters of the
//! subgradient and volume algorithms.

use std::str::FromStr;

use derive_builder::Builder;

use crate::Error;

/// The dual ascent method used to solve the lagrangian dual
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum LagMethod {
    /// The classic projected subgradient method (Polyak steps)
    Subgradient,
    /// Barahona and Anbil's volume algorithm
    Volume,
}
impl FromStr for LagMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "subgradient" => Ok(LagMethod::Subgradient),
            "1" | "volume"      => Ok(LagMethod::Volume),
            other => Err(Error::ConfigurationInvalid(format!("unknown lagrangian method '{other}'"))),
        }
    }
}

/// The objective metric that gives every arc of an extended graph its base
/// cost coefficient.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ObjectiveMetric {
    /// Pure feasibility: every arc is free (`0`)
    Zero,
    /// Minimize the slices used at the source (`1`): arcs leaving the source
    /// cost `nb_links * (slice + 1)`, all the others cost 1
    SliceOrder,
    /// Minimize the max used slice of each link (`1p`)
    MaxUsedSlicePerLink,
    /// Minimize the number of hops (`2`)
    HopCount,
    /// Minimize the physical length of the paths (`4`)
    PathLength,
}
impl FromStr for ObjectiveMetric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0"  | "zero"                    => Ok(ObjectiveMetric::Zero),
            "1"  | "slice_order"             => Ok(ObjectiveMetric::SliceOrder),
            "1p" | "max_used_slice_per_link" => Ok(ObjectiveMetric::MaxUsedSlicePerLink),
            "2"  | "hops"                    => Ok(ObjectiveMetric::HopCount),
            "4"  | "path_length"             => Ok(ObjectiveMetric::PathLength),
            other => Err(Error::ConfigurationInvalid(format!("unknown objective metric '{other}'"))),
        }
    }
}

/// How much effort is put in the reduction of the extended graphs before the
/// dual ascent starts.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PreprocessingLevel {
    /// Only the arcs that can never be routed are removed
    None,
    /// One pass of path existence and length preprocessing
    Partial,
    /// Path existence and length preprocessing up to a fixpoint
    Full,
}
impl FromStr for PreprocessingLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "none"    => Ok(PreprocessingLevel::None),
            "1" | "partial" => Ok(PreprocessingLevel::Partial),
            "2" | "full"    => Ok(PreprocessingLevel::Full),
            other => Err(Error::ConfigurationInvalid(format!("unknown preprocessing level '{other}'"))),
        }
    }
}

// ----------------------------------------------------------------------------
// --- VOLUME PARAMETERS ------------------------------------------------------
// ----------------------------------------------------------------------------
/// The parameters that are specific to the volume algorithm.
///
/// # Example
/// ```
/// # use lagrsa::*;
/// let params = VolumeParamsBuilder::default()
///     .red_limit(10)
///     .build()
///     .unwrap();
/// assert_eq!(10, params.red_limit);
/// assert_eq!(2,  params.yellow_limit);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Builder)]
#[builder(default, build_fn(error = "Error"))]
pub struct VolumeParams {
    /// Number of consecutive red iterations before lambda shrinks
    pub red_limit: usize,
    /// Number of consecutive yellow iterations before lambda grows
    pub yellow_limit: usize,
    /// Factor applied to lambda when it grows
    pub lambda_grow: f64,
    /// Factor applied to lambda when it shrinks
    pub lambda_shrink: f64,
    /// Lambda never grows above this value
    pub lambda_max: f64,
    /// Lambda only shrinks while it is at least this large
    pub lambda_min_for_shrink: f64,
    /// Initial upper bound on the convex combination factor alpha
    pub max_alpha: f64,
    /// Period (in iterations) of the max alpha reconsideration
    pub alpha_check_interval: usize,
    /// Threshold on the mean squared module of the smoothed direction
    pub min_module: f64,
    /// Max relative gap between the primal estimate cost and the lower bound
    /// for the small module stop to trigger
    pub min_relative_gap: f64,
    /// First iteration at which the ascent is checked
    pub ascent_first_check: usize,
    /// Period (in iterations) of the ascent checks
    pub ascent_check_interval: usize,
    /// Minimum relative lb improvement expected between two ascent checks
    pub min_relative_ascent: f64,
}
impl Default for VolumeParams {
    fn default() -> Self {
        VolumeParams {
            red_limit            : 20,
            yellow_limit         : 2,
            lambda_grow          : 1.1,
            lambda_shrink        : 0.67,
            lambda_max           : 2.0,
            lambda_min_for_shrink: 5e-4,
            max_alpha            : 0.1,
            alpha_check_interval : 100,
            min_module           : 0.01,
            min_relative_gap     : 0.001,
            ascent_first_check   : 500,
            ascent_check_interval: 500,
            min_relative_ascent  : 0.001,
        }
    }
}
impl VolumeParams {
    fn validate(&self) -> Result<(), Error> {
        if self.red_limit == 0 || self.yellow_limit == 0 {
            return Err(Error::ConfigurationInvalid("volume color limits must be positive".to_string()));
        }
        if !(self.lambda_grow >= 1.0 && self.lambda_shrink > 0.0 && self.lambda_shrink < 1.0) {
            return Err(Error::ConfigurationInvalid("volume lambda factors are out of range".to_string()));
        }
        if !(self.max_alpha > 0.0 && self.max_alpha <= 1.0) {
            return Err(Error::ConfigurationInvalid(format!("max alpha {} is not in ]0, 1]", self.max_alpha)));
        }
        if self.alpha_check_interval == 0 || self.ascent_check_interval == 0 {
            return Err(Error::ConfigurationInvalid("volume check intervals must be positive".to_string()));
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// --- SOLVER CONFIGURATION ---------------------------------------------------
// ----------------------------------------------------------------------------
/// The complete configuration of a lagrangian solver. It is meant to be
/// assembled with its builder which validates the parameters.
///
/// # Example
/// ```
/// # use lagrsa::*;
/// let config = SolverConfigBuilder::default()
///     .method(LagMethod::Volume)
///     .objective("4".parse().unwrap())
///     .max_iterations(200)
///     .build()
///     .unwrap();
/// assert_eq!(ObjectiveMetric::PathLength, config.objective);
///
/// let invalid = SolverConfigBuilder::default().initial_lambda(-1.0).build();
/// assert!(invalid.is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(default, build_fn(validate = "Self::validate", error = "Error"))]
pub struct SolverConfig {
    /// The dual ascent method
    pub method: LagMethod,
    /// The objective metric
    pub objective: ObjectiveMetric,
    /// The preprocessing applied to the extended graphs
    pub preprocessing: PreprocessingLevel,
    /// The initial value of the lambda parameter
    pub initial_lambda: f64,
    /// The initial value of every lagrangian multiplier
    pub initial_multiplier: f64,
    /// The maximum number of iterations of the dual ascent
    pub max_iterations: usize,
    /// Number of non improving iterations before lambda gets halved
    pub iterations_without_improvement_threshold: usize,
    /// Lambda is no longer halved once it has fallen below this floor
    pub min_lambda: f64,
    /// Below this step size, the subgradient method stops
    pub min_step_size: f64,
    /// Whether the cumulative no-improvement stop criterion is enabled
    pub alternative_stop_enabled: bool,
    /// The alternative stop triggers after `factor * threshold` cumulative
    /// non improving iterations
    pub alternative_stop_factor: usize,
    /// The primal heuristic runs on the first iteration and on every
    /// multiple of this interval
    pub heuristic_interval: usize,
    /// Number of threads used to solve the shortest path subproblems.
    /// Zero means as many threads as there are hardware threads.
    pub nb_threads: usize,
    /// Numeric tolerance of all comparisons
    pub epsilon: f64,
    /// The parameters that are specific to the volume algorithm
    pub volume: VolumeParams,
}
impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            method                                  : LagMethod::Subgradient,
            objective                               : ObjectiveMetric::SliceOrder,
            preprocessing                           : PreprocessingLevel::Full,
            initial_lambda                          : 2.0,
            initial_multiplier                      : 0.0,
            max_iterations                          : 1000,
            iterations_without_improvement_threshold: 10,
            min_lambda                              : 1e-2,
            min_step_size                           : 1e-5,
            alternative_stop_enabled                : false,
            alternative_stop_factor                 : 3,
            heuristic_interval                      : 30,
            nb_threads                              : 1,
            epsilon                                 : 1e-6,
            volume                                  : VolumeParams::default(),
        }
    }
}
impl SolverConfigBuilder {
    fn validate(&self) -> Result<(), Error> {
        if let Some(lambda) = self.initial_lambda {
            if !(lambda.is_finite() && lambda > 0.0) {
                return Err(Error::ConfigurationInvalid(format!("initial lambda {lambda} must be positive")));
            }
        }
        if let Some(m) = self.initial_multiplier {
            if !(m.is_finite() && m >= 0.0) {
                return Err(Error::ConfigurationInvalid(format!("initial multiplier {m} must be non negative")));
            }
        }
        if self.max_iterations == Some(0) {
            return Err(Error::ConfigurationInvalid("at least one iteration is required".to_string()));
        }
        if self.iterations_without_improvement_threshold == Some(0) {
            return Err(Error::ConfigurationInvalid("the no-improvement threshold must be positive".to_string()));
        }
        if let Some(floor) = self.min_lambda {
            if !(floor.is_finite() && floor >= 0.0) {
                return Err(Error::ConfigurationInvalid(format!("min lambda {floor} must be non negative")));
            }
        }
        if let Some(step) = self.min_step_size {
            if !(step.is_finite() && step >= 0.0) {
                return Err(Error::ConfigurationInvalid(format!("min step size {step} must be non negative")));
            }
        }
        if self.alternative_stop_factor == Some(0) {
            return Err(Error::ConfigurationInvalid("the alternative stop factor must be positive".to_string()));
        }
        if self.heuristic_interval == Some(0) {
            return Err(Error::ConfigurationInvalid("the heuristic interval must be positive".to_string()));
        }
        if let Some(eps) = self.epsilon {
            if !(eps.is_finite() && eps > 0.0) {
                return Err(Error::ConfigurationInvalid(format!("epsilon {eps} must be positive")));
            }
        }
        if let Some(volume) = self.volume.as_ref() {
            volume.validate()?;
        }
        Ok(())
    }
}


// ############################################################################
// #### TESTS #################################################################
// ############################################################################

#[cfg(test)]
mod test_config {
    use crate::*;

    #[test]
    fn objective_metrics_are_parsed_from_their_codes() {
        assert_eq!(ObjectiveMetric::Zero,                "0".parse().unwrap());
        assert_eq!(ObjectiveMetric::SliceOrder,          "1".parse().unwrap());
        assert_eq!(ObjectiveMetric::MaxUsedSlicePerLink, "1p".parse().unwrap());
        assert_eq!(ObjectiveMetric::HopCount,            "2".parse().unwrap());
        assert_eq!(ObjectiveMetric::PathLength,          "4".parse().unwrap());
    }
    #[test]
    fn unknown_objective_metric_is_a_configuration_error() {
        let res: Result<ObjectiveMetric, _> = "42".parse();
        assert!(matches!(res, Err(Error::ConfigurationInvalid(_))));
    }
    #[test]
    fn methods_are_parsed_by_name_or_code() {
        assert_eq!(LagMethod::Volume,      "volume".parse().unwrap());
        assert_eq!(LagMethod::Subgradient, "0".parse().unwrap());
        assert!("simplex".parse::<LagMethod>().is_err());
    }
    #[test]
    fn preprocessing_levels_are_parsed() {
        assert_eq!(PreprocessingLevel::Partial, "partial".parse().unwrap());
        assert!("3".parse::<PreprocessingLevel>().is_err());
    }
    #[test]
    fn builder_defaults_match_default_config() {
        let built = SolverConfigBuilder::default().build().unwrap();
        assert_eq!(SolverConfig::default(), built);
    }
    #[test]
    fn builder_overrides_only_what_it_is_told() {
        let built = SolverConfigBuilder::default()
            .max_iterations(12)
            .alternative_stop_enabled(true)
            .build()
            .unwrap();
        assert_eq!(12, built.max_iterations);
        assert!(built.alternative_stop_enabled);
        assert_eq!(10, built.iterations_without_improvement_threshold);
    }
    #[test]
    fn builder_rejects_null_iteration_budget() {
        let res = SolverConfigBuilder::default().max_iterations(0).build();
        assert!(matches!(res, Err(Error::ConfigurationInvalid(_))));
    }
    #[test]
    fn builder_rejects_negative_lambda_floor() {
        let res = SolverConfigBuilder::default().min_lambda(-0.5).build();
        assert!(matches!(res, Err(Error::ConfigurationInvalid(_))));
    }
    #[test]
    fn builder_rejects_negative_multipliers() {
        let res = SolverConfigBuilder::default().initial_multiplier(-0.5).build();
        assert!(matches!(res, Err(Error::ConfigurationInvalid(_))));
    }
    #[test]
    fn builder_rejects_invalid_volume_parameters() {
        let mut volume = VolumeParams::default();
        volume.max_alpha = 2.0;
        let res = SolverConfigBuilder::default().volume(volume).build();
        assert!(matches!(res, Err(Error::ConfigurationInvalid(_))));
    }
}
