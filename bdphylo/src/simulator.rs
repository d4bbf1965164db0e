//! The Gillespie event loop for a birth-death epidemic.
//!
//! Each of the `I` extant lineages transmits at rate `beta` and is
//! removed at rate `mu`; a removal is sampled with probability
//! `rho`.  Every event is recorded in a [`LineageTree`] so the
//! sampled phylogeny can be extracted afterwards.

use bdphylo_core::{LineageId, Time};
use bdphylo_rng::{bernoulli, exponential, uniform, uniform_index, Rng};
use bdphylo_trees::{LineageTree, ReducedTree};
use thiserror::Error;

use crate::BdPhyloError;

/// Error type for simulation parameter validation.
#[derive(Error, Debug, PartialEq)]
pub enum SimulationError {
    /// Returned when `r0` is not positive and finite.
    #[error("basic reproduction number must be positive and finite")]
    InvalidReproductionNumber,
    /// Returned when the infectious period is not positive and finite.
    #[error("infectious period must be positive and finite")]
    InvalidInfectiousPeriod,
    /// Returned when the sampling probability is outside `[0, 1]`.
    #[error("sampling probability must lie in [0, 1]")]
    InvalidSamplingProbability,
}

/// Parameters of a birth-death simulation.
#[derive(Copy, Clone, Debug)]
pub struct SimulationParams {
    /// Basic reproduction number.
    pub r0: f64,
    /// Mean duration of infection.
    pub infectious_period: f64,
    /// Per-removal sampling probability.
    pub sampling_probability: f64,
    /// Halt (with failure) once this many cases have been created.
    pub max_cases: u32,
    /// Halt (with success) once this many lineages are sampled.
    pub max_samples: u32,
    /// Random number seed.
    pub seed: u64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            r0: 2.0,
            infectious_period: 1.0,
            sampling_probability: 0.5,
            max_cases: 100_000_000,
            max_samples: 10,
            seed: 0,
        }
    }
}

impl SimulationParams {
    /// Validate the parameter ranges.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if !self.r0.is_finite() || self.r0 <= 0.0 {
            return Err(SimulationError::InvalidReproductionNumber);
        }
        if !self.infectious_period.is_finite() || self.infectious_period <= 0.0 {
            return Err(SimulationError::InvalidInfectiousPeriod);
        }
        if !self.sampling_probability.is_finite()
            || !(0.0..=1.0).contains(&self.sampling_probability)
        {
            return Err(SimulationError::InvalidSamplingProbability);
        }
        Ok(())
    }
}

/// How a simulation halted.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SimulationOutcome {
    /// The sampling target was reached.
    SamplesReached,
    /// The epidemic died out before the sampling target.
    Extinction,
    /// The case budget ran out before the sampling target.
    CaseBudgetExhausted,
}

/// A single birth-death simulation run.
///
/// Owns the clock, the extant-lineage pool, the transmission tree,
/// and the random number generator; the latter is seeded from
/// [`SimulationParams::seed`], so runs with equal parameters are
/// reproducible.
pub struct Simulation {
    beta: f64,
    mu: f64,
    sampling_probability: f64,
    max_cases: u32,
    max_samples: u32,
    t: Time,
    extant_lngs: Vec<LineageId>,
    next_lng: i64,
    n_sampled: u32,
    tree: LineageTree<LineageId, i64>,
    rng: Rng,
}

impl Simulation {
    /// Create a simulation from validated parameters.
    pub fn new(params: SimulationParams) -> Result<Self, SimulationError> {
        params.validate()?;
        let mu = 1.0 / params.infectious_period;
        Ok(Self {
            beta: params.r0 * mu,
            mu,
            sampling_probability: params.sampling_probability,
            max_cases: params.max_cases,
            max_samples: params.max_samples,
            t: Time::from(0.0),
            extant_lngs: vec![],
            next_lng: 1,
            n_sampled: 0,
            tree: LineageTree::new(),
            rng: Rng::new(params.seed),
        })
    }

    /// Seed the epidemic with one introduction at time 0.
    pub fn initialise_single_infection(&mut self) -> Result<(), BdPhyloError> {
        let lng = LineageId::from(self.next_lng);
        self.tree.add_extant_external(self.t, lng, 0)?;
        self.extant_lngs.push(lng);
        self.next_lng += 1;
        Ok(())
    }

    /// Run the event loop until a stopping condition fires.
    pub fn run(&mut self) -> Result<SimulationOutcome, BdPhyloError> {
        loop {
            let num_extant = self.extant_lngs.len() as f64;
            let total_rate = (self.beta + self.mu) * num_extant;
            if total_rate == 0.0 {
                return Ok(SimulationOutcome::Extinction);
            }

            let dt = exponential(&mut self.rng, total_rate);
            self.t = self.t + dt;

            let u = uniform(&mut self.rng) * total_rate;
            if u <= self.beta * num_extant {
                self.apply_infection()?;
            } else {
                self.apply_removal()?;
            }

            if self.next_lng > i64::from(self.max_cases) {
                return Ok(SimulationOutcome::CaseBudgetExhausted);
            }
            if self.n_sampled >= self.max_samples {
                return Ok(SimulationOutcome::SamplesReached);
            }
        }
    }

    /// A transmission event: a uniformly chosen extant lineage
    /// infects the next lineage id.
    fn apply_infection(&mut self) -> Result<(), BdPhyloError> {
        let ix = uniform_index(&mut self.rng, self.extant_lngs.len() - 1);
        let parent = self.extant_lngs[ix];
        let lng = LineageId::from(self.next_lng);
        self.tree.add_extant(self.t, lng, 0, &parent)?;
        self.extant_lngs.push(lng);
        self.next_lng += 1;
        Ok(())
    }

    /// A removal event: a uniformly chosen extant lineage leaves
    /// the pool, sampled with probability `rho` on the way out.
    fn apply_removal(&mut self) -> Result<(), BdPhyloError> {
        let ix = uniform_index(&mut self.rng, self.extant_lngs.len() - 1);
        let lng = self.extant_lngs[ix];
        if bernoulli(&mut self.rng, self.sampling_probability)
            && self.tree.sample(&lng, self.t, None)?
        {
            self.n_sampled += 1;
        }
        self.tree.remove_extant(&lng)?;
        self.extant_lngs.swap_remove(ix);
        Ok(())
    }

    /// The current simulation time.
    pub fn time(&self) -> Time {
        self.t
    }

    /// The number of extant lineages.
    pub fn num_extant(&self) -> usize {
        self.extant_lngs.len()
    }

    /// The number of sampled lineages.
    pub fn num_sampled(&self) -> u32 {
        self.n_sampled
    }

    /// The transmission tree recorded so far.
    pub fn tree(&self) -> &LineageTree<LineageId, i64> {
        &self.tree
    }

    /// Extract the reduced transmission forest.
    pub fn subsample(&mut self) -> Vec<ReducedTree<LineageId, i64>> {
        self.tree.subsample_tree()
    }
}
