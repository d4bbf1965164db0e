//! Rust library for stochastic birth-death epidemic simulation
//! with sampled-phylogeny extraction.
//!
//! # Overview
//!
//! A continuous-time birth-death chain is simulated exactly with a
//! Gillespie loop: each extant lineage transmits at rate
//! `beta = r0 / infectious_period` and is removed at rate
//! `mu = 1 / infectious_period`; removals are sampled with
//! probability `rho`.  Every event is recorded in an online
//! transmission tree that eagerly prunes extinct, unsampled
//! branches, so memory tracks the extant population plus the
//! ancestry of sampled lineages rather than cumulative cases.
//!
//! When a run reaches its sampling target, the pruned tree is
//! reduced to the minimal subtree connecting the samples,
//! converted into a strictly binary time-stamped phylogeny
//! (sampled ancestors become zero-length leaves), and serialized
//! as a Newick string.
//!
//! # Entry points
//!
//! * [`simulate_bd`]: seed and rates in, Newick string out
//!   (empty on early extinction or case-budget exhaustion).
//! * [`run_simulation`]: the same pipeline, returning a
//!   [`SimulationReport`] that distinguishes the failure modes.
//! * [`Simulation`]: the stepwise API behind both.
//!
//! # Where to find examples
//!
//! In the `examples/` directory of the `bdphylo` crate.

mod error;
mod simulator;

pub use error::BdPhyloError;
pub use simulator::{Simulation, SimulationError, SimulationOutcome, SimulationParams};

pub use bdphylo_core::{LineageId, Time};
pub use bdphylo_trees::{
    build_ancestral_tree, write_newick, LineageTree, LineageTreeError, NewickFlags, NodeIndex,
    PhyloNode, PhylogenyError, ReducedNode, ReducedTree,
};

/// Everything [`run_simulation`] has to report.
pub struct SimulationReport {
    /// How the run halted.
    pub outcome: SimulationOutcome,
    /// The number of lineages sampled before halting.
    pub num_sampled: u32,
    /// The Newick string of the sampled phylogeny; empty unless
    /// the outcome is [`SimulationOutcome::SamplesReached`].
    pub newick: String,
}

/// Run one simulation and extract the sampled phylogeny.
///
/// On success the report carries the Newick string of the first
/// (and, for a single introduction, only) reduced tree.  Early
/// extinction and case-budget exhaustion are reported as outcomes,
/// not errors.
pub fn run_simulation(params: SimulationParams) -> Result<SimulationReport, BdPhyloError> {
    let mut sim = Simulation::new(params)?;
    sim.initialise_single_infection()?;
    let outcome = sim.run()?;
    let newick = match outcome {
        SimulationOutcome::SamplesReached => {
            let reduced = sim.subsample();
            let first = reduced
                .first()
                .ok_or(bdphylo_trees::PhylogenyError::EmptyReduction)?;
            let phylo = build_ancestral_tree(first)?;
            write_newick(&phylo, NewickFlags::empty())
        }
        _ => String::new(),
    };
    Ok(SimulationReport {
        outcome,
        num_sampled: sim.num_sampled(),
        newick,
    })
}

/// Simulate a birth-death epidemic and return its sampled
/// phylogeny as a Newick string.
///
/// Returns an empty string when the epidemic goes extinct or the
/// case budget is exhausted before `max_samples` lineages are
/// sampled.  Errors only on invalid parameters.
///
/// # Example
///
/// ```
/// let nwk = bdphylo::simulate_bd(1, 100_000, 2, 3.0, 1.0, 1.0).unwrap();
/// assert!(nwk.is_empty() || nwk.ends_with(';'));
/// ```
pub fn simulate_bd(
    seed: u64,
    max_cases: u32,
    max_samples: u32,
    r0: f64,
    infectious_period: f64,
    sampling_probability: f64,
) -> Result<String, BdPhyloError> {
    let params = SimulationParams {
        r0,
        infectious_period,
        sampling_probability,
        max_cases,
        max_samples,
        seed,
    };
    run_simulation(params).map(|report| report.newick)
}

/// Get the bdphylo version number.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
