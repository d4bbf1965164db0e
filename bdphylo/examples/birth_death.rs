use bdphylo::*;
use clap::{Arg, Command};

fn main() {
    let matches = Command::new("birth_death")
        .arg(
            Arg::new("seed")
                .short('S')
                .long("seed")
                .help("Random number seed")
                .takes_value(true),
        )
        .arg(
            Arg::new("r0")
                .short('R')
                .long("r0")
                .help("Basic reproduction number")
                .takes_value(true),
        )
        .arg(
            Arg::new("infectious_period")
                .short('d')
                .long("infectious-period")
                .help("Mean duration of infection")
                .takes_value(true),
        )
        .arg(
            Arg::new("sampling_probability")
                .short('p')
                .long("rho")
                .help("Per-removal sampling probability")
                .takes_value(true),
        )
        .arg(
            Arg::new("max_cases")
                .short('c')
                .long("max-cases")
                .help("Halt with failure after this many cases")
                .takes_value(true),
        )
        .arg(
            Arg::new("max_samples")
                .short('s')
                .long("max-samples")
                .help("Halt with success after this many samples")
                .takes_value(true),
        )
        .arg(
            Arg::new("nhx")
                .long("nhx")
                .help("Emit NHX annotations")
                .takes_value(false),
        )
        .get_matches();

    let params = SimulationParams {
        seed: matches.value_of_t("seed").unwrap_or(1),
        r0: matches.value_of_t("r0").unwrap_or(2.0),
        infectious_period: matches.value_of_t("infectious_period").unwrap_or(1.0),
        sampling_probability: matches.value_of_t("sampling_probability").unwrap_or(0.5),
        max_cases: matches.value_of_t("max_cases").unwrap_or(100_000_000),
        max_samples: matches.value_of_t("max_samples").unwrap_or(10),
    };

    let flags = if matches.is_present("nhx") {
        NewickFlags::NHX_ANNOTATIONS
    } else {
        NewickFlags::empty()
    };

    let mut sim = Simulation::new(params).unwrap();
    sim.initialise_single_infection().unwrap();
    match sim.run().unwrap() {
        SimulationOutcome::SamplesReached => {
            let reduced = sim.subsample();
            let phylo = build_ancestral_tree(&reduced[0]).unwrap();
            println!("{}", write_newick(&phylo, flags));
        }
        outcome => {
            eprintln!("simulation failed: {:?}", outcome);
            std::process::exit(1);
        }
    }
}
