use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use std::{env, fs};

use clap::{Parser, ValueEnum};
use env_logger::Builder;
use log::LevelFilter;

use schedustic::algorithms::{
    Algorithm, Amga2, ApNsgaIii, Cso, Dlba, Emosoa, Fpa, GaQpso, GeneticAlgorithm, Hgasso, NsgaII,
    NsgaIii, Rqiea, SearchOptions,
};
use schedustic::core::{Configuration, SError};
use schedustic::report;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum AlgorithmKind {
    Ga,
    Nsga2,
    Nsga3,
    Apnsga3,
    Amga2,
    Cso,
    Fpa,
    Dlba,
    Gaqpso,
    Hgasso,
    Emosoa,
    Rqiea,
}

/// Make a class schedule for a university timetable configuration.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration JSON file.
    #[clap(default_value = "./GaSchedule.json")]
    config: PathBuf,

    /// The optimiser to run.
    #[clap(long, value_enum, default_value_t = AlgorithmKind::Nsga2)]
    algorithm: AlgorithmKind,

    /// Random seed for a reproducible run.
    #[clap(long)]
    seed: Option<u64>,

    /// The population size.
    #[clap(long, default_value_t = 100)]
    population: usize,

    /// The maximum number of generations.
    #[clap(long, default_value_t = 5000)]
    max_generations: usize,
}

fn build_algorithm(
    kind: AlgorithmKind,
    configuration: Arc<Configuration>,
    options: SearchOptions,
) -> Result<Box<dyn Algorithm>, SError> {
    Ok(match kind {
        AlgorithmKind::Ga => Box::new(GeneticAlgorithm::new(configuration, options)?),
        AlgorithmKind::Nsga2 => Box::new(NsgaII::new(configuration, options)?),
        AlgorithmKind::Nsga3 => Box::new(NsgaIii::new(configuration, options)?),
        AlgorithmKind::Apnsga3 => Box::new(ApNsgaIii::new(configuration, options)?),
        AlgorithmKind::Amga2 => Box::new(Amga2::new(configuration, options)?),
        AlgorithmKind::Cso => Box::new(Cso::new(configuration, options)?),
        AlgorithmKind::Fpa => Box::new(Fpa::new(configuration, options)?),
        AlgorithmKind::Dlba => Box::new(Dlba::new(configuration, options)?),
        AlgorithmKind::Gaqpso => Box::new(GaQpso::new(configuration, options)?),
        AlgorithmKind::Hgasso => Box::new(Hgasso::new(configuration, options)?),
        AlgorithmKind::Emosoa => Box::new(Emosoa::new(configuration, options)?),
        AlgorithmKind::Rqiea => Box::new(Rqiea::new(configuration, options)?),
    })
}

fn run(args: Args) -> Result<(), SError> {
    let start = Instant::now();

    let configuration = Arc::new(Configuration::from_file(&args.config)?);
    let options = SearchOptions {
        population_size: args.population,
        max_generations: args.max_generations,
        seed: args.seed,
        ..SearchOptions::default()
    };

    let mut algorithm = build_algorithm(args.algorithm, configuration, options)?;
    println!("Making a class schedule with {}.", algorithm);
    let best = algorithm.run()?;

    let html = report::render_document(&best);
    let mut output = env::temp_dir();
    let stem = args
        .config
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("schedule");
    output.push(format!("{stem}.htm"));
    fs::write(&output, html)
        .map_err(|e| SError::Generic(format!("cannot write '{}': {e}", output.display())))?;

    println!("Schedule written to {}", output.display());
    println!("Completed in {:.3} secs.", start.elapsed().as_secs_f64());
    Ok(())
}

fn main() -> ExitCode {
    Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .format(|formatter, record| writeln!(formatter, "{}", record.args()))
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{error}");
            ExitCode::FAILURE
        }
    }
}
