use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use resh_evaluate::EvalError;
use resh_evaluate::cli::Cli;
use resh_evaluate::config::load_config;
use resh_evaluate::evaluate::{EvalOptions, Evaluator};
use resh_evaluate::loader::{load_batch, load_single};
use resh_evaluate::report;
use resh_evaluate::strategy::default_strategies;
use std::path::PathBuf;
use std::process::ExitCode;

const HISTORY_FILE: &str = ".resh_history.json";
const BATCH_HISTORY_FILE: &str = "resh_history.json";
const SANITIZED_HISTORY_FILE: &str = "resh_history_sanitized.json";

fn home_dir() -> PathBuf {
    PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| "/tmp".into()))
}

fn run() -> Result<(), EvalError> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    let users = match &cli.input_data_root {
        Some(root) => {
            let file_name = match &cli.input {
                Some(p) => p
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .ok_or_else(|| {
                        EvalError::Config(format!("--input {} has no file name", p.display()))
                    })?,
                None if cli.sanitized_input => SANITIZED_HISTORY_FILE.into(),
                None => BATCH_HISTORY_FILE.into(),
            };
            load_batch(root, &file_name, cli.sanitized_input)?
        }
        None => {
            let path = cli.input.clone().unwrap_or_else(|| {
                home_dir().join(if cli.sanitized_input {
                    SANITIZED_HISTORY_FILE
                } else {
                    HISTORY_FILE
                })
            });
            load_single(&path, cli.sanitized_input)?
        }
    };

    let options = EvalOptions {
        skip_failed_cmds: cli.skip_failed_cmds,
        max_candidates: cli
            .max_candidates
            .map(|n| n as usize)
            .or(config.evaluate.max_candidates),
        debug_top_n: config.debug.top_n,
    };
    let mut evaluator = Evaluator::new(users, cli.input_data_root.is_some(), options);
    if cli.debug > 0.0 {
        let mut rng = match config.debug.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        evaluator.sample_debug_records(cli.debug, &mut rng);
    }
    log::info!("evaluating {} records", evaluator.record_count());

    evaluator.evaluate_all(default_strategies(&config, cli.slow));
    report::log_summaries(&evaluator);

    if let Some(path) = &cli.output {
        report::write_output(&evaluator, path)?;
    }
    if !cli.no_plot {
        report::plot(&evaluator, &cli.plotting_script)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("resh-evaluate: {e}");
            ExitCode::from(1)
        }
    }
}
