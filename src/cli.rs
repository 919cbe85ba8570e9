use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "resh-evaluate",
    version,
    about = "Replay recorded shell history and score command prediction strategies"
)]
pub struct Cli {
    /// Input file (default: ~/.resh_history.json, ~/resh_history_sanitized.json
    /// with --sanitized-input, or resh_history.json inside each device in batch mode)
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Handle input as sanitized (also changes the default input)
    #[arg(long)]
    pub sanitized_input: bool,

    /// Input data root; enables batch mode and looks for files named like --input
    #[arg(long)]
    pub input_data_root: Option<PathBuf>,

    /// Also run slow strategies (markov chains)
    #[arg(long)]
    pub slow: bool,

    /// Skip records with non-zero exit status
    #[arg(long)]
    pub skip_failed_cmds: bool,

    /// Fraction of records to print debug details for (0 to 1)
    #[arg(long, default_value = "0", value_parser = parse_rate)]
    pub debug: f64,

    /// Script that receives the evaluation on stdin for stats and plotting
    #[arg(long, default_value = "resh-evaluate-plot.py")]
    pub plotting_script: String,

    /// Skip the plotting script
    #[arg(long)]
    pub no_plot: bool,

    /// Also write the evaluation JSON to this file
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Inspect at most this many candidates per query
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub max_candidates: Option<u64>,

    /// Config file
    #[arg(long, env = "RESH_EVALUATE_CONFIG")]
    pub config: Option<PathBuf>,
}

fn parse_rate(s: &str) -> Result<f64, String> {
    let rate: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(format!("{rate} is not between 0 and 1"))
    }
}
