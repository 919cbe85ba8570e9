//! Hands the finished evaluation to the plotting script and logs a short
//! per-strategy summary.

use crate::EvalError;
use crate::evaluate::{Evaluator, StrategyResult};
use log::{info, warn};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub title: String,
    pub queries: usize,
    pub matched: usize,
    pub recall_at_1: f64,
    pub recall_at_5: f64,
    pub recall_at_10: f64,
}

/// Fraction of queries whose exact match sits at rank `k` or better.
fn recall_at(result: &StrategyResult, k: usize) -> f64 {
    if result.matches.is_empty() {
        return 0.0;
    }
    let hits = result
        .matches
        .iter()
        .filter(|m| m.matched && m.distance <= k)
        .count();
    hits as f64 / result.matches.len() as f64
}

pub fn summarize(result: &StrategyResult) -> Summary {
    Summary {
        title: result.title.clone(),
        queries: result.matches.len(),
        matched: result.matches.iter().filter(|m| m.matched).count(),
        recall_at_1: recall_at(result, 1),
        recall_at_5: recall_at(result, 5),
        recall_at_10: recall_at(result, 10),
    }
}

pub fn log_summaries(evaluator: &Evaluator) {
    for result in &evaluator.strategies {
        let s = summarize(result);
        info!(
            "{}: {}/{} matched, recall@1 {:.3}, @5 {:.3}, @10 {:.3}",
            s.title, s.matched, s.queries, s.recall_at_1, s.recall_at_5, s.recall_at_10
        );
    }
}

pub fn to_json(evaluator: &Evaluator) -> Result<Vec<u8>, EvalError> {
    Ok(serde_json::to_vec(evaluator)?)
}

pub fn write_output(evaluator: &Evaluator, path: &Path) -> Result<(), EvalError> {
    std::fs::write(path, to_json(evaluator)?)?;
    info!("wrote evaluation to {}", path.display());
    Ok(())
}

/// Stream the serialized evaluation into `script`'s stdin. Its output is
/// inherited; a failure to run it is only logged.
pub fn plot(evaluator: &Evaluator, script: &str) -> Result<(), EvalError> {
    let json = to_json(evaluator)?;
    match run_script(script, &json) {
        Ok(status) if status.success() => info!("{script} finished"),
        Ok(status) => warn!("{script} finished with error: {status}"),
        Err(e) => warn!("could not run {script}: {e}"),
    }
    Ok(())
}

fn run_script(script: &str, input: &[u8]) -> std::io::Result<std::process::ExitStatus> {
    let mut child = Command::new(script)
        .stdin(Stdio::piped())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        // A script that exits without reading everything is its own business.
        if let Err(e) = stdin.write_all(input) {
            warn!("writing to {script}: {e}");
        }
    }
    child.wait()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate::Match;

    fn m(distance: usize) -> Match {
        Match {
            matched: distance > 0,
            distance,
            chars_recalled: 0,
        }
    }

    #[test]
    fn summary_recall_rates() {
        let result = StrategyResult {
            title: "t".into(),
            matches: vec![m(1), m(3), m(7), m(20), m(0)],
            ..Default::default()
        };
        let s = summarize(&result);
        assert_eq!(s.queries, 5);
        assert_eq!(s.matched, 4);
        assert!((s.recall_at_1 - 0.2).abs() < 1e-12);
        assert!((s.recall_at_5 - 0.4).abs() < 1e-12);
        assert!((s.recall_at_10 - 0.6).abs() < 1e-12);
    }

    #[test]
    fn empty_result_summary() {
        let s = summarize(&StrategyResult::default());
        assert_eq!(s.queries, 0);
        assert_eq!(s.recall_at_1, 0.0);
    }

    #[test]
    fn missing_script_is_not_fatal() {
        let ev = Evaluator::new(Vec::new(), false, Default::default());
        assert!(plot(&ev, "/nonexistent/resh-plot-script").is_ok());
    }

    #[test]
    fn write_output_round_trips_to_json() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out.json");
        let ev = Evaluator::new(Vec::new(), true, Default::default());
        write_output(&ev, &path).unwrap();
        let v: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(v["BatchMode"], true);
        assert!(v["Strategies"].as_array().unwrap().is_empty());
    }
}
