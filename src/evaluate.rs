//! Replays every device's history through one strategy at a time and scores
//! the ranked candidates against the command that was actually run.

use crate::EvalError;
use crate::loader::UserRecords;
use crate::record::Record;
use crate::session;
use crate::strategy::Strategy;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Exact-match outcome for one query. `distance` is the 1-based rank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Match {
    #[serde(rename = "Match")]
    pub matched: bool,
    pub distance: usize,
    pub chars_recalled: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PrefixMatchEntry {
    pub distance: usize,
    pub chars_recalled: usize,
}

/// Every strict improvement of the common prefix while scanning ranks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PrefixMatch {
    #[serde(rename = "Match")]
    pub matched: bool,
    pub entries: Vec<PrefixMatchEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StrategyResult {
    pub title: String,
    pub description: String,
    pub matches: Vec<Match>,
    pub prefix_matches: Vec<PrefixMatch>,
}

#[derive(Debug, Clone)]
pub struct EvalOptions {
    pub skip_failed_cmds: bool,
    /// Inspect at most this many candidates per query.
    pub max_candidates: Option<usize>,
    /// Candidates printed for debug-sampled records.
    pub debug_top_n: usize,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            skip_failed_cmds: false,
            max_candidates: None,
            debug_top_n: 11,
        }
    }
}

/// Length in characters of the common prefix of two strings.
pub fn common_prefix_len(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count()
}

/// Score one ranked candidate list against the executed command.
///
/// The prefix check runs before the exact check at each rank, so an exact
/// hit also records its prefix improvement before the scan stops.
pub fn score(
    candidates: &[String],
    cmd_line: &str,
    cmd_length: usize,
    max_candidates: Option<usize>,
) -> (Match, PrefixMatch) {
    let limit = max_candidates.unwrap_or(usize::MAX);
    let mut longest = 0;
    let mut prefix = PrefixMatch::default();

    for (i, candidate) in candidates.iter().take(limit).enumerate() {
        let rank = i + 1;
        let common = common_prefix_len(candidate, cmd_line);
        if common > longest {
            longest = common;
            prefix.matched = true;
            prefix.entries.push(PrefixMatchEntry {
                distance: rank,
                chars_recalled: common,
            });
        }
        if candidate == cmd_line {
            let exact = Match {
                matched: true,
                distance: rank,
                chars_recalled: cmd_length,
            };
            return (exact, prefix);
        }
    }
    (Match::default(), prefix)
}

/// All loaded history plus the results accumulated so far. Serialized as a
/// whole for the report sink.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Evaluator {
    pub batch_mode: bool,
    pub users_records: Vec<UserRecords>,
    pub strategies: Vec<StrategyResult>,
    #[serde(skip)]
    options: EvalOptions,
}

impl Evaluator {
    /// Takes loaded (enriched) records and annotates every device's sessions.
    pub fn new(users: Vec<UserRecords>, batch_mode: bool, options: EvalOptions) -> Self {
        let users_records = users
            .into_iter()
            .map(|mut user| {
                for device in &mut user.devices {
                    device.records = session::annotate(std::mem::take(&mut device.records));
                }
                user
            })
            .collect();
        Self {
            batch_mode,
            users_records,
            strategies: Vec::new(),
            options,
        }
    }

    pub fn sample_debug_records<R: Rng>(&mut self, rate: f64, rng: &mut R) {
        for user in &mut self.users_records {
            for device in &mut user.devices {
                session::sample_debug(&mut device.records, rate, rng);
            }
        }
    }

    pub fn record_count(&self) -> usize {
        self.users_records
            .iter()
            .flat_map(|u| &u.devices)
            .map(|d| d.records.len())
            .sum()
    }

    /// Evaluate each strategy in turn. A failing strategy is logged and
    /// dropped; the others still run.
    pub fn evaluate_all(&mut self, strategies: Vec<Box<dyn Strategy>>) {
        for mut strategy in strategies {
            let (title, _) = strategy.title_and_description();
            if let Err(e) = self.evaluate(strategy.as_mut()) {
                error!("strategy '{title}' abandoned: {e}");
            }
        }
    }

    /// Run one strategy across every device. Results are appended only if
    /// the whole run succeeds.
    pub fn evaluate(&mut self, strategy: &mut dyn Strategy) -> Result<(), EvalError> {
        let (title, description) = strategy.title_and_description();
        info!("evaluating strategy: {title} - {description}");
        let mut result = StrategyResult {
            title,
            description,
            ..Default::default()
        };

        for user in &self.users_records {
            for device in &user.devices {
                debug!(
                    "user '{}' device '{}': {} records",
                    user.name,
                    device.name,
                    device.records.len()
                );
                let records = if self.options.skip_failed_cmds {
                    Cow::Owned(session::without_failed(&device.records))
                } else {
                    Cow::Borrowed(device.records.as_slice())
                };
                let bar = progress_bar(records.len() as u64);
                let mut prev: Option<&Record> = None;

                for record in records.iter() {
                    bar.inc(1);
                    let candidates = strategy.candidates(&record.stripped());
                    if record.debug_this_record {
                        self.log_debug_record(&result, prev, record, &candidates);
                    }

                    let (exact, prefix) = score(
                        &candidates,
                        &record.cmd_line,
                        record.cmd_length,
                        self.options.max_candidates,
                    );
                    result.matches.push(exact);
                    result.prefix_matches.push(prefix);

                    strategy.add_history_record(record)?;
                    prev = Some(record);
                }
                bar.finish_and_clear();
                strategy.reset_history()?;
            }
        }

        self.strategies.push(result);
        Ok(())
    }

    fn log_debug_record(
        &self,
        result: &StrategyResult,
        prev: Option<&Record>,
        record: &Record,
        candidates: &[String],
    ) {
        info!("===================================================");
        info!("STRATEGY: {} - {}", result.title, result.description);
        info!("===================================================");
        info!("previous record:");
        match prev {
            Some(p) => info!("{}", p.to_pretty_string()),
            None => info!("== none"),
        }
        info!("---------------------------------------------------");
        info!("recommendations for:");
        info!("{}", record.to_pretty_string());
        info!("---------------------------------------------------");
        for candidate in candidates.iter().take(self.options.debug_top_n) {
            info!("{candidate}");
        }
        info!("===================================================");
    }
}

fn progress_bar(len: u64) -> ProgressBar {
    let bar = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::with_template("{wide_bar} {pos}/{len}") {
        bar.set_style(style);
    }
    bar
}
