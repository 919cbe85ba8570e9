//! Candidate-ranking strategies.
//!
//! Every strategy owns its whole memory of the past. The harness feeds it
//! records strictly in chronological order and wipes it between devices.

pub mod directory;
pub mod distance;
pub mod markov;
pub mod recent;
pub mod recent_shell;

use crate::EvalError;
use crate::config::EvalConfig;
use crate::record::Record;
use std::collections::VecDeque;

pub use directory::DirectorySensitive;
pub use distance::{DistanceVariant, RecordDistance};
pub use markov::{MarkovChain, MarkovToken};
pub use recent::Recent;
pub use recent_shell::RecentShell;

/// A strategy that predicts from the query record's context.
///
/// `candidates` is asked about a stripped record before that same record is
/// passed to `add_history_record`. It never fails; an empty list means no
/// prediction.
pub trait Strategy {
    fn title_and_description(&self) -> (String, String);
    fn candidates(&mut self, query: &Record) -> Vec<String>;
    fn add_history_record(&mut self, record: &Record) -> Result<(), EvalError>;
    fn reset_history(&mut self) -> Result<(), EvalError>;
}

/// A strategy that ignores the query record entirely.
pub trait SimpleStrategy {
    fn title_and_description(&self) -> (String, String);
    fn candidates(&self) -> Vec<String>;
    fn add_history_record(&mut self, record: &Record) -> Result<(), EvalError>;
    fn reset_history(&mut self) -> Result<(), EvalError>;
}

/// Lifts a [`SimpleStrategy`] into a [`Strategy`] by dropping the query.
pub struct ContextFree<S>(pub S);

impl<S: SimpleStrategy> Strategy for ContextFree<S> {
    fn title_and_description(&self) -> (String, String) {
        self.0.title_and_description()
    }

    fn candidates(&mut self, _query: &Record) -> Vec<String> {
        self.0.candidates()
    }

    fn add_history_record(&mut self, record: &Record) -> Result<(), EvalError> {
        self.0.add_history_record(record)
    }

    fn reset_history(&mut self) -> Result<(), EvalError> {
        self.0.reset_history()
    }
}

/// Move `cmd` to the front of a most-recently-used list, dropping any
/// earlier occurrence.
pub(crate) fn mru_push(list: &mut VecDeque<String>, cmd: &str) {
    if let Some(pos) = list.iter().position(|c| c == cmd) {
        list.remove(pos);
    }
    list.push_front(cmd.to_string());
}

/// Sequential session id of a record, which must have been annotated.
pub(crate) fn session_key(record: &Record) -> Result<u64, EvalError> {
    match record.seq_session_id {
        0 => Err(EvalError::Strategy(format!(
            "record for session {:?} has no sequential session id",
            record.session_id
        ))),
        id => Ok(id),
    }
}

/// The strategies evaluated by default, in evaluation order. Markov chains
/// rebuild context tables for every query and only run with `slow`.
pub fn default_strategies(config: &EvalConfig, slow: bool) -> Vec<Box<dyn Strategy>> {
    let depth = config.distance.max_depth;
    let weights = config.distance.weights;

    let mut strategies: Vec<Box<dyn Strategy>> = vec![
        Box::new(RecordDistance::new(DistanceVariant::Dynamic, depth, weights)),
        Box::new(RecordDistance::new(DistanceVariant::Static, depth, weights)),
        Box::new(RecentShell::new()),
        Box::new(ContextFree(Recent::new())),
        Box::new(DirectorySensitive::new()),
    ];

    if slow {
        let mut orders = config.markov.orders.clone();
        orders.sort_unstable_by(|a, b| b.cmp(a));
        orders.dedup();
        for token in [MarkovToken::Command, MarkovToken::CmdLine] {
            for &order in &orders {
                strategies.push(Box::new(MarkovChain::new(order, token)));
            }
        }
    }
    strategies
}
