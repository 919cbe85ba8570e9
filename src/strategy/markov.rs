//! N-gram Markov chain over the command sequence.
//!
//! Transition counts are shared by every session on the device. The context
//! for a prediction is the last `order` commands of the query's own session,
//! so interleaved sessions do not form bogus n-grams.

use super::{Strategy, mru_push, session_key};
use crate::EvalError;
use crate::record::Record;
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkovToken {
    /// The whole command line.
    CmdLine,
    /// Only the command name; predictions expand back to command lines.
    Command,
}

#[derive(Debug, Default, Clone, Copy)]
struct Follower {
    count: u64,
    last_seen: u64,
}

pub struct MarkovChain {
    order: usize,
    token: MarkovToken,
    /// context -> (next token -> count)
    transitions: HashMap<Vec<String>, HashMap<String, Follower>>,
    /// Last `order` tokens per live session.
    contexts: HashMap<u64, VecDeque<String>>,
    /// Command lines seen per command name, most recent first.
    lines_by_command: HashMap<String, VecDeque<String>>,
    clock: u64,
}

impl MarkovChain {
    pub fn new(order: usize, token: MarkovToken) -> Self {
        Self {
            order: order.max(1),
            token,
            transitions: HashMap::new(),
            contexts: HashMap::new(),
            lines_by_command: HashMap::new(),
            clock: 0,
        }
    }

    fn token_of(&self, record: &Record) -> String {
        match self.token {
            MarkovToken::CmdLine => record.cmd_line.clone(),
            MarkovToken::Command if record.command.is_empty() => record.cmd_line.clone(),
            MarkovToken::Command => record.command.clone(),
        }
    }

    /// Followers of the query session's context: most frequent first, most
    /// recent first among equals.
    fn ranked_followers(&self, session: u64) -> Vec<&str> {
        let Some(context) = self.contexts.get(&session) else {
            return Vec::new();
        };
        if context.len() < self.order {
            return Vec::new();
        }
        let key: Vec<String> = context.iter().cloned().collect();
        let Some(followers) = self.transitions.get(&key) else {
            return Vec::new();
        };

        let mut ranked: Vec<(&str, Follower)> =
            followers.iter().map(|(t, f)| (t.as_str(), *f)).collect();
        ranked.sort_by(|a, b| {
            b.1.count
                .cmp(&a.1.count)
                .then(b.1.last_seen.cmp(&a.1.last_seen))
        });
        ranked.into_iter().map(|(t, _)| t).collect()
    }
}

impl Strategy for MarkovChain {
    fn title_and_description(&self) -> (String, String) {
        match self.token {
            MarkovToken::CmdLine => (
                format!("markov chain (order {})", self.order),
                "Use markov chain to recommend commands".into(),
            ),
            MarkovToken::Command => (
                format!("markov chain cmd (order {})", self.order),
                "Use markov chain over command names to recommend commands".into(),
            ),
        }
    }

    fn candidates(&mut self, query: &Record) -> Vec<String> {
        let followers = self.ranked_followers(query.seq_session_id);
        match self.token {
            MarkovToken::CmdLine => followers.into_iter().map(str::to_string).collect(),
            MarkovToken::Command => followers
                .into_iter()
                .filter_map(|cmd| self.lines_by_command.get(cmd))
                .flatten()
                .cloned()
                .collect(),
        }
    }

    fn add_history_record(&mut self, record: &Record) -> Result<(), EvalError> {
        let session = session_key(record)?;
        let token = self.token_of(record);
        self.clock += 1;
        let now = self.clock;

        let context = self.contexts.entry(session).or_default();
        if context.len() == self.order {
            let key: Vec<String> = context.iter().cloned().collect();
            let follower = self
                .transitions
                .entry(key)
                .or_default()
                .entry(token.clone())
                .or_default();
            follower.count += 1;
            follower.last_seen = now;
        }
        context.push_back(token.clone());
        if context.len() > self.order {
            context.pop_front();
        }

        if self.token == MarkovToken::Command {
            mru_push(self.lines_by_command.entry(token).or_default(), &record.cmd_line);
        }
        if record.last_record_of_session {
            self.contexts.remove(&session);
        }
        Ok(())
    }

    fn reset_history(&mut self) -> Result<(), EvalError> {
        self.transitions.clear();
        self.contexts.clear();
        self.lines_by_command.clear();
        self.clock = 0;
        Ok(())
    }
}
