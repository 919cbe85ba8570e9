//! Nearest-neighbour ranking over recent records by weighted feature distance.

use super::Strategy;
use crate::EvalError;
use crate::record::{DistanceWeights, Record};
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceVariant {
    /// Fixed weights, git features ignored.
    Static,
    /// Directory and git weights scaled by how rare the query's value is.
    Dynamic,
}

pub struct RecordDistance {
    variant: DistanceVariant,
    max_depth: usize,
    weights: DistanceWeights,
    /// Most recent first, at most `max_depth` long when bounded.
    history: VecDeque<Record>,
    total: usize,
    pwd_counts: HashMap<String, usize>,
    real_pwd_counts: HashMap<String, usize>,
    git_counts: HashMap<String, usize>,
}

impl RecordDistance {
    /// `max_depth` of 0 scans the whole history.
    pub fn new(variant: DistanceVariant, max_depth: usize, mut weights: DistanceWeights) -> Self {
        if variant == DistanceVariant::Static {
            weights.git = 0.0;
        }
        Self {
            variant,
            max_depth,
            weights,
            history: VecDeque::new(),
            total: 0,
            pwd_counts: HashMap::new(),
            real_pwd_counts: HashMap::new(),
            git_counts: HashMap::new(),
        }
    }

    /// Weights to use for one query.
    fn query_weights(&self, query: &Record) -> DistanceWeights {
        match self.variant {
            DistanceVariant::Static => self.weights,
            DistanceVariant::Dynamic => DistanceWeights {
                pwd: self.weights.pwd * self.idf(&self.pwd_counts, &query.pwd),
                real_pwd: self.weights.real_pwd * self.idf(&self.real_pwd_counts, &query.real_pwd),
                git: self.weights.git * self.idf(&self.git_counts, &query.git_real_dir),
                ..self.weights
            },
        }
    }

    /// `ln(n / count)`: a value every record shares tells nothing apart.
    fn idf(&self, counts: &HashMap<String, usize>, value: &str) -> f64 {
        let count = counts.get(value).copied().unwrap_or(0).max(1);
        (self.total as f64 / count as f64).ln().max(0.0)
    }

    fn label(&self) -> String {
        let w = &self.weights;
        let mut parts = vec![
            term(w.pwd, "pwd"),
            term(w.real_pwd, "realpwd"),
            term(w.session, "session"),
            term(w.time, "time"),
        ];
        if self.variant == DistanceVariant::Dynamic {
            parts.push(term(w.git, "git"));
        }
        parts.join(",")
    }
}

fn term(weight: f64, name: &str) -> String {
    if weight == 1.0 {
        name.to_string()
    } else {
        format!("{weight}*{name}")
    }
}

impl Strategy for RecordDistance {
    fn title_and_description(&self) -> (String, String) {
        let (prefix, what) = match self.variant {
            DistanceVariant::Static => (
                "record distance",
                "Use records distance to recommend commands",
            ),
            DistanceVariant::Dynamic => (
                "dynamic record distance",
                "Use TF-IDF record distance to recommend commands",
            ),
        };
        (
            format!("{prefix} (depth: {}; {})", self.max_depth, self.label()),
            what.to_string(),
        )
    }

    fn candidates(&mut self, query: &Record) -> Vec<String> {
        let weights = self.query_weights(query);
        let depth = if self.max_depth == 0 {
            usize::MAX
        } else {
            self.max_depth
        };

        let mut scored: Vec<(&str, f64)> = self
            .history
            .iter()
            .take(depth)
            .map(|r| (r.cmd_line.as_str(), r.distance_to(query, &weights)))
            .collect();
        // Stable: equal distances keep most-recent-first order.
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));

        let mut seen = HashSet::new();
        scored
            .into_iter()
            .filter(|(cmd, _)| seen.insert(*cmd))
            .map(|(cmd, _)| cmd.to_string())
            .collect()
    }

    fn add_history_record(&mut self, record: &Record) -> Result<(), EvalError> {
        self.total += 1;
        *self.pwd_counts.entry(record.pwd.clone()).or_default() += 1;
        *self.real_pwd_counts.entry(record.real_pwd.clone()).or_default() += 1;
        *self.git_counts.entry(record.git_real_dir.clone()).or_default() += 1;

        self.history.push_front(record.clone());
        if self.max_depth > 0 {
            self.history.truncate(self.max_depth);
        }
        Ok(())
    }

    fn reset_history(&mut self) -> Result<(), EvalError> {
        self.history.clear();
        self.total = 0;
        self.pwd_counts.clear();
        self.real_pwd_counts.clear();
        self.git_counts.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(cmd: &str, pwd: &str, session: &str, t: f64) -> Record {
        Record {
            cmd_line: cmd.into(),
            pwd: pwd.into(),
            real_pwd: pwd.into(),
            session_id: session.into(),
            seq_session_id: 1,
            realtime_before: t,
            ..Default::default()
        }
    }

    fn only_pwd() -> DistanceWeights {
        DistanceWeights {
            pwd: 1.0,
            real_pwd: 0.0,
            session: 0.0,
            time: 0.0,
            git: 0.0,
        }
    }

    #[test]
    fn matching_directory_ranks_first() {
        let mut s = RecordDistance::new(DistanceVariant::Static, 100, only_pwd());
        s.add_history_record(&rec("make", "/proj", "s", 1.0)).unwrap();
        s.add_history_record(&rec("ls", "/home", "s", 2.0)).unwrap();
        let q = rec("", "/proj", "s", 3.0).stripped();
        assert_eq!(s.candidates(&q), vec!["make", "ls"]);
    }

    #[test]
    fn identical_text_collapses_to_closest_occurrence() {
        let mut s = RecordDistance::new(DistanceVariant::Static, 100, only_pwd());
        s.add_history_record(&rec("make", "/proj", "s", 1.0)).unwrap();
        s.add_history_record(&rec("ls", "/home", "s", 2.0)).unwrap();
        s.add_history_record(&rec("make", "/home", "s", 3.0)).unwrap();
        let q = rec("", "/home", "s", 4.0).stripped();
        // both /home records tie at 0; the more recent one wins
        assert_eq!(s.candidates(&q), vec!["make", "ls"]);
        let q = rec("", "/proj", "s", 4.0).stripped();
        assert_eq!(s.candidates(&q), vec!["make", "ls"]);
    }

    #[test]
    fn ties_broken_by_recency() {
        let mut s = RecordDistance::new(DistanceVariant::Static, 100, only_pwd());
        for c in ["a", "b", "c"] {
            s.add_history_record(&rec(c, "/x", "s", 1.0)).unwrap();
        }
        let q = rec("", "/x", "s", 2.0).stripped();
        assert_eq!(s.candidates(&q), vec!["c", "b", "a"]);
    }

    #[test]
    fn lookback_window_is_bounded() {
        let mut s = RecordDistance::new(DistanceVariant::Static, 2, only_pwd());
        for c in ["a", "b", "c"] {
            s.add_history_record(&rec(c, "/x", "s", 1.0)).unwrap();
        }
        let q = rec("", "/x", "s", 2.0).stripped();
        assert_eq!(s.candidates(&q), vec!["c", "b"]);
    }

    #[test]
    fn static_variant_ignores_git() {
        let s = RecordDistance::new(DistanceVariant::Static, 10, DistanceWeights::default());
        assert_eq!(s.weights.git, 0.0);
        let (title, _) = s.title_and_description();
        assert_eq!(title, "record distance (depth: 10; 10*pwd,10*realpwd,session,time)");
    }

    #[test]
    fn dynamic_title_includes_git() {
        let s = RecordDistance::new(DistanceVariant::Dynamic, 3000, DistanceWeights::default());
        let (title, _) = s.title_and_description();
        assert_eq!(
            title,
            "dynamic record distance (depth: 3000; 10*pwd,10*realpwd,session,time,10*git)"
        );
    }

    #[test]
    fn dynamic_prefers_same_repository() {
        let w = DistanceWeights {
            pwd: 0.0,
            real_pwd: 0.0,
            session: 0.0,
            time: 0.0,
            git: 1.0,
        };
        let mut s = RecordDistance::new(DistanceVariant::Dynamic, 0, w);
        let mut a = rec("cargo build", "/src/a", "s", 1.0);
        a.git_real_dir = "/src/a".into();
        let mut b = rec("npm test", "/src/b", "s", 2.0);
        b.git_real_dir = "/src/b".into();
        let c = rec("ls", "/tmp", "s", 3.0);
        s.add_history_record(&a).unwrap();
        s.add_history_record(&b).unwrap();
        s.add_history_record(&c).unwrap();

        let mut q = rec("", "/src/a/sub", "s", 4.0);
        q.git_real_dir = "/src/a".into();
        assert_eq!(s.candidates(&q.stripped())[0], "cargo build");
    }

    #[test]
    fn dynamic_weight_vanishes_when_value_is_universal() {
        let mut s = RecordDistance::new(DistanceVariant::Dynamic, 0, only_pwd());
        s.add_history_record(&rec("a", "/x", "s", 1.0)).unwrap();
        s.add_history_record(&rec("b", "/x", "s", 1.0)).unwrap();
        let q = rec("", "/x", "s", 2.0);
        let w = s.query_weights(&q);
        assert_eq!(w.pwd, 0.0);
        let q = rec("", "/y", "s", 2.0);
        assert!((s.query_weights(&q).pwd - 2f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn empty_history_gives_nothing() {
        let mut s = RecordDistance::new(DistanceVariant::Dynamic, 10, DistanceWeights::default());
        assert!(s.candidates(&rec("", "/x", "s", 1.0)).is_empty());
    }

    #[test]
    fn reset_clears_history_and_counts() {
        let mut s = RecordDistance::new(DistanceVariant::Dynamic, 10, DistanceWeights::default());
        s.add_history_record(&rec("a", "/x", "s", 1.0)).unwrap();
        s.reset_history().unwrap();
        assert!(s.candidates(&rec("", "/x", "s", 2.0)).is_empty());
        assert_eq!(s.total, 0);
        assert!(s.pwd_counts.is_empty());
    }
}
