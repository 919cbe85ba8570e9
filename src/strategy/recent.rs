use super::{SimpleStrategy, mru_push};
use crate::EvalError;
use crate::record::Record;
use std::collections::VecDeque;

/// Most-recently-used list, each command line at most once.
#[derive(Default)]
pub struct Recent {
    history: VecDeque<String>,
}

impl Recent {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SimpleStrategy for Recent {
    fn title_and_description(&self) -> (String, String) {
        ("recent".into(), "Use recent commands".into())
    }

    fn candidates(&self) -> Vec<String> {
        self.history.iter().cloned().collect()
    }

    fn add_history_record(&mut self, record: &Record) -> Result<(), EvalError> {
        mru_push(&mut self.history, &record.cmd_line);
        Ok(())
    }

    fn reset_history(&mut self) -> Result<(), EvalError> {
        self.history.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(line: &str) -> Record {
        Record {
            cmd_line: line.into(),
            seq_session_id: 1,
            ..Default::default()
        }
    }

    #[test]
    fn dedups_most_recent_first() {
        let mut s = Recent::new();
        for c in ["A", "B", "A", "C"] {
            s.add_history_record(&cmd(c)).unwrap();
        }
        assert_eq!(s.candidates(), vec!["C", "A", "B"]);
    }

    #[test]
    fn reset_clears() {
        let mut s = Recent::new();
        s.add_history_record(&cmd("ls")).unwrap();
        s.reset_history().unwrap();
        assert!(s.candidates().is_empty());
    }
}
