use super::{Strategy, mru_push};
use crate::EvalError;
use crate::record::Record;
use std::collections::{HashMap, HashSet, VecDeque};

/// Recent commands from the query's working directory first, then the rest
/// of the global recency list.
#[derive(Default)]
pub struct DirectorySensitive {
    by_dir: HashMap<String, VecDeque<String>>,
    global: VecDeque<String>,
    /// Where the previous command left the shell; used when a query carries
    /// no working directory of its own.
    last_pwd: String,
}

impl DirectorySensitive {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Strategy for DirectorySensitive {
    fn title_and_description(&self) -> (String, String) {
        (
            "directory sensitive (recent)".into(),
            "Use recent commands executed in the same directory".into(),
        )
    }

    fn candidates(&mut self, query: &Record) -> Vec<String> {
        let pwd = if query.pwd.is_empty() {
            &self.last_pwd
        } else {
            &query.pwd
        };
        let local = self.by_dir.get(pwd);
        let seen: HashSet<&str> = local
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect();

        local
            .into_iter()
            .flatten()
            .chain(self.global.iter().filter(|c| !seen.contains(c.as_str())))
            .cloned()
            .collect()
    }

    fn add_history_record(&mut self, record: &Record) -> Result<(), EvalError> {
        mru_push(
            self.by_dir.entry(record.pwd.clone()).or_default(),
            &record.cmd_line,
        );
        mru_push(&mut self.global, &record.cmd_line);
        self.last_pwd = if record.pwd_after.is_empty() {
            record.pwd.clone()
        } else {
            record.pwd_after.clone()
        };
        Ok(())
    }

    fn reset_history(&mut self) -> Result<(), EvalError> {
        *self = Self::default();
        Ok(())
    }
}
