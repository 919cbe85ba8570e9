//! Recency as an interactive shell with a shared history file sees it.
//!
//! A session reads the history file once when it starts and only writes its
//! own commands back when it exits, so concurrent sessions never see each
//! other's live history.

use super::{Strategy, mru_push, session_key};
use crate::EvalError;
use crate::record::Record;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

#[derive(Default)]
pub struct RecentShell {
    /// Persistent history file, most recent first.
    histfile: Rc<Vec<String>>,
    /// History file as each live session loaded it.
    snapshots: HashMap<u64, Rc<Vec<String>>>,
    /// In-session working history, most recent first.
    history: HashMap<u64, VecDeque<String>>,
}

impl RecentShell {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn histfile(&self) -> &[String] {
        &self.histfile
    }
}

impl Strategy for RecentShell {
    fn title_and_description(&self) -> (String, String) {
        ("recent (bash-like)".into(), "Behave like bash".into())
    }

    fn candidates(&mut self, query: &Record) -> Vec<String> {
        let key = query.seq_session_id;
        let snapshot = self
            .snapshots
            .entry(key)
            .or_insert_with(|| Rc::clone(&self.histfile));
        let mut out: Vec<String> = self
            .history
            .get(&key)
            .map(|h| h.iter().cloned().collect())
            .unwrap_or_default();
        out.extend(snapshot.iter().cloned());
        out
    }

    fn add_history_record(&mut self, record: &Record) -> Result<(), EvalError> {
        let key = session_key(record)?;
        mru_push(self.history.entry(key).or_default(), &record.cmd_line);

        if record.last_record_of_session {
            let session = self.history.remove(&key).unwrap_or_default();
            let mut histfile = Vec::with_capacity(session.len() + self.histfile.len());
            histfile.extend(session);
            histfile.extend(self.histfile.iter().cloned());
            self.histfile = Rc::new(histfile);
            self.snapshots.remove(&key);
        }
        Ok(())
    }

    fn reset_history(&mut self) -> Result<(), EvalError> {
        *self = Self::default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(line: &str, session: u64, last: bool) -> Record {
        Record {
            cmd_line: line.into(),
            session_id: format!("s{session}"),
            seq_session_id: session,
            last_record_of_session: last,
            ..Default::default()
        }
    }

    fn step(s: &mut RecentShell, r: &Record) -> Vec<String> {
        let c = s.candidates(&r.stripped());
        s.add_history_record(r).unwrap();
        c
    }

    #[test]
    fn in_session_history_is_mru() {
        let mut s = RecentShell::new();
        step(&mut s, &rec("a", 1, false));
        step(&mut s, &rec("b", 1, false));
        step(&mut s, &rec("a", 1, false));
        assert_eq!(s.candidates(&rec("", 1, false)), vec!["a", "b"]);
    }

    #[test]
    fn concurrent_sessions_do_not_see_each_other() {
        let mut s = RecentShell::new();
        // both sessions start before either writes anything
        assert!(step(&mut s, &rec("x1", 1, false)).is_empty());
        assert!(step(&mut s, &rec("y1", 2, false)).is_empty());
        let c1 = step(&mut s, &rec("x2", 1, false));
        assert_eq!(c1, vec!["x1"]);
        let c2 = step(&mut s, &rec("y2", 2, false));
        assert_eq!(c2, vec!["y1"]);
    }

    #[test]
    fn ended_session_is_prepended_to_histfile() {
        let mut s = RecentShell::new();
        step(&mut s, &rec("old", 1, true));
        assert_eq!(s.histfile(), ["old"]);

        // session 2 starts after session 1 ended and sees its history
        assert_eq!(step(&mut s, &rec("Y", 2, false)), vec!["old"]);
        // session 3 starts while session 2 is live
        assert_eq!(step(&mut s, &rec("z", 3, false)), vec!["old"]);
        step(&mut s, &rec("X", 2, true));
        assert_eq!(s.histfile(), ["X", "Y", "old"]);

        // session 3 keeps its stale snapshot
        assert_eq!(step(&mut s, &rec("w", 3, false)), vec!["z", "old"]);
        // a new session sees the updated file
        assert_eq!(
            s.candidates(&rec("", 4, false)),
            vec!["X", "Y", "old"]
        );
    }

    #[test]
    fn histfile_keeps_duplicates_across_sessions() {
        let mut s = RecentShell::new();
        step(&mut s, &rec("ls", 1, true));
        step(&mut s, &rec("ls", 2, true));
        assert_eq!(s.histfile(), ["ls", "ls"]);
    }

    #[test]
    fn rejects_unannotated_record() {
        let mut s = RecentShell::new();
        assert!(s.add_history_record(&rec("ls", 0, false)).is_err());
    }

    #[test]
    fn reset_clears_everything() {
        let mut s = RecentShell::new();
        step(&mut s, &rec("a", 1, true));
        step(&mut s, &rec("b", 2, false));
        s.reset_history().unwrap();
        assert!(s.histfile().is_empty());
        assert!(s.candidates(&rec("", 2, false)).is_empty());
    }
}
