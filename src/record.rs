use crate::EvalError;
use serde::{Deserialize, Serialize};

/// One executed command as written by the history collector, plus the
/// fields derived from it at load time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Record {
    // core
    pub cmd_line: String,
    pub exit_code: i32,
    pub shell: String,
    pub uname: String,
    pub session_id: String,

    // posix
    pub cols: String,
    pub lines: String,
    pub home: String,
    pub lang: String,
    pub lc_all: String,
    pub login: String,
    pub pwd: String,
    pub pwd_after: String,
    pub shell_env: String,
    pub term: String,

    // non-posix
    pub real_pwd: String,
    pub real_pwd_after: String,
    pub pid: i64,
    pub session_pid: i64,
    pub host: String,
    pub hosttype: String,
    pub ostype: String,
    pub machtype: String,
    pub shlvl: i64,

    // before/after
    pub timezone_before: String,
    pub timezone_after: String,
    pub realtime_before: f64,
    pub realtime_after: f64,
    pub realtime_before_local: f64,
    pub realtime_after_local: f64,
    pub realtime_duration: f64,
    pub realtime_since_session_start: f64,
    pub realtime_since_boot: f64,

    pub git_dir: String,
    pub git_real_dir: String,
    pub git_origin_remote: String,
    pub machine_id: String,
    pub resh_uuid: String,
    pub resh_version: String,
    pub resh_revision: String,

    pub sanitized: bool,
    pub cmd_length: usize,

    // derived at load time
    pub command: String,
    pub first_word: String,
    pub invalid: bool,
    pub seq_session_id: u64,
    pub last_record_of_session: bool,
    pub debug_this_record: bool,
    pub errors: Vec<String>,
}

/// Older collectors wrote terminal geometry as integers.
#[derive(Debug, Deserialize)]
pub struct LegacyRecord {
    #[serde(default)]
    cols: i64,
    #[serde(default)]
    lines: i64,
    #[serde(flatten)]
    rest: Record,
}

impl From<LegacyRecord> for Record {
    fn from(legacy: LegacyRecord) -> Self {
        Record {
            cols: legacy.cols.to_string(),
            lines: legacy.lines.to_string(),
            ..legacy.rest
        }
    }
}

/// A decoded history line in whichever shape it was written.
#[derive(Debug)]
pub enum RawRecord {
    Current(Record),
    Legacy(LegacyRecord),
}

impl RawRecord {
    /// Try the current shape first, then the legacy one.
    pub fn parse(line: &str) -> Result<RawRecord, String> {
        match serde_json::from_str::<Record>(line) {
            Ok(record) => Ok(RawRecord::Current(record)),
            Err(current) => match serde_json::from_str::<LegacyRecord>(line) {
                Ok(legacy) => Ok(RawRecord::Legacy(legacy)),
                Err(legacy) => Err(format!("{current} (legacy shape: {legacy})")),
            },
        }
    }

    pub fn into_record(self) -> Record {
        match self {
            RawRecord::Current(record) => record,
            RawRecord::Legacy(legacy) => legacy.into(),
        }
    }
}

/// Per-feature weights for [`Record::distance_to`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistanceWeights {
    pub pwd: f64,
    pub real_pwd: f64,
    pub session: f64,
    pub time: f64,
    pub git: f64,
}

impl Default for DistanceWeights {
    fn default() -> Self {
        Self {
            pwd: 10.0,
            real_pwd: 10.0,
            session: 1.0,
            time: 1.0,
            git: 10.0,
        }
    }
}

impl DistanceWeights {
    pub fn is_valid(&self) -> bool {
        [self.pwd, self.real_pwd, self.session, self.time, self.git]
            .iter()
            .all(|w| w.is_finite() && *w >= 0.0)
    }
}

/// Split a command line into (command, first word).
/// The command is the first token that is not a `NAME=value` assignment.
fn command_and_first_word(cmd_line: &str) -> Option<(String, String)> {
    let mut tokens = cmd_line.split_whitespace();
    let first = tokens.next()?;
    let command = std::iter::once(first)
        .chain(tokens)
        .find(|t| !is_assignment(t))?;
    Some((command.to_string(), first.to_string()))
}

fn is_assignment(token: &str) -> bool {
    match token.split_once('=') {
        Some((name, _)) => {
            !name.is_empty()
                && !name.starts_with(|c: char| c.is_ascii_digit())
                && name.chars().all(|c| c == '_' || c.is_ascii_alphanumeric())
        }
        None => false,
    }
}

impl Record {
    /// Validate a freshly decoded record and fill in its derived fields.
    ///
    /// In unsanitized mode the raw data must not carry `cmdLength`; it is
    /// computed here as the character count of the command line. In
    /// sanitized mode the redaction step already set it. Either way a zero
    /// length or a `sanitized` flag that disagrees with the mode is fatal.
    pub fn enrich(mut self, sanitized_mode: bool) -> Result<Record, EvalError> {
        if !sanitized_mode {
            if self.cmd_length != 0 {
                return Err(EvalError::InvalidRecord(
                    "'cmdLength' is set in raw data, is the input sanitized?".into(),
                ));
            }
            self.cmd_length = self.cmd_line.chars().count();
        }
        if self.cmd_length == 0 {
            return Err(EvalError::InvalidRecord(
                "'cmdLength' is unset in the data".into(),
            ));
        }
        if self.sanitized != sanitized_mode {
            return Err(EvalError::InvalidRecord(if sanitized_mode {
                "sanitized input was requested but data is not sanitized".into()
            } else {
                "data is sanitized but sanitized input was not requested".into()
            }));
        }

        match command_and_first_word(&self.cmd_line) {
            Some((command, first_word)) => {
                self.command = command;
                self.first_word = first_word;
            }
            None => {
                self.invalid = true;
                self.errors
                    .push(format!("no command in command line {:?}", self.cmd_line));
            }
        }
        Ok(self)
    }

    /// Copy with everything that reveals the outcome withheld: the command
    /// itself, its exit code, every after-execution field and whether the
    /// session ends here.
    pub fn stripped(&self) -> Record {
        Record {
            cmd_line: String::new(),
            command: String::new(),
            first_word: String::new(),
            cmd_length: 0,
            exit_code: 0,
            pwd_after: String::new(),
            real_pwd_after: String::new(),
            realtime_after: 0.0,
            realtime_after_local: 0.0,
            realtime_duration: 0.0,
            timezone_after: String::new(),
            last_record_of_session: false,
            ..self.clone()
        }
    }

    /// Weighted dissimilarity between two records; lower is more similar.
    pub fn distance_to(&self, other: &Record, weights: &DistanceWeights) -> f64 {
        let mut dist = 0.0;
        if self.pwd != other.pwd {
            dist += weights.pwd;
        }
        if self.real_pwd != other.real_pwd {
            dist += weights.real_pwd;
        }
        if self.session_id != other.session_id {
            dist += weights.session;
        }
        dist += weights.git * self.git_distance(other);

        // One unit per order of magnitude; sub-second gaps go negative.
        let time = (self.realtime_before - other.realtime_before).abs().log10() * weights.time;
        if time.is_finite() {
            dist += time;
        }
        dist
    }

    /// 0 for the same repository checkout, 0.5 for another checkout of the
    /// same remote, 1 otherwise.
    fn git_distance(&self, other: &Record) -> f64 {
        if self.git_real_dir == other.git_real_dir {
            0.0
        } else if !self.git_origin_remote.is_empty()
            && self.git_origin_remote == other.git_origin_remote
        {
            0.5
        } else {
            1.0
        }
    }

    pub fn to_pretty_string(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("<unprintable record: {e}>"))
    }
}
