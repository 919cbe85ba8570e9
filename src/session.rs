//! Session bookkeeping over one device's chronological record list.
//!
//! Both annotation passes are pure functions of the input order, so running
//! them again on their own output reproduces it exactly.

use crate::record::Record;
use rand::Rng;
use std::collections::{HashMap, HashSet};

/// Dense session ids in first-seen order, starting at 1 (0 means unset).
pub fn seq_session_ids(records: &[Record]) -> Vec<u64> {
    let mut ids: HashMap<&str, u64> = HashMap::new();
    let mut next = 1;
    records
        .iter()
        .map(|r| {
            *ids.entry(r.session_id.as_str()).or_insert_with(|| {
                let id = next;
                next += 1;
                id
            })
        })
        .collect()
}

/// `true` for the chronologically last record of every session.
pub fn last_of_session(records: &[Record]) -> Vec<bool> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut flags = vec![false; records.len()];
    for (i, r) in records.iter().enumerate().rev() {
        if seen.insert(r.session_id.as_str()) {
            flags[i] = true;
        }
    }
    flags
}

/// Apply both passes, returning the annotated records.
pub fn annotate(records: Vec<Record>) -> Vec<Record> {
    let ids = seq_session_ids(&records);
    let last = last_of_session(&records);
    records
        .into_iter()
        .zip(ids.into_iter().zip(last))
        .map(|(record, (seq_session_id, last_record_of_session))| Record {
            seq_session_id,
            last_record_of_session,
            ..record
        })
        .collect()
}

/// The records that exited successfully, with the terminal flags recomputed
/// so each session still ends on its last kept record. Session ids are kept.
pub fn without_failed(records: &[Record]) -> Vec<Record> {
    let kept: Vec<Record> = records
        .iter()
        .filter(|r| r.exit_code == 0)
        .cloned()
        .collect();
    let last = last_of_session(&kept);
    kept.into_iter()
        .zip(last)
        .map(|(record, last_record_of_session)| Record {
            last_record_of_session,
            ..record
        })
        .collect()
}

/// Flag roughly `rate` of the records for verbose inspection. Independent
/// of record content; a rate of 0 clears every flag.
pub fn sample_debug<R: Rng>(records: &mut [Record], rate: f64, rng: &mut R) {
    for record in records.iter_mut() {
        record.debug_this_record = rate > 0.0 && rng.gen_bool(rate.min(1.0));
    }
}
