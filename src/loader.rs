//! Reading history files, either a single file or a
//! `<root>/<user>/<device>/<file>` tree.

use crate::EvalError;
use crate::record::{RawRecord, Record};
use log::{info, warn};
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeviceRecords {
    pub name: String,
    pub records: Vec<Record>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserRecords {
    pub name: String,
    pub devices: Vec<DeviceRecords>,
}

/// Load and enrich one newline-delimited JSON history file. Any line that
/// fails to decode or enrich aborts the load.
pub fn load_history_records(path: &Path, sanitized: bool) -> Result<Vec<Record>, EvalError> {
    let file = File::open(path)?;
    let mut records = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let lineno = i + 1;
        let raw = RawRecord::parse(&line).map_err(|message| EvalError::Decode {
            path: path.to_path_buf(),
            line: lineno,
            message,
        })?;
        let record = raw.into_record().enrich(sanitized).map_err(|e| match e {
            EvalError::InvalidRecord(msg) => {
                EvalError::InvalidRecord(format!("{}:{lineno}: {msg}", path.display()))
            }
            other => other,
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Single-file mode: one anonymous user with one anonymous device.
pub fn load_single(path: &Path, sanitized: bool) -> Result<Vec<UserRecords>, EvalError> {
    let records = load_history_records(path, sanitized)?;
    info!("loaded {} records from {}", records.len(), path.display());
    Ok(vec![UserRecords {
        name: String::new(),
        devices: vec![DeviceRecords {
            name: String::new(),
            records,
        }],
    }])
}

/// Sorted directory listing.
fn list_dir(dir: &Path) -> Result<Vec<(String, PathBuf)>, EvalError> {
    let mut entries: Vec<(String, PathBuf)> = std::fs::read_dir(dir)?
        .map(|e| e.map(|e| (e.file_name().to_string_lossy().into_owned(), e.path())))
        .collect::<Result<_, _>>()?;
    entries.sort();
    Ok(entries)
}

/// Batch mode: every `<root>/<user>/<device>/<file_name>`. Stray files where
/// a directory is expected are skipped with a warning; an unreadable or
/// missing root is fatal.
pub fn load_batch(
    root: &Path,
    file_name: &str,
    sanitized: bool,
) -> Result<Vec<UserRecords>, EvalError> {
    let meta = std::fs::metadata(root).map_err(|e| {
        EvalError::Io(std::io::Error::new(
            e.kind(),
            format!("data root {}: {e}", root.display()),
        ))
    })?;
    if !meta.is_dir() {
        return Err(EvalError::Io(std::io::Error::new(
            std::io::ErrorKind::NotADirectory,
            format!("data root {} is not a directory", root.display()),
        )));
    }

    info!("listing users in {}", root.display());
    let mut users = Vec::new();
    for (user_name, user_path) in list_dir(root)? {
        if !user_path.is_dir() {
            warn!("unexpected file (not a directory) {} - skipping", user_path.display());
            continue;
        }
        info!("*- {user_name}");
        let mut user = UserRecords {
            name: user_name,
            devices: Vec::new(),
        };

        for (device_name, device_path) in list_dir(&user_path)? {
            if !device_path.is_dir() {
                warn!("unexpected file (not a directory) {} - skipping", device_path.display());
                continue;
            }
            info!("   \\- {device_name}");
            let mut device = DeviceRecords {
                name: device_name,
                records: Vec::new(),
            };
            for (name, path) in list_dir(&device_path)? {
                if name == file_name {
                    device.records = load_history_records(&path, sanitized)?;
                    info!("      \\- {name} - loaded {} records", device.records.len());
                } else {
                    info!("      \\- {name} - skipped");
                }
            }
            user.devices.push(device);
        }
        users.push(user);
    }
    Ok(users)
}
