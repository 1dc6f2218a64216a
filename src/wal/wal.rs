use crate::models::user::User;
use anyhow::{anyhow, bail, Context, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::Mutex;

/// WAL operation types
#[derive(Debug, Clone, PartialEq)]
pub enum WalOperation {
    SaveUser(User),
    DeleteUser { id: u64 },
}

fn flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value {
        "1" => Ok(true),
        "0" => Ok(false),
        other => bail!("Invalid flag '{}'", other),
    }
}

fn encode_pin(pin: Option<&str>) -> String {
    // "-" is never valid hex, so it cannot collide with an encoded PIN
    pin.map(hex::encode).unwrap_or_else(|| "-".to_string())
}

fn decode_text(value: &str) -> Result<String> {
    let bytes = hex::decode(value).context("Invalid hex field")?;
    String::from_utf8(bytes).context("Field is not valid UTF-8")
}

impl WalOperation {
    fn encode(&self) -> String {
        match self {
            WalOperation::SaveUser(user) => {
                // Hex keeps the separator out of free-text fields
                format!(
                    "SAVE_USER|{}|{}|{}|{}|{}|{}|{}",
                    user.id,
                    hex::encode(&user.installation_id),
                    hex::encode(&user.username),
                    encode_pin(user.pin.as_deref()),
                    user.serial_id,
                    flag(user.active),
                    flag(user.is_new_user),
                )
            }
            WalOperation::DeleteUser { id } => format!("DELETE_USER|{}", id),
        }
    }

    fn decode(line: &str) -> Result<Self> {
        let parts: Vec<&str> = line.split('|').collect();

        match parts.first() {
            Some(&"SAVE_USER") => {
                if parts.len() != 8 {
                    bail!("Invalid SAVE_USER format");
                }
                let id = parts[1].parse::<u64>().context("Invalid user ID")?;
                let installation_id = decode_text(parts[2]).context("Invalid installation_id")?;
                let username = decode_text(parts[3]).context("Invalid username")?;
                let pin = match parts[4] {
                    "-" => None,
                    pin => Some(decode_text(pin).context("Invalid pin")?),
                };
                let serial_id = parts[5].parse::<usize>().context("Invalid serial ID")?;
                let active = parse_flag(parts[6]).context("Invalid active flag")?;
                let is_new_user = parse_flag(parts[7]).context("Invalid new-user flag")?;

                Ok(WalOperation::SaveUser(User {
                    id,
                    installation_id,
                    username,
                    pin,
                    serial_id,
                    active,
                    is_new_user,
                }))
            }
            Some(&"DELETE_USER") => {
                if parts.len() != 2 {
                    bail!("Invalid DELETE_USER format");
                }
                let id = parts[1].parse::<u64>().context("Invalid user ID")?;
                Ok(WalOperation::DeleteUser { id })
            }
            _ => bail!("Unknown operation type"),
        }
    }
}

/// Append-only log of user store mutations
pub struct Wal {
    file: Mutex<File>,
    path: PathBuf,
}

impl Wal {
    pub fn new(path: PathBuf) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .context(format!("Failed to open WAL file {}", path.display()))?;

        Ok(Wal {
            file: Mutex::new(file),
            path,
        })
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn log_operation(&self, op: &WalOperation) -> Result<()> {
        self.log_operations(std::slice::from_ref(op))
    }

    /// Append several operations with a single write
    pub fn log_operations(&self, ops: &[WalOperation]) -> Result<()> {
        let mut batch = String::new();
        for op in ops {
            batch.push_str(&op.encode());
            batch.push('\n');
        }

        let mut file = self.file.lock().map_err(|_| anyhow!("WAL lock poisoned"))?;
        file.write_all(batch.as_bytes()).context("Failed to write to WAL")?;
        file.flush().context("Failed to flush WAL")?;
        Ok(())
    }

    pub fn replay(&self) -> Result<Vec<WalOperation>> {
        let file = File::open(&self.path).context("Failed to open WAL for replay")?;
        let reader = BufReader::new(file);
        let mut operations = Vec::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result.context("Failed to read line from WAL")?;
            let line = line.trim();

            if line.is_empty() {
                continue;
            }

            match WalOperation::decode(line) {
                Ok(op) => operations.push(op),
                Err(e) => {
                    tracing::warn!(
                        line_num = line_num + 1,
                        error = %e,
                        "Failed to parse WAL line, skipping"
                    );
                }
            }
        }

        Ok(operations)
    }
}
