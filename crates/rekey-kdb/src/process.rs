//! Process-backed [`KdbAdmin`](crate::KdbAdmin): shells out to a
//! `kadmin`-style administrative CLI rather than linking a KDB client
//! library directly, so the server has no compile-time dependency on
//! any one KDC implementation's admin API.
//!
//! The adapter command is invoked as:
//!
//! ```text
//! <command> get-kvno <principal>
//! <command> commit-keys <principal> <new-kvno> <enctype>:<hex-key> [<enctype>:<hex-key> ...]
//! ```
//!
//! and is expected to print the kvno as a bare decimal integer on
//! stdout for `get-kvno`, exit 0 on success for `commit-keys`, and
//! exit with a distinguished status (2) when the principal does not
//! exist, so the two KDB-side failure cases `COMMITKEY` must
//! distinguish — "principal disappeared" vs. any other failure — are
//! observable without scraping stderr text.

use tokio::process::Command;

use crate::error::{KdbError, Result};
use crate::KeySetEntry;

/// Exit status the adapter command uses to signal "principal not
/// found", distinct from any other failure.
const EXIT_NOT_FOUND: i32 = 2;

/// A [`KdbAdmin`](crate::KdbAdmin) implementation that shells out to an
/// external administrative command for every call.
#[derive(Debug, Clone)]
pub struct ProcessKdb {
    command: String,
}

impl ProcessKdb {
    /// Build an adapter that invokes `command` as described above.
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<std::process::Output> {
        Command::new(&self.command)
            .args(args)
            .output()
            .await
            .map_err(KdbError::Io)
    }
}

#[async_trait::async_trait]
impl crate::KdbAdmin for ProcessKdb {
    async fn current_kvno(&self, principal: &str) -> Result<i64> {
        let output = self.run(&["get-kvno", principal]).await?;
        match output.status.code() {
            Some(0) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                stdout
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| KdbError::UnexpectedOutput(stdout.trim().to_string()))
            }
            Some(EXIT_NOT_FOUND) => Err(KdbError::NotFound),
            _ => Err(KdbError::CommandFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            )),
        }
    }

    async fn commit_keys(&self, principal: &str, new_kvno: i64, keys: &[KeySetEntry]) -> Result<()> {
        let kvno_str = new_kvno.to_string();
        let key_args: Vec<String> = keys
            .iter()
            .map(|(enctype, key)| format!("{enctype}:{}", hex_encode(key)))
            .collect();

        let mut args: Vec<&str> = vec!["commit-keys", principal, &kvno_str];
        args.extend(key_args.iter().map(String::as_str));

        let output = self.run(&args).await?;
        match output.status.code() {
            Some(0) => Ok(()),
            Some(EXIT_NOT_FOUND) => Err(KdbError::NotFound),
            _ => Err(KdbError::CommandFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            )),
        }
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_encode_is_lowercase_and_zero_padded() {
        assert_eq!(hex_encode(&[0x0a, 0xff, 0x00]), "0aff00");
    }
}
