//! Append-only key-log file.

use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, OnceLock};

use crate::error::Error;
use crate::line::{HEADER, KeyLogLine};
use crate::secret::{ClientRandom, MasterSecret};

/// Destination for newly observed session secrets.
pub trait KeyLogSink {
    /// Record one secret. Returns `Ok(false)` when logging is disabled.
    fn record(&self, client_random: &ClientRandom, secret: &MasterSecret) -> Result<bool, Error>;
}

/// Key-log file opened on first use and kept open for the process lifetime.
///
/// The open happens at most once: a missing path or a failed open disables
/// the writer for good.
#[derive(Debug)]
pub struct KeyLogWriter {
    path: Option<PathBuf>,
    file: OnceLock<Option<File>>,
}

impl KeyLogWriter {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            file: OnceLock::new(),
        }
    }

    /// Open the file if that has not been attempted yet.
    ///
    /// Returns the open file, or `None` when logging is disabled.
    pub fn ensure_open(&self) -> Option<&File> {
        self.file
            .get_or_init(|| {
                let path = self.path.as_deref()?;
                match open_keylog(path) {
                    Ok(file) => {
                        tracing::info!(path = %path.display(), "key log opened");
                        Some(file)
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "cannot open key log, secrets will not be written"
                        );
                        None
                    }
                }
            })
            .as_ref()
    }

    /// Append one `CLIENT_RANDOM` line with a single write.
    pub fn append(
        &self,
        client_random: &ClientRandom,
        secret: &MasterSecret,
    ) -> Result<bool, Error> {
        let Some(mut file) = self.ensure_open() else {
            return Ok(false);
        };

        let line = KeyLogLine::encode(client_random, secret)?;
        // One write(2) on an O_APPEND descriptor keeps concurrent lines whole.
        file.write_all(line.as_bytes())?;
        tracing::trace!(secret_len = secret.len(), "secret written to key log");
        Ok(true)
    }
}

impl KeyLogSink for KeyLogWriter {
    fn record(&self, client_random: &ClientRandom, secret: &MasterSecret) -> Result<bool, Error> {
        self.append(client_random, secret)
    }
}

/// Open `path` for appending, writing the header if the file is empty.
fn open_keylog(path: &Path) -> Result<File, Error> {
    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .mode(0o644)
        .open(path)?;

    if file.seek(SeekFrom::End(0))? == 0 {
        if let Err(e) = file.write_all(HEADER) {
            tracing::warn!(path = %path.display(), error = %e, "cannot write key log header");
        }
    }

    Ok(file)
}

static GLOBAL: LazyLock<KeyLogWriter> =
    LazyLock::new(|| KeyLogWriter::new(crate::config::global().keylog_file.clone()));

/// Process-wide writer targeting `SSLKEYLOGFILE`.
pub fn global() -> &'static KeyLogWriter {
    &GLOBAL
}
