//! Persisted tuning store over an erase-before-write medium.

use crate::error::ConfigError;
use crate::record::{self, RECORD_LEN};
use crate::tuning::TuningParams;
use bias_traits::NvStorage;

/// Where the effective tuning came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TuningSource {
    Stored,
    Defaults,
}

impl TuningSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stored => "stored",
            Self::Defaults => "defaults",
        }
    }
}

pub struct ConfigStore<S: NvStorage> {
    storage: S,
    offset: usize,
}

fn io_err(e: &(dyn std::error::Error + Send + Sync)) -> ConfigError {
    ConfigError::Io(e.to_string())
}

/// Erase the record area and program `bytes` into it. An all-erased image
/// needs no program pass.
fn write_record<S: NvStorage>(
    storage: &mut S,
    offset: usize,
    bytes: &[u8; RECORD_LEN],
) -> Result<(), ConfigError> {
    storage
        .erase(offset, RECORD_LEN)
        .map_err(|e| io_err(&*e))?;
    if bytes.iter().all(|&b| b == 0xFF) {
        return Ok(());
    }
    storage.program(offset, bytes).map_err(|e| io_err(&*e))
}

impl<S: NvStorage> ConfigStore<S> {
    pub fn new(storage: S, offset: usize) -> Self {
        Self { storage, offset }
    }

    /// Read and validate the stored record. `defaults` supplies the fields
    /// that are not persisted (gain).
    pub fn load(&mut self, defaults: &TuningParams) -> Result<TuningParams, ConfigError> {
        let mut buf = [0u8; RECORD_LEN];
        self.storage
            .read(self.offset, &mut buf)
            .map_err(|e| io_err(&*e))?;
        record::decode(&buf, defaults.gain())
    }

    /// Stored tuning, or `defaults` when the record is absent or unreadable.
    pub fn load_or_default(&mut self, defaults: TuningParams) -> (TuningParams, TuningSource) {
        match self.load(&defaults) {
            Ok(p) => {
                tracing::info!(
                    tolerance_v = p.tolerance_v(),
                    quad_buffer = p.quad_buffer(),
                    peak_buffer = p.peak_buffer(),
                    null_buffer = p.null_buffer(),
                    "tuning loaded from storage"
                );
                (p, TuningSource::Stored)
            }
            Err(ConfigError::NotFound) => {
                tracing::info!("no stored tuning; using defaults");
                (defaults, TuningSource::Defaults)
            }
            Err(e) => {
                tracing::warn!(error = %e, "stored tuning rejected; using defaults");
                (defaults, TuningSource::Defaults)
            }
        }
    }

    /// Commit `params`. Erase and program run as one critical section so no
    /// interrupt-driven state change can observe a half-written block.
    ///
    /// On failure the previous record bytes are written back, so a later
    /// `load` sees either the new record or the old one.
    pub fn save(&mut self, params: &TuningParams) -> Result<(), ConfigError> {
        let bytes = record::encode(params);
        let offset = self.offset;
        let mut previous = [0u8; RECORD_LEN];
        self.storage
            .read(offset, &mut previous)
            .map_err(|e| io_err(&*e))?;

        let storage = &mut self.storage;
        critical_section::with(|_cs| -> Result<(), ConfigError> {
            let written = write_record(storage, offset, &bytes).and_then(|()| {
                let mut back = [0u8; RECORD_LEN];
                storage.read(offset, &mut back).map_err(|e| io_err(&*e))?;
                if back == bytes {
                    Ok(())
                } else {
                    Err(ConfigError::Io("read-back verify mismatch".into()))
                }
            });
            if let Err(e) = &written {
                match write_record(storage, offset, &previous) {
                    Ok(()) => {
                        tracing::warn!(error = %e, "tuning save failed; previous record restored");
                    }
                    Err(restore) => tracing::error!(
                        error = %e,
                        restore_error = %restore,
                        "tuning save failed and previous record could not be restored"
                    ),
                }
            }
            written
        })?;
        tracing::debug!(offset, "tuning record committed");
        Ok(())
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_inner(self) -> S {
        self.storage
    }
}
