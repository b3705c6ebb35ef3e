//! Frequency-gated annotation writer.
//!
//! The controller offers the record set to the writer after every mutation.
//! The writer counts those offers and serializes only when the configured
//! frequency allows it.

use crate::format::error::FormatError;
use crate::format::storage::{AnnotationStorage, StorageFrequency};
use crate::format::traits::WarningSeverity;
use crate::model::ImageAnnotations;

/// Writes annotations to every configured format on a gated schedule.
#[derive(Debug)]
pub struct AnnotationWriter {
    /// Targets and frequency.
    storage: AnnotationStorage,

    /// Number of operations offered so far.
    counter: u64,

    /// Whether operations happened since the last write.
    dirty: bool,
}

impl AnnotationWriter {
    /// Create a writer for the given storage.
    pub fn new(storage: AnnotationStorage) -> Self {
        Self {
            storage,
            counter: 0,
            dirty: false,
        }
    }

    /// Number of operations offered so far.
    pub fn operation_count(&self) -> u64 {
        self.counter
    }

    /// Whether operations happened since the last write.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Record one operation and write if the frequency gate passes.
    ///
    /// Returns whether anything was written.
    pub fn write(&mut self, data: &ImageAnnotations) -> Result<bool, FormatError> {
        self.counter += 1;
        if !self.storage.is_enabled() {
            return Ok(false);
        }
        self.dirty = true;

        let due = match self.storage.frequency {
            StorageFrequency::EveryOperation => true,
            StorageFrequency::EveryNOperations(n) => n > 0 && self.counter % u64::from(n) == 0,
        };
        if !due {
            log::trace!(
                "Writer: operation {} not due ({:?})",
                self.counter,
                self.storage.frequency
            );
            return Ok(false);
        }

        self.write_all(data)?;
        Ok(true)
    }

    /// Write to every configured format regardless of the gate.
    ///
    /// Does nothing when no formats are configured.
    pub fn flush(&mut self, data: &ImageAnnotations) -> Result<(), FormatError> {
        if !self.storage.is_enabled() {
            return Ok(());
        }
        self.write_all(data)
    }

    fn write_all(&mut self, data: &ImageAnnotations) -> Result<(), FormatError> {
        for &storage_type in &self.storage.formats {
            let path = self.storage.path_for(storage_type).ok_or_else(|| {
                FormatError::invalid_format(format!("no path configured for {}", storage_type))
            })?;
            let result = storage_type.format().export(data, path)?;
            if result.has_warnings() {
                let skipped = result
                    .warnings
                    .iter()
                    .filter(|w| w.severity == WarningSeverity::Warning)
                    .count();
                log::debug!(
                    "{} export to {:?}: {} items skipped, {} notes",
                    storage_type,
                    path,
                    skipped,
                    result.warnings.len() - skipped
                );
            }
        }
        self.dirty = false;
        log::trace!("Writer: saved after operation {}", self.counter);
        Ok(())
    }
}
