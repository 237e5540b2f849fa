//! Schedule records keyed by (tuner, channel).

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use super::record::RecordStore;
use super::schedule::ChannelSchedule;

/// Directory under the cache root holding all tuner records.
const LIVETV_DIR: &str = "livetv";
/// Tuner type name, used for host registration and as the record path
/// segment below [`LIVETV_DIR`].
pub const TUNER_TYPE: &str = "vtvguide";

/// Loads and saves [`ChannelSchedule`] records.
///
/// Layout: `{root}/livetv/vtvguide/{tuner_id}/{channel_id}`, one JSON
/// document per channel.
#[derive(Debug, Clone)]
pub struct ScheduleStore<R> {
    records: R,
    root: PathBuf,
}

/// Rejects identifiers that would escape the tuner directory.
fn check_segment(kind: &str, value: &str) -> Result<()> {
    if value.is_empty() || value == "." || value == ".." || value.contains(['/', '\\']) {
        bail!("invalid {kind} id for record path: {value:?}");
    }
    Ok(())
}

impl<R: RecordStore> ScheduleStore<R> {
    /// Creates a store rooted at the given cache directory.
    pub fn new(records: R, root: impl Into<PathBuf>) -> Self {
        Self {
            records,
            root: root.into(),
        }
    }

    /// Cache root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding every channel record of a tuner.
    ///
    /// # Errors
    ///
    /// Returns an error if `tuner_id` is not a single path segment.
    pub fn tuner_dir(&self, tuner_id: &str) -> Result<PathBuf> {
        check_segment("tuner", tuner_id)?;
        Ok(self
            .root
            .join(LIVETV_DIR)
            .join(TUNER_TYPE)
            .join(tuner_id))
    }

    /// Record path of one channel.
    ///
    /// # Errors
    ///
    /// Returns an error if either ID is not a single path segment.
    pub fn channel_path(&self, tuner_id: &str, channel_id: &str) -> Result<PathBuf> {
        check_segment("channel", channel_id)?;
        Ok(self.tuner_dir(tuner_id)?.join(channel_id))
    }

    /// Loads a channel schedule. Returns `Ok(None)` if it was never saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be read or is not a valid schedule.
    pub fn load(&self, tuner_id: &str, channel_id: &str) -> Result<Option<ChannelSchedule>> {
        let path = self.channel_path(tuner_id, channel_id)?;
        let bytes = match self.records.read_record(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()));
            }
        };
        let schedule = serde_json::from_slice(&bytes)
            .with_context(|| format!("failed to parse schedule {}", path.display()))?;
        Ok(Some(schedule))
    }

    /// Saves a channel schedule, replacing any previous record.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, tuner_id: &str, channel_id: &str, schedule: &ChannelSchedule) -> Result<()> {
        let path = self.channel_path(tuner_id, channel_id)?;
        let bytes = serde_json::to_vec(schedule).context("failed to serialize schedule")?;
        self.records
            .write_record(&path, &bytes)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::debug!(
            tuner_id,
            channel_id,
            programs = schedule.programs.len(),
            "Saved channel schedule"
        );
        Ok(())
    }

    /// Deletes every channel record of a tuner. Succeeds if nothing was saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the tuner directory exists but cannot be removed.
    pub fn reset(&self, tuner_id: &str) -> Result<()> {
        let dir = self.tuner_dir(tuner_id)?;
        self.records
            .delete_tree(&dir)
            .with_context(|| format!("failed to remove {}", dir.display()))?;
        tracing::info!(tuner_id, "Removed cached schedules");
        Ok(())
    }
}
