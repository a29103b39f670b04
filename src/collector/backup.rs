use super::sensor::SensorReading;
use crate::error::SolarError;
use chrono::{Local, NaiveDate};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{info, warn};

/// Daily JSON files holding readings that could not be uploaded.
#[derive(Debug, Clone)]
pub struct BackupStore {
    dir: PathBuf,
}

impl BackupStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_for(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("backup_data_{}.json", date.format("%Y%m%d")))
    }

    /// Append to today's file.
    pub fn append(&self, reading: &SensorReading) -> Result<PathBuf, SolarError> {
        self.append_on(Local::now().date_naive(), reading)
    }

    /// Append to the file for `date`.
    ///
    /// The file is replaced atomically. An existing file that no longer parses
    /// is moved to `<name>.corrupt` and a fresh one is started.
    pub fn append_on(&self, date: NaiveDate, reading: &SensorReading) -> Result<PathBuf, SolarError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.file_for(date);
        let mut entries = match self.load_on(date) {
            Ok(entries) => entries,
            Err(SolarError::Json(e)) => {
                let aside = path.with_extension("json.corrupt");
                warn!(path = %path.display(), error = %e, "backup file unreadable; moving it aside");
                fs::rename(&path, &aside)?;
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        entries.push(reading.clone());
        self.replace(&path, &entries)?;
        info!(path = %path.display(), entries = entries.len(), "reading saved to local backup");
        Ok(path)
    }

    fn replace(&self, path: &Path, entries: &[SensorReading]) -> Result<(), SolarError> {
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        serde_json::to_writer_pretty(&mut tmp, entries)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    pub fn load_on(&self, date: NaiveDate) -> Result<Vec<SensorReading>, SolarError> {
        let path = self.file_for(date);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}
