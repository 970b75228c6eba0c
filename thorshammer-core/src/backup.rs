use chrono::NaiveDate;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{error::PersistenceError, model::WeatherReport};

/// Writes the collected reports to `weather_backup_<YYYY-MM-DD>.json`.
#[derive(Debug, Clone)]
pub struct BackupWriter {
    dir: PathBuf,
}

impl BackupWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(backup_file_name(date))
    }

    /// Overwrites any backup already written for `date`.
    pub fn write(
        &self,
        date: NaiveDate,
        reports: &[WeatherReport],
    ) -> Result<PathBuf, PersistenceError> {
        let path = self.path_for(date);

        let mut buf = Vec::new();
        let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        reports.serialize(&mut ser)?;

        fs::write(&path, buf)
            .map_err(|source| PersistenceError::WriteFailure { path: path.clone(), source })?;

        Ok(path)
    }
}

pub fn backup_file_name(date: NaiveDate) -> String {
    format!("weather_backup_{}.json", date.format("%Y-%m-%d"))
}
