// src/datalog.rs
//
// Timestamped TDS log (fixed-width text) and CSV export of the chart buffer.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeZone};

use crate::error::{ExportError, LogError};
use crate::sample::{Sample, Verdict};

pub fn header_row() -> String {
    format!(
        "{:<15}{:<20}{:<20}{:<15}",
        "Date", "Time", "TDS value (ppm)", "Contamination"
    )
}

pub fn data_row<Tz: TimeZone>(sample: Sample, verdict: &Verdict, at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let date = at.format("%Y-%m-%d").to_string();
    let time = at.format("%H:%M:%S%.3f").to_string();
    format!(
        "{:<15}{:<20}{:<20.2}{:<15}",
        date,
        time,
        sample.ppm(),
        verdict.flag()
    )
}

pub fn suggested_log_name() -> String {
    format!("TDS_Log_{}.txt", Local::now().format("%Y%m%d_%H%M%S"))
}

pub const SUGGESTED_EXPORT_NAME: &str = "TDS_Data_Buffer.csv";

// ---------------- Logging session ----------------

struct ActiveLog {
    path: PathBuf,
    out: Box<dyn Write + Send>,
}

/// `Inactive` until `start` succeeds; `stop` is idempotent.
#[derive(Default)]
pub struct LogSession {
    active: Option<ActiveLog>,
}

impl std::fmt::Debug for LogSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogSession")
            .field("path", &self.path())
            .finish()
    }
}

impl LogSession {
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn path(&self) -> Option<&Path> {
        self.active.as_ref().map(|a| a.path.as_path())
    }

    /// Creates (or truncates) `path` and writes the column header.
    /// On error the session stays inactive.
    pub fn start(&mut self, path: &Path) -> Result<(), LogError> {
        let open_err = |source| LogError::Open {
            path: path.to_path_buf(),
            source,
        };
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(open_err)?;
        self.start_with_writer(path, Box::new(file))
    }

    /// Same as `start`, but rows go to `out`; `path` only labels the log.
    pub fn start_with_writer(
        &mut self,
        path: &Path,
        mut out: Box<dyn Write + Send>,
    ) -> Result<(), LogError> {
        self.stop();

        let open_err = |source| LogError::Open {
            path: path.to_path_buf(),
            source,
        };
        writeln!(out, "{}", header_row()).map_err(open_err)?;
        out.flush().map_err(open_err)?;

        self.active = Some(ActiveLog {
            path: path.to_path_buf(),
            out,
        });
        Ok(())
    }

    /// One row, flushed straight away. Does nothing while inactive.
    pub fn append<Tz: TimeZone>(
        &mut self,
        sample: Sample,
        verdict: &Verdict,
        at: &DateTime<Tz>,
    ) -> Result<(), LogError>
    where
        Tz::Offset: std::fmt::Display,
    {
        let Some(active) = self.active.as_mut() else {
            return Ok(());
        };
        writeln!(active.out, "{}", data_row(sample, verdict, at))?;
        active.out.flush()?;
        Ok(())
    }

    /// Returns the path of the log that was closed, if any.
    pub fn stop(&mut self) -> Option<PathBuf> {
        let mut active = self.active.take()?;
        if let Err(e) = active.out.flush() {
            log::error!("final flush of {}: {e}", active.path.display());
        }
        Some(active.path)
    }
}

// ---------------- Export ----------------

/// Two-column CSV of the whole snapshot, oldest first.
pub fn export_csv(path: &Path, snapshot: &[Sample]) -> Result<(), ExportError> {
    let write = || -> std::io::Result<()> {
        let mut out = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        writeln!(out, "Sample,TDS value (ppm)")?;
        for (i, s) in snapshot.iter().enumerate() {
            writeln!(out, "{},{}", i, s.ppm())?;
        }
        out.flush()
    };
    write().map_err(|source| ExportError {
        path: path.to_path_buf(),
        source,
    })
}
