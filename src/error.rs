// src/error.rs

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("could not open {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("could not flush input on {port}: {source}")]
    Flush {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("serial read failed: {0}")]
    Read(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum LogError {
    #[error("could not open log {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not write log row: {0}")]
    Write(#[from] std::io::Error),
}

#[derive(Debug, Error)]
#[error("could not write {}: {source}", .path.display())]
pub struct ExportError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings format: {0}")]
    Json(#[from] serde_json::Error),
}
