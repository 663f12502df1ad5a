// src/monitor.rs
//
// The acquisition state machine: connection + logging sessions, rolling
// buffer and the poll cycle. Everything runs on the UI thread; the front-end
// fires `poll` with the ticket it was handed and forwards user commands.

use std::path::PathBuf;

use chrono::Local;

use crate::buffer::RollingBuffer;
use crate::datalog::{self, LogSession};
use crate::device::{Connector, PortConfig};
use crate::parser::{latest_sample, LineFramer};
use crate::sample::{classify, Sample, Verdict};
use crate::session::{ConnectionSession, ConnectionState, PollTicket};
use crate::settings::Settings;

// ---------------- Collaborators ----------------

/// Status notifications for the operator.
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Connected { port: String, baud_rate: u32 },
    ConnectFailed { port: String, reason: String },
    Disconnected,
    ConnectionLost { reason: String },
    LoggingStarted(PathBuf),
    LoggingStopped(PathBuf),
    /// Log start refused because there is no connection.
    LoggingRefused,
    LoggingFailed(String),
    LogWriteFailed(String),
    BufferReset,
    Exported(PathBuf),
    ExportFailed(String),
}

pub trait Presenter {
    /// A new sample was taken into the buffer.
    fn reading(&mut self, snapshot: &[Sample], sample: Sample, verdict: &Verdict);

    fn status(&mut self, status: Status);
}

/// Asks the operator where to write files. `None` means cancelled.
pub trait DestinationChooser {
    fn log_destination(&mut self, suggested_name: &str) -> Option<PathBuf>;
    fn export_destination(&mut self, suggested_name: &str) -> Option<PathBuf>;
}

// ---------------- Monitor ----------------

pub struct Monitor<C: Connector> {
    session: ConnectionSession<C>,
    log: LogSession,
    framer: LineFramer,
    buffer: RollingBuffer,
    threshold: f64,
}

impl<C: Connector> Monitor<C> {
    pub fn new(connector: C, settings: &Settings) -> Self {
        Self {
            session: ConnectionSession::new(connector, settings.port_config()),
            log: LogSession::default(),
            framer: LineFramer::default(),
            buffer: RollingBuffer::new(settings.max_points),
            threshold: settings.threshold_ppm,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.session.state()
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    pub fn is_logging(&self) -> bool {
        self.log.is_active()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn buffer(&self) -> &RollingBuffer {
        &self.buffer
    }

    pub fn log_session(&self) -> &LogSession {
        &self.log
    }

    pub fn port_config(&self) -> &PortConfig {
        self.session.config()
    }

    /// Ignored (returns false) while connected.
    pub fn set_port_config(&mut self, config: PortConfig) -> bool {
        self.session.set_config(config)
    }

    /// The outstanding poll, if the loop is alive.
    pub fn scheduled_poll(&self) -> Option<PollTicket> {
        self.session.scheduled()
    }

    /// (Re)connects. An existing connection is torn down first.
    pub fn connect(&mut self, presenter: &mut dyn Presenter) {
        if self.session.is_connected() {
            log::info!("reconnecting: closing {}", self.session.config().port_name);
            self.teardown(presenter);
        }

        let port = self.session.config().port_name.clone();
        let baud_rate = self.session.config().baud_rate;
        match self.session.open() {
            Ok(()) => {
                self.framer.clear();
                self.session.arm();
                log::info!("connected to {port} @ {baud_rate}");
                presenter.status(Status::Connected { port, baud_rate });
            }
            Err(e) => {
                log::error!("serial connect failed: {e}");
                presenter.status(Status::ConnectFailed {
                    port,
                    reason: e.to_string(),
                });
            }
        }
    }

    pub fn disconnect(&mut self, presenter: &mut dyn Presenter) {
        if !self.session.is_connected() {
            return;
        }
        self.teardown(presenter);
        log::info!("disconnected from {}", self.session.config().port_name);
        presenter.status(Status::Disconnected);
    }

    /// Cancel schedule -> stop logging -> close device. Always in that order.
    fn teardown(&mut self, presenter: &mut dyn Presenter) {
        self.session.cancel();
        if let Some(path) = self.log.stop() {
            log::info!("log closed: {}", path.display());
            presenter.status(Status::LoggingStopped(path));
        }
        self.session.close();
        self.framer.clear();
    }

    /// Disconnect and release everything; the caller then quits the UI.
    pub fn exit(&mut self, presenter: &mut dyn Presenter) {
        self.disconnect(presenter);
        log::info!("exiting");
    }

    /// One poll cycle. Stale tickets are ignored; the loop re-arms itself
    /// only while connected.
    pub fn poll(&mut self, ticket: PollTicket, presenter: &mut dyn Presenter) {
        if !self.session.take_due(ticket) {
            log::trace!("ignoring stale poll {ticket:?}");
            return;
        }
        if !self.session.is_connected() {
            return;
        }

        let bytes = match self.session.drain() {
            Ok(bytes) => bytes,
            Err(e) => {
                log::error!("serial read failed, closing connection: {e}");
                self.teardown(presenter);
                presenter.status(Status::ConnectionLost {
                    reason: e.to_string(),
                });
                return;
            }
        };

        let lines = self.framer.push_chunk(&bytes);
        if let Some(sample) = latest_sample(&lines) {
            self.take_sample(sample, presenter);
        }

        self.session.arm();
    }

    fn take_sample(&mut self, sample: Sample, presenter: &mut dyn Presenter) {
        self.buffer.insert(sample);
        let verdict = classify(sample, self.threshold);

        if self.log.is_active() {
            if let Err(e) = self.log.append(sample, &verdict, &Local::now()) {
                log::error!("log write failed: {e}");
                presenter.status(Status::LogWriteFailed(e.to_string()));
            }
        }

        presenter.reading(&self.buffer.snapshot(), sample, &verdict);
    }

    /// Start/stop command. Starting needs a live connection and a chosen
    /// destination.
    pub fn toggle_logging(
        &mut self,
        chooser: &mut dyn DestinationChooser,
        presenter: &mut dyn Presenter,
    ) {
        if self.log.is_active() {
            if let Some(path) = self.log.stop() {
                log::info!("log stopped: {}", path.display());
                presenter.status(Status::LoggingStopped(path));
            }
            return;
        }

        if !self.session.is_connected() {
            log::warn!("log start refused: not connected");
            presenter.status(Status::LoggingRefused);
            return;
        }

        let Some(path) = chooser.log_destination(&datalog::suggested_log_name()) else {
            log::debug!("log start cancelled");
            return;
        };

        match self.log.start(&path) {
            Ok(()) => {
                log::info!("log started: {}", path.display());
                presenter.status(Status::LoggingStarted(path));
            }
            Err(e) => {
                log::error!("{e}");
                presenter.status(Status::LoggingFailed(e.to_string()));
            }
        }
    }

    pub fn reset_buffer(&mut self, presenter: &mut dyn Presenter) {
        self.buffer.reset();
        presenter.status(Status::BufferReset);
    }

    pub fn export_snapshot(
        &self,
        chooser: &mut dyn DestinationChooser,
        presenter: &mut dyn Presenter,
    ) {
        let Some(path) = chooser.export_destination(datalog::SUGGESTED_EXPORT_NAME) else {
            return;
        };
        match datalog::export_csv(&path, &self.buffer.snapshot()) {
            Ok(()) => {
                log::info!("buffer exported to {}", path.display());
                presenter.status(Status::Exported(path));
            }
            Err(e) => {
                log::error!("{e}");
                presenter.status(Status::ExportFailed(e.to_string()));
            }
        }
    }
}
