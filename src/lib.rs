//! TDS water-quality monitor core.
//!
//! Reads `label=value,suffix` lines from a serial TDS sensor, keeps a rolling
//! window for the chart, flags readings at or above the contamination
//! threshold and optionally writes a fixed-width timestamped log.
//!
//! [`monitor::Monitor`] owns all state; the front-end drives it with poll
//! tickets and user commands and receives updates through
//! [`monitor::Presenter`].

pub mod buffer;
pub mod datalog;
pub mod device;
pub mod error;
pub mod monitor;
pub mod parser;
pub mod sample;
pub mod session;
pub mod settings;

pub use buffer::{RollingBuffer, MAX_POINTS};
pub use device::{Connector, DeviceLink, PortConfig, PortEntry, SerialConnector};
pub use monitor::{DestinationChooser, Monitor, Presenter, Status};
pub use sample::{classify, Sample, Severity, Verdict};
pub use session::{ConnectionState, PollTicket};
pub use settings::Settings;
