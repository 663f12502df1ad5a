// src/session.rs
//
// Device connection lifecycle + the single outstanding poll ticket.

use crate::device::{Connector, DeviceLink, PortConfig};
use crate::error::DeviceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Identifies one armed poll. A firing whose ticket is no longer the
/// outstanding one was cancelled and must be ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PollTicket(u64);

pub struct ConnectionSession<C: Connector> {
    connector: C,
    config: PortConfig,
    state: ConnectionState,
    link: Option<C::Link>,
    scheduled: Option<PollTicket>,
    issued: u64,
}

impl<C: Connector> ConnectionSession<C> {
    pub fn new(connector: C, config: PortConfig) -> Self {
        Self {
            connector,
            config,
            state: ConnectionState::Disconnected,
            link: None,
            scheduled: None,
            issued: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn config(&self) -> &PortConfig {
        &self.config
    }

    /// Port/baud can only change while disconnected.
    pub fn set_config(&mut self, config: PortConfig) -> bool {
        if self.state != ConnectionState::Disconnected {
            return false;
        }
        self.config = config;
        true
    }

    pub fn scheduled(&self) -> Option<PollTicket> {
        self.scheduled
    }

    /// Opens the device. Caller must have torn down any previous link.
    pub fn open(&mut self) -> Result<(), DeviceError> {
        debug_assert!(self.link.is_none() && self.scheduled.is_none());
        self.state = ConnectionState::Connecting;
        match self.connector.open(&self.config) {
            Ok(link) => {
                self.link = Some(link);
                self.state = ConnectionState::Connected;
                Ok(())
            }
            Err(e) => {
                self.state = ConnectionState::Disconnected;
                Err(e)
            }
        }
    }

    /// Drops the handle. Safe to call in any state.
    pub fn close(&mut self) {
        self.scheduled = None;
        self.link = None;
        self.state = ConnectionState::Disconnected;
    }

    /// Arms the next poll, replacing (cancelling) any outstanding one.
    pub fn arm(&mut self) -> PollTicket {
        self.issued += 1;
        let ticket = PollTicket(self.issued);
        self.scheduled = Some(ticket);
        ticket
    }

    pub fn cancel(&mut self) -> Option<PollTicket> {
        self.scheduled.take()
    }

    /// Consumes `ticket` if it is the outstanding one.
    pub fn take_due(&mut self, ticket: PollTicket) -> bool {
        if self.scheduled == Some(ticket) {
            self.scheduled = None;
            true
        } else {
            false
        }
    }

    /// Pending input; empty when disconnected.
    pub fn drain(&mut self) -> Result<Vec<u8>, DeviceError> {
        match self.link.as_mut() {
            Some(link) => link.drain(),
            None => Ok(Vec::new()),
        }
    }
}
