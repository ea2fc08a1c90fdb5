//! Connection and recording state, with start/stop arbitration.
//!
//! `recording == true` always implies `connected == true`; a transport
//! disconnect forces recording off unconditionally.

use thiserror::Error;
use tracing::{info, warn};

use crate::wire::TransportCommand;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    /// A start/stop command arrived while the transport was down.
    #[error("transport is not connected")]
    NotConnected,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionLifecycle {
    connected: bool,
    recording: bool,
}

impl ConnectionLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn on_connected(&mut self) {
        self.connected = true;
        info!("transport connected");
    }

    /// A disconnect always forces recording off, whatever came before.
    /// Returns true when a recording was interrupted.
    pub fn on_disconnected(&mut self) -> bool {
        let interrupted = self.recording;
        self.connected = false;
        self.recording = false;
        if interrupted {
            warn!("transport dropped mid-recording");
        } else {
            info!("transport disconnected");
        }
        interrupted
    }

    /// `Ok(Some)` on the idle→recording transition, `Ok(None)` when already
    /// recording, `Err` when the transport is down (no state change).
    pub fn start(&mut self) -> Result<Option<TransportCommand>, CommandError> {
        if !self.connected {
            warn!("start_recording rejected: transport is not connected");
            return Err(CommandError::NotConnected);
        }
        if self.recording {
            return Ok(None);
        }
        self.recording = true;
        info!("recording started");
        Ok(Some(TransportCommand::StartRecording))
    }

    /// Symmetric to [`start`](Self::start); stop while already stopped is a
    /// no-op.
    pub fn stop(&mut self) -> Result<Option<TransportCommand>, CommandError> {
        if !self.connected {
            warn!("stop_recording rejected: transport is not connected");
            return Err(CommandError::NotConnected);
        }
        if !self.recording {
            return Ok(None);
        }
        self.recording = false;
        info!("recording stopped");
        Ok(Some(TransportCommand::StopRecording))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_disconnected_and_idle() {
        let lifecycle = ConnectionLifecycle::new();
        assert!(!lifecycle.is_connected());
        assert!(!lifecycle.is_recording());
    }

    #[test]
    fn start_while_disconnected_is_rejected_without_state_change() {
        let mut lifecycle = ConnectionLifecycle::new();
        assert_eq!(lifecycle.start(), Err(CommandError::NotConnected));
        assert!(!lifecycle.is_recording());
    }

    #[test]
    fn start_while_connected_emits_the_command() {
        let mut lifecycle = ConnectionLifecycle::new();
        lifecycle.on_connected();
        assert_eq!(lifecycle.start(), Ok(Some(TransportCommand::StartRecording)));
        assert!(lifecycle.is_recording());
    }

    #[test]
    fn duplicate_start_is_a_no_op() {
        let mut lifecycle = ConnectionLifecycle::new();
        lifecycle.on_connected();
        lifecycle.start().unwrap();
        assert_eq!(lifecycle.start(), Ok(None));
        assert!(lifecycle.is_recording());
    }

    #[test]
    fn stop_mirrors_start() {
        let mut lifecycle = ConnectionLifecycle::new();
        lifecycle.on_connected();
        lifecycle.start().unwrap();
        assert_eq!(lifecycle.stop(), Ok(Some(TransportCommand::StopRecording)));
        assert!(!lifecycle.is_recording());
        assert_eq!(lifecycle.stop(), Ok(None));
    }

    #[test]
    fn disconnect_forces_recording_off_unconditionally() {
        let mut lifecycle = ConnectionLifecycle::new();
        lifecycle.on_connected();
        lifecycle.start().unwrap();
        assert!(lifecycle.on_disconnected());
        assert!(!lifecycle.is_connected());
        assert!(!lifecycle.is_recording());

        // Disconnecting while idle reports no interruption.
        lifecycle.on_connected();
        assert!(!lifecycle.on_disconnected());
    }

    #[test]
    fn recording_implies_connected() {
        let mut lifecycle = ConnectionLifecycle::new();
        lifecycle.on_connected();
        lifecycle.start().unwrap();
        lifecycle.on_disconnected();
        // The invariant holds across every reachable state transition here:
        // recording can only be set by start(), which requires connected.
        assert!(!lifecycle.is_recording() || lifecycle.is_connected());
    }
}
