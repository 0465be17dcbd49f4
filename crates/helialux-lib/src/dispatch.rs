//! Two-step write protocol: manual override, then channel values.
//!
//! The device's programmed profile overrides direct channel writes unless
//! manual mode is switched on first, so every write is
//!
//! ```text
//! Idle → OverrideRequested → OverrideConfirmed → ChannelsRequested → Applied
//!              │                                        │
//!              └──────────────► Failed ◄────────────────┘
//! ```
//!
//! A failure at either request ends the operation. There is no retry and the
//! cache is only touched once the device has accepted both steps.

use std::fmt;
use std::time::Duration;

use crate::device::{DeviceError, SmartControl};
use crate::error::{HelialuxError, Result};
use crate::protocol::DEFAULT_OVERRIDE_DURATION;
use crate::resolver::StateResolver;
use crate::state::Channels;

/// Progress of a single write operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStage {
    Idle,
    OverrideRequested,
    OverrideConfirmed,
    ChannelsRequested,
    Applied,
    Failed,
}

impl fmt::Display for WriteStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WriteStage::Idle => "idle",
            WriteStage::OverrideRequested => "override requested",
            WriteStage::OverrideConfirmed => "override confirmed",
            WriteStage::ChannelsRequested => "channels requested",
            WriteStage::Applied => "applied",
            WriteStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Tracks one write through its stages.
#[derive(Debug)]
pub struct WriteOperation {
    stage: WriteStage,
}

impl Default for WriteOperation {
    fn default() -> Self {
        Self::new()
    }
}

impl WriteOperation {
    pub fn new() -> Self {
        WriteOperation {
            stage: WriteStage::Idle,
        }
    }

    pub fn stage(&self) -> WriteStage {
        self.stage
    }

    fn advance(&mut self, next: WriteStage) {
        log::debug!("write: {} -> {next}", self.stage);
        self.stage = next;
    }

    /// Run one request of the protocol: enter `requested`, and on success
    /// move to `confirmed`. A failure moves to `Failed` and reports the stage
    /// that was pending.
    fn step(
        &mut self,
        requested: WriteStage,
        confirmed: WriteStage,
        request: impl FnOnce() -> std::result::Result<(), DeviceError>,
    ) -> Result<()> {
        self.advance(requested);
        match request() {
            Ok(()) => {
                self.advance(confirmed);
                Ok(())
            }
            Err(source) => {
                self.advance(WriteStage::Failed);
                Err(HelialuxError::Write {
                    stage: requested,
                    source,
                })
            }
        }
    }
}

/// Pushes channel sets through the override-then-write protocol.
#[derive(Debug, Clone)]
pub struct ManualOverrideDispatcher {
    override_duration: Duration,
}

impl Default for ManualOverrideDispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_OVERRIDE_DURATION)
    }
}

impl ManualOverrideDispatcher {
    pub fn new(override_duration: Duration) -> Self {
        ManualOverrideDispatcher { override_duration }
    }

    pub fn override_duration(&self) -> Duration {
        self.override_duration
    }

    /// Apply `channels` and, once the device accepted them, update the cache.
    pub fn apply_channels(
        &self,
        device: &impl SmartControl,
        resolver: &StateResolver,
        channels: Channels,
    ) -> Result<()> {
        let mut op = WriteOperation::new();
        self.run(&mut op, device, channels)
            .inspect_err(|e| log::warn!("{e}"))?;
        resolver.commit_write(channels);
        log::info!("applied {channels} on {}", device.endpoint());
        Ok(())
    }

    fn run(
        &self,
        op: &mut WriteOperation,
        device: &impl SmartControl,
        channels: Channels,
    ) -> Result<()> {
        op.step(
            WriteStage::OverrideRequested,
            WriteStage::OverrideConfirmed,
            || device.enable_manual_override(self.override_duration),
        )?;
        op.step(WriteStage::ChannelsRequested, WriteStage::Applied, || {
            device.set_channels(channels)
        })
    }
}
