//! Characteristic-level facade over one SmartControl unit.
//!
//! A [`Light`] is what a home-automation accessory wraps: a get/set pair per
//! characteristic (power, brightness, and in color mode hue and saturation).
//! Every read goes through [`StateResolver::resolve`]; every write resolves
//! the current channels as a baseline, computes the new channel set and hands
//! it to the [`ManualOverrideDispatcher`].

use std::time::Duration;

use crate::color::{self, Hsl, Rgb};
use crate::config::Config;
use crate::device::{DeviceEndpoint, HttpDevice, SmartControl};
use crate::dispatch::ManualOverrideDispatcher;
use crate::error::{HelialuxError, Result};
use crate::resolver::StateResolver;
use crate::state::{Channels, LightState};

/// One light, its cache and its write protocol. Built by injection.
pub struct Light<D: SmartControl> {
    device: D,
    resolver: StateResolver,
    dispatcher: ManualOverrideDispatcher,
    color_mode: bool,
}

impl Light<HttpDevice> {
    /// Build an HTTP-backed light from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        if config.host.trim().is_empty() {
            return Err(HelialuxError::Config(
                "no device host configured (set `host` or pass --host)".into(),
            ));
        }
        let endpoint = DeviceEndpoint::new(config.host.trim(), config.port)
            .with_timeout(Duration::from_millis(config.request_timeout_ms));
        let device = HttpDevice::new(endpoint)?;
        Ok(Light::new(
            device,
            StateResolver::new(Duration::from_millis(config.freshness_window_ms)),
            ManualOverrideDispatcher::new(Duration::from_secs(config.override_minutes * 60)),
            config.color_mode,
        ))
    }
}

impl<D: SmartControl> Light<D> {
    pub fn new(
        device: D,
        resolver: StateResolver,
        dispatcher: ManualOverrideDispatcher,
        color_mode: bool,
    ) -> Self {
        Light {
            device,
            resolver,
            dispatcher,
            color_mode,
        }
    }

    /// Default freshness window and override duration.
    pub fn with_defaults(device: D, color_mode: bool) -> Self {
        Self::new(
            device,
            StateResolver::default(),
            ManualOverrideDispatcher::default(),
            color_mode,
        )
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn resolver(&self) -> &StateResolver {
        &self.resolver
    }

    pub fn color_mode(&self) -> bool {
        self.color_mode
    }

    // ── raw state ──

    pub fn state(&self) -> Result<LightState> {
        self.resolver.resolve(&self.device)
    }

    /// Push a full channel set.
    pub fn set_channels(&self, channels: Channels) -> Result<()> {
        self.dispatcher
            .apply_channels(&self.device, &self.resolver, channels)
    }

    /// Apply `update` to the resolved channels and write the result, unless
    /// it equals what the light already shows.
    fn update(&self, update: impl FnOnce(Channels) -> Channels) -> Result<()> {
        let current = self.state()?.channels;
        let target = update(current);
        if target == current {
            log::debug!("no change ({current}), skipping write");
            return Ok(());
        }
        self.set_channels(target)
    }

    // ── power ──

    pub fn is_on(&self) -> Result<bool> {
        Ok(self.state()?.on)
    }

    /// On switches every channel to full; off darkens every channel.
    pub fn set_on(&self, on: bool) -> Result<()> {
        self.update(|current| match (on, current.is_on()) {
            (true, true) | (false, false) => current,
            (true, false) => Channels::FULL,
            (false, true) => Channels::OFF,
        })
    }

    // ── brightness ──

    /// Highest channel value.
    pub fn brightness(&self) -> Result<u8> {
        Ok(self.state()?.channels.max())
    }

    /// Scale the channels so the highest becomes `level`.
    pub fn set_brightness(&self, level: u8) -> Result<()> {
        self.update(|current| current.scaled_to(level))
    }

    // ── color ──

    fn require_color_mode(&self) -> Result<()> {
        if self.color_mode {
            Ok(())
        } else {
            Err(HelialuxError::Config("color mode is disabled".into()))
        }
    }

    /// HSL view of the color channels.
    pub fn hsl(&self) -> Result<Hsl> {
        self.require_color_mode()?;
        Ok(self.state()?.hsl())
    }

    pub fn hue(&self) -> Result<u16> {
        Ok(self.hsl()?.h)
    }

    pub fn saturation(&self) -> Result<u8> {
        Ok(self.hsl()?.s)
    }

    /// Write a new HSL color, keeping white.
    pub fn set_hsl(&self, hsl: Hsl) -> Result<()> {
        self.require_color_mode()?;
        self.update(|current| current.with_rgb(color::hsl_to_rgb(hsl)))
    }

    /// Change one HSL axis of the current color, keeping the other two and white.
    fn modify_hsl(&self, modify: impl FnOnce(&mut Hsl)) -> Result<()> {
        self.require_color_mode()?;
        self.update(|current| {
            let mut hsl = color::rgb_to_hsl(current.rgb());
            modify(&mut hsl);
            current.with_rgb(color::hsl_to_rgb(hsl))
        })
    }

    pub fn set_hue(&self, hue: u16) -> Result<()> {
        self.modify_hsl(|hsl| hsl.h = hue.min(360))
    }

    pub fn set_saturation(&self, saturation: u8) -> Result<()> {
        self.modify_hsl(|hsl| hsl.s = saturation.min(100))
    }

    /// Write an RGB color, keeping white.
    pub fn set_color(&self, rgb: Rgb) -> Result<()> {
        self.update(|current| current.with_rgb(rgb))
    }
}
