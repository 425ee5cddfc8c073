//! Device geolocation
//!
//! The platform's position source (GPS receiver, OS location service, a
//! fixed terminal position) sits behind [`DeviceLocator`]. Requests carry
//! [`PositionOptions`] the same way a browser position request does.

use crate::config::LocationConfig;
use crate::constants::timing::{DEVICE_MAXIMUM_AGE_SECS, DEVICE_REQUEST_TIMEOUT_SECS};
use crate::coord::Coordinates;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Preferences passed with a position request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    /// Ask for the most precise fix the device can give
    pub enable_high_accuracy: bool,
    /// How long the device may take before giving up
    pub timeout: Duration,
    /// Oldest cached fix that is acceptable
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: false,
            timeout: Duration::from_secs(DEVICE_REQUEST_TIMEOUT_SECS),
            maximum_age: Duration::from_secs(DEVICE_MAXIMUM_AGE_SECS),
        }
    }
}

impl PositionOptions {
    pub fn from_config(config: &LocationConfig) -> Self {
        Self {
            enable_high_accuracy: config.high_accuracy,
            timeout: Duration::from_secs(config.request_timeout_secs),
            maximum_age: Duration::from_secs(config.maximum_age_secs),
        }
    }
}

/// Why the device gave no position
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PositionError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("position unavailable: {0}")]
    Unavailable(String),

    #[error("position request timed out")]
    Timeout,
}

/// A source of the device's current position
pub trait DeviceLocator: Send + Sync {
    fn current_position(
        &self,
        options: &PositionOptions,
    ) -> impl Future<Output = Result<Coordinates, PositionError>> + Send;
}

/// No location capability at all
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDevice;

impl DeviceLocator for NoDevice {
    async fn current_position(&self, _options: &PositionOptions) -> Result<Coordinates, PositionError> {
        Err(PositionError::Unavailable("no location device".to_string()))
    }
}

/// A device that always reports one configured position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedDevice {
    position: Coordinates,
}

impl FixedDevice {
    pub fn new(position: Coordinates) -> Self {
        Self { position }
    }
}

impl DeviceLocator for FixedDevice {
    async fn current_position(&self, _options: &PositionOptions) -> Result<Coordinates, PositionError> {
        Ok(self.position)
    }
}

/// Device chosen from configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfiguredDevice {
    None,
    Fixed(FixedDevice),
}

impl ConfiguredDevice {
    /// `Fixed` when both `fixed_lat` and `fixed_lng` are set, otherwise `None`
    pub fn from_config(config: &LocationConfig) -> Self {
        match (config.fixed_lat, config.fixed_lng) {
            (Some(lat), Some(lng)) => Self::Fixed(FixedDevice::new(Coordinates::new(lat, lng))),
            _ => Self::None,
        }
    }
}

impl DeviceLocator for ConfiguredDevice {
    async fn current_position(&self, options: &PositionOptions) -> Result<Coordinates, PositionError> {
        match self {
            Self::None => NoDevice.current_position(options).await,
            Self::Fixed(device) => device.current_position(options).await,
        }
    }
}
