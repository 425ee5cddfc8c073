//! Current location resolution
//!
//! Device position first, bounded by an outer timeout, then IP geolocation
//! as the fallback. Failures on either path are logged and turn into "no
//! result"; nothing is retried.

use crate::coord::Coordinates;
use crate::geo::device::{DeviceLocator, PositionError, PositionOptions};
use crate::geo::ip_location::IpLocationBackend;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Where a resolved location came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationSource {
    Device,
    Ip,
}

/// A resolved current location
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    #[serde(flatten)]
    pub coords: Coordinates,
    pub source: LocationSource,
}

/// Device-then-IP location resolver
#[derive(Debug)]
pub struct LocationResolver<D, I> {
    device: D,
    ip: I,
    options: PositionOptions,
    device_timeout: Duration,
    use_device: bool,
}

impl<D: DeviceLocator, I: IpLocationBackend> LocationResolver<D, I> {
    /// # Arguments
    /// * `device` - Position source tried first
    /// * `ip` - Fallback IP location service
    /// * `options` - Preferences handed to the device request
    /// * `device_timeout` - Outer bound on the device attempt
    pub fn new(device: D, ip: I, options: PositionOptions, device_timeout: Duration) -> Self {
        Self {
            device,
            ip,
            options,
            device_timeout,
            use_device: true,
        }
    }

    /// Skip the device and go straight to IP geolocation
    pub fn without_device(mut self) -> Self {
        self.use_device = false;
        self
    }

    /// Whether the device is tried before IP geolocation
    pub fn uses_device(&self) -> bool {
        self.use_device
    }

    pub fn options(&self) -> &PositionOptions {
        &self.options
    }

    pub fn device_timeout(&self) -> Duration {
        self.device_timeout
    }

    /// Resolve the current location, `None` if neither path produced one
    pub async fn resolve(&self) -> Option<ResolvedLocation> {
        if self.use_device {
            if let Some(coords) = self.device_position().await {
                info!(lat = coords.lat, lng = coords.lng, "located via device");
                return Some(ResolvedLocation {
                    coords,
                    source: LocationSource::Device,
                });
            }
        }

        match self.ip.locate().await {
            Ok(Some(coords)) => {
                info!(lat = coords.lat, lng = coords.lng, "located via IP");
                Some(ResolvedLocation {
                    coords,
                    source: LocationSource::Ip,
                })
            }
            Ok(None) => {
                warn!("IP location returned no usable position");
                None
            }
            Err(e) => {
                warn!(error = %e, "IP location failed");
                None
            }
        }
    }

    /// Device position raced against the outer timeout
    ///
    /// The request itself is bounded by `options.timeout`; a device that
    /// ignores it is still cut off by the outer bound.
    async fn device_position(&self) -> Option<Coordinates> {
        let request = async {
            tokio::time::timeout(self.options.timeout, self.device.current_position(&self.options))
                .await
                .unwrap_or(Err(PositionError::Timeout))
        };

        match tokio::time::timeout(self.device_timeout, request).await {
            Ok(Ok(coords)) if coords.is_valid() => Some(coords),
            Ok(Ok(coords)) => {
                debug!(lat = coords.lat, lng = coords.lng, "device reported invalid position");
                None
            }
            Ok(Err(e)) => {
                debug!(error = %e, "device position unavailable");
                None
            }
            Err(_) => {
                debug!(timeout = ?self.device_timeout, "device position timed out");
                None
            }
        }
    }
}

impl<D, I> LocationResolver<D, I>
where
    D: DeviceLocator + 'static,
    I: IpLocationBackend + 'static,
{
    /// Run [`resolve`](Self::resolve) as a background task
    ///
    /// The returned handle can cancel the pending request; dropping it
    /// cancels too.
    pub fn spawn(self: Arc<Self>) -> LocationTask {
        let handle = tokio::spawn(async move { self.resolve().await });
        LocationTask {
            handle: Some(handle),
        }
    }
}

/// Handle to a location resolution running in the background
#[derive(Debug)]
pub struct LocationTask {
    handle: Option<JoinHandle<Option<ResolvedLocation>>>,
}

impl LocationTask {
    /// Abort the pending resolution
    pub fn cancel(&self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the result; a cancelled task yields `None`
    pub async fn join(mut self) -> Option<ResolvedLocation> {
        let handle = self.handle.take()?;
        match handle.await {
            Ok(location) => location,
            Err(e) if e.is_cancelled() => {
                debug!("location task cancelled");
                None
            }
            Err(e) => {
                warn!(error = %e, "location task failed");
                None
            }
        }
    }
}

impl Drop for LocationTask {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
