//! Panel device discovery and ownership
//!
//! Finds the display panel among attached USB devices, opens it and claims
//! its interface. The rusb types are reached through the [`UsbCandidate`]
//! and [`UsbHandle`] traits so discovery can be exercised without hardware.

use rusb::{Context, Device, DeviceHandle, UsbContext};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Panel vendor ID
pub const PANEL_VENDOR_ID: u16 = 0x2982;

/// Panel product ID
pub const PANEL_PRODUCT_ID: u16 = 0x1967;

/// Device class "defined per interface"
pub const PANEL_DEVICE_CLASS: u8 = 0x00;

/// Interface carrying the display endpoint
pub const PANEL_INTERFACE: u8 = 0;

/// Why no panel handle could be obtained
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("Failed to initialize USB context: {0}")]
    Context(#[source] rusb::Error),

    #[error("Failed to get USB device list: {0}")]
    Enumerate(#[source] rusb::Error),

    #[error("No panel found (vid={vendor_id:#06x}, pid={product_id:#06x})")]
    NotFound { vendor_id: u16, product_id: u16 },

    #[error("Failed to open panel: {0}")]
    Open(#[source] rusb::Error),

    #[error("Failed to claim panel interface, may be in use by another application")]
    InUse,

    #[error("Failed to claim panel interface: {0}")]
    Claim(#[source] rusb::Error),
}

impl DeviceError {
    fn not_found() -> Self {
        DeviceError::NotFound {
            vendor_id: PANEL_VENDOR_ID,
            product_id: PANEL_PRODUCT_ID,
        }
    }
}

/// Descriptor fields used to recognise the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub vendor_id: u16,
    pub product_id: u16,
    pub class_code: u8,
    pub bus_number: u8,
    pub address: u8,
}

impl DeviceIdentity {
    /// Whether this descriptor belongs to the display panel
    pub fn is_panel(&self) -> bool {
        self.class_code == PANEL_DEVICE_CLASS
            && self.vendor_id == PANEL_VENDOR_ID
            && self.product_id == PANEL_PRODUCT_ID
    }
}

/// An open USB connection
///
/// Dropping the handle closes the connection.
pub trait UsbHandle: Send + Sync + 'static {
    fn claim_interface(&mut self, interface: u8) -> Result<(), rusb::Error>;

    fn release_interface(&mut self, interface: u8) -> Result<(), rusb::Error>;

    /// Blocking bulk OUT transfer, returning the bytes written
    fn write_bulk(&self, endpoint: u8, buf: &[u8], timeout: Duration) -> Result<usize, rusb::Error>;
}

/// An enumerated device that may be opened
pub trait UsbCandidate {
    type Handle: UsbHandle;

    fn identity(&self) -> Result<DeviceIdentity, rusb::Error>;

    fn open(&self) -> Result<Self::Handle, rusb::Error>;
}

impl<T: UsbContext + 'static> UsbHandle for DeviceHandle<T> {
    fn claim_interface(&mut self, interface: u8) -> Result<(), rusb::Error> {
        DeviceHandle::claim_interface(self, interface)
    }

    fn release_interface(&mut self, interface: u8) -> Result<(), rusb::Error> {
        DeviceHandle::release_interface(self, interface)
    }

    fn write_bulk(&self, endpoint: u8, buf: &[u8], timeout: Duration) -> Result<usize, rusb::Error> {
        DeviceHandle::write_bulk(self, endpoint, buf, timeout)
    }
}

impl<T: UsbContext + 'static> UsbCandidate for Device<T> {
    type Handle = DeviceHandle<T>;

    fn identity(&self) -> Result<DeviceIdentity, rusb::Error> {
        let descriptor = self.device_descriptor()?;
        Ok(DeviceIdentity {
            vendor_id: descriptor.vendor_id(),
            product_id: descriptor.product_id(),
            class_code: descriptor.class_code(),
            bus_number: self.bus_number(),
            address: self.address(),
        })
    }

    fn open(&self) -> Result<Self::Handle, rusb::Error> {
        Device::open(self)
    }
}

/// Opened panel with its interface claimed
///
/// Dropping it releases the interface and then closes the connection.
pub struct PanelDevice<H: UsbHandle> {
    handle: H,
    identity: DeviceIdentity,
}

impl<H: UsbHandle> PanelDevice<H> {
    /// Claim the panel interface on an opened handle
    ///
    /// On failure the handle is dropped, closing the connection.
    pub fn claim(mut handle: H, identity: DeviceIdentity) -> Result<Self, DeviceError> {
        if let Err(e) = handle.claim_interface(PANEL_INTERFACE) {
            drop(handle);
            return Err(match e {
                rusb::Error::Busy => DeviceError::InUse,
                other => DeviceError::Claim(other),
            });
        }

        debug!(
            "Claimed interface {} on bus={}, addr={}",
            PANEL_INTERFACE, identity.bus_number, identity.address
        );
        Ok(Self { handle, identity })
    }

    pub fn identity(&self) -> DeviceIdentity {
        self.identity
    }

    /// Bulk OUT transfer on the claimed connection
    pub fn write_bulk(&self, endpoint: u8, buf: &[u8], timeout: Duration) -> Result<usize, rusb::Error> {
        self.handle.write_bulk(endpoint, buf, timeout)
    }

    /// Release the interface and close the connection
    pub fn close(self) {
        drop(self);
    }
}

impl<H: UsbHandle> Drop for PanelDevice<H> {
    fn drop(&mut self) {
        if let Err(e) = self.handle.release_interface(PANEL_INTERFACE) {
            warn!("Failed to release interface {}: {}", PANEL_INTERFACE, e);
        }
        debug!(
            "Closed panel on bus={}, addr={}",
            self.identity.bus_number, self.identity.address
        );
    }
}

/// Open the first panel among `candidates`
///
/// Devices that fail to open or claim are skipped; the last such failure is
/// returned if no panel could be opened. A candidate whose descriptor cannot
/// be read is ignored.
pub fn find_panel<C, I>(candidates: I) -> Result<PanelDevice<C::Handle>, DeviceError>
where
    C: UsbCandidate,
    I: IntoIterator<Item = C>,
{
    let mut last_error = None;

    for candidate in candidates {
        let identity = match candidate.identity() {
            Ok(identity) => identity,
            Err(e) => {
                warn!("Failed to get USB device descriptor: {}", e);
                continue;
            }
        };

        if !identity.is_panel() {
            continue;
        }

        let handle = match candidate.open() {
            Ok(handle) => handle,
            Err(e) => {
                warn!(
                    "Failed to open panel on bus={}, addr={}: {}",
                    identity.bus_number, identity.address, e
                );
                last_error = Some(DeviceError::Open(e));
                continue;
            }
        };

        match PanelDevice::claim(handle, identity) {
            Ok(device) => {
                info!(
                    "Opened panel {:04x}:{:04x} on bus={}, addr={}",
                    identity.vendor_id, identity.product_id, identity.bus_number, identity.address
                );
                return Ok(device);
            }
            Err(e) => {
                warn!(
                    "Panel on bus={}, addr={} not usable: {}",
                    identity.bus_number, identity.address, e
                );
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(DeviceError::not_found))
}

/// Identities of every attached panel, without opening any of them
pub fn list_panels<C, I>(candidates: I) -> Vec<DeviceIdentity>
where
    C: UsbCandidate,
    I: IntoIterator<Item = C>,
{
    candidates
        .into_iter()
        .filter_map(|candidate| candidate.identity().ok())
        .filter(DeviceIdentity::is_panel)
        .collect()
}

/// Enumerate the system bus and open the first panel
pub fn open_panel() -> Result<PanelDevice<DeviceHandle<Context>>, DeviceError> {
    let context = Context::new().map_err(DeviceError::Context)?;
    let devices = context.devices().map_err(DeviceError::Enumerate)?;
    debug!("Enumerated {} USB devices", devices.len());
    find_panel(devices.iter())
}

/// Enumerate the system bus and list attached panels
pub fn enumerate_panels() -> Result<Vec<DeviceIdentity>, DeviceError> {
    let context = Context::new().map_err(DeviceError::Context)?;
    let devices = context.devices().map_err(DeviceError::Enumerate)?;
    Ok(list_panels(devices.iter()))
}
