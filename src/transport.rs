//! USB transport abstraction.

use rusb::{Direction, TransferType};

/// USB endpoint of a claimed interface.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub struct Endpoint {
    pub address: u8,
    pub direction: Direction,
    pub transfer_type: TransferType,
}

/// USB bus capable of opening devices.
pub trait UsbBus {
    type Link: UsbLink;

    /// Open the first device matching the vendor and product ID.
    ///
    /// Returns `None` if no such device is attached.
    fn open(&self, vendor_id: u16, product_id: u16) -> Result<Option<Self::Link>, rusb::Error>;
}

/// Opened USB device.
pub trait UsbLink {
    /// Perform a USB port reset.
    fn reset(&mut self) -> Result<(), rusb::Error>;

    /// Activate the device's first configuration.
    fn set_default_configuration(&mut self) -> Result<(), rusb::Error>;

    /// Claim an interface for exclusive use.
    fn claim_interface(&mut self, interface: u8) -> Result<(), rusb::Error>;

    /// Release a previously claimed interface.
    fn release_interface(&mut self, interface: u8) -> Result<(), rusb::Error>;

    /// All endpoints of an interface's alternate setting, in descriptor order.
    fn endpoints(&self, interface: u8, setting: u8) -> Result<Vec<Endpoint>, rusb::Error>;

    /// Write data to an OUT endpoint, returning the number of bytes written.
    fn write(&mut self, endpoint: &Endpoint, data: &[u8]) -> Result<usize, rusb::Error>;

    /// Read data from an IN endpoint, returning the number of bytes read.
    fn read(&mut self, endpoint: &Endpoint, buf: &mut [u8]) -> Result<usize, rusb::Error>;
}
