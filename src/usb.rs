//! libusb transport.

use std::time::Duration;

use rusb::{Context, DeviceHandle, TransferType, UsbContext};
use tracing::debug;

use crate::transport::{Endpoint, UsbBus, UsbLink};

/// Default timeout of a single transfer.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);

/// USB bus backed by a libusb context.
pub struct RusbBus {
    context: Context,
    timeout: Duration,
}

impl RusbBus {
    pub fn new() -> Result<Self, rusb::Error> {
        Ok(Self { context: Context::new()?, timeout: DEFAULT_TIMEOUT })
    }

    /// Change the timeout used for every transfer of opened devices.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl UsbBus for RusbBus {
    type Link = RusbLink;

    fn open(&self, vendor_id: u16, product_id: u16) -> Result<Option<RusbLink>, rusb::Error> {
        for device in self.context.devices()?.iter() {
            let descriptor = device.device_descriptor()?;
            if descriptor.vendor_id() != vendor_id || descriptor.product_id() != product_id {
                continue;
            }

            debug!(
                "Found device {:04x}:{:04x} on bus {} address {}",
                vendor_id,
                product_id,
                device.bus_number(),
                device.address()
            );

            let handle = device.open()?;
            return Ok(Some(RusbLink { handle, timeout: self.timeout }));
        }

        Ok(None)
    }
}

/// Device opened through libusb.
pub struct RusbLink {
    handle: DeviceHandle<Context>,
    timeout: Duration,
}

impl UsbLink for RusbLink {
    fn reset(&mut self) -> Result<(), rusb::Error> {
        self.handle.reset()
    }

    fn set_default_configuration(&mut self) -> Result<(), rusb::Error> {
        let config = self.handle.device().config_descriptor(0)?;

        // Setting a configuration fails while any driver holds an interface,
        // even if the configuration is already active.
        let active = self.handle.active_configuration()?;
        if !needs_configuration(active, config.number()) {
            debug!("Configuration {} already active", active);
            return Ok(());
        }

        self.handle.set_active_configuration(config.number())
    }

    fn claim_interface(&mut self, interface: u8) -> Result<(), rusb::Error> {
        // Kernel driver detaching is only available on Linux.
        if let Err(err) = self.handle.set_auto_detach_kernel_driver(true) {
            debug!("Kernel driver auto-detach unavailable: {}", err);
        }

        self.handle.claim_interface(interface)
    }

    fn release_interface(&mut self, interface: u8) -> Result<(), rusb::Error> {
        self.handle.release_interface(interface)
    }

    fn endpoints(&self, interface: u8, setting: u8) -> Result<Vec<Endpoint>, rusb::Error> {
        let config = self.handle.device().active_config_descriptor()?;

        let mut endpoints = Vec::new();
        for usb_interface in config.interfaces().filter(|i| i.number() == interface) {
            for descriptor in usb_interface.descriptors() {
                if descriptor.setting_number() != setting {
                    continue;
                }

                for endpoint in descriptor.endpoint_descriptors() {
                    endpoints.push(Endpoint {
                        address: endpoint.address(),
                        direction: endpoint.direction(),
                        transfer_type: endpoint.transfer_type(),
                    });
                }
            }
        }

        Ok(endpoints)
    }

    fn write(&mut self, endpoint: &Endpoint, data: &[u8]) -> Result<usize, rusb::Error> {
        match endpoint.transfer_type {
            TransferType::Interrupt => {
                self.handle.write_interrupt(endpoint.address, data, self.timeout)
            },
            TransferType::Bulk => self.handle.write_bulk(endpoint.address, data, self.timeout),
            _ => Err(rusb::Error::NotSupported),
        }
    }

    fn read(&mut self, endpoint: &Endpoint, buf: &mut [u8]) -> Result<usize, rusb::Error> {
        match endpoint.transfer_type {
            TransferType::Interrupt => self.handle.read_interrupt(endpoint.address, buf, self.timeout),
            TransferType::Bulk => self.handle.read_bulk(endpoint.address, buf, self.timeout),
            _ => Err(rusb::Error::NotSupported),
        }
    }
}

/// Check if the active configuration differs from the requested one.
///
/// Unconfigured devices report configuration `0`.
fn needs_configuration(active: u8, wanted: u8) -> bool {
    active != wanted
}
