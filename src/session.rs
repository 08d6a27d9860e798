//! Device session.
//!
//! A [`Session`] owns the USB connection to a single controller and performs the
//! blocking packet/response exchange. It is either disconnected, or connected
//! with a claimed interface and the endpoints used for communication.

use std::ops::{Deref, DerefMut};

use rusb::Direction;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::protocol::{self, Hex, Message, Response, PACKET_SIZE, RESPONSE_SIZE};
use crate::transport::{Endpoint, UsbBus, UsbLink};

/// Lightning Node Pro USB vendor ID.
pub const VENDOR_ID: u16 = 0x1b1c;

/// Lightning Node Pro USB product ID.
pub const PRODUCT_ID: u16 = 0x0c0b;

/// Interface used for all communication.
const INTERFACE: u8 = 0;

/// Alternate setting of the interface.
const SETTING: u8 = 0;

/// Active device connection.
struct Connection<L> {
    link: L,
    out_endpoint: Endpoint,
    in_endpoint: Endpoint,
}

enum State<L> {
    Disconnected,
    Connected(Connection<L>),
}

/// Lightning Node Pro session.
///
/// Every packet is answered by a response before the next one can be sent, so a
/// session must not be shared between threads without external locking.
pub struct Session<B: UsbBus> {
    bus: B,
    state: State<B::Link>,
}

impl<B: UsbBus> Session<B> {
    /// Create a disconnected session.
    pub fn new(bus: B) -> Self {
        Self { bus, state: State::Disconnected }
    }

    /// Check whether the session holds a device connection.
    pub fn is_connected(&self) -> bool {
        matches!(self.state, State::Connected(_))
    }

    /// Connect to the device with the specified IDs.
    ///
    /// This resets the device, activates its default configuration and claims
    /// the first interface. On failure the session stays disconnected.
    pub fn connect(&mut self, vendor_id: u16, product_id: u16) -> Result<()> {
        if self.is_connected() {
            return Err(Error::AlreadyConnected);
        }

        let mut link = match self.bus.open(vendor_id, product_id)? {
            Some(link) => link,
            None => return Err(Error::DeviceNotFound { vendor_id, product_id }),
        };

        link.reset()?;
        link.set_default_configuration()?;
        link.claim_interface(INTERFACE)?;

        let (out_endpoint, in_endpoint) = match find_endpoints(&link) {
            Ok(endpoints) => endpoints,
            Err(err) => {
                if let Err(release_err) = link.release_interface(INTERFACE) {
                    warn!("Unable to release interface {}: {}", INTERFACE, release_err);
                }
                return Err(err);
            },
        };

        debug!(
            "Using OUT endpoint {:#04x} and IN endpoint {:#04x}",
            out_endpoint.address, in_endpoint.address
        );
        info!("Connected to device {:04x}:{:04x}", vendor_id, product_id);

        self.state = State::Connected(Connection { link, out_endpoint, in_endpoint });

        Ok(())
    }

    /// Release the device.
    ///
    /// The session is disconnected afterwards, even if releasing the interface
    /// failed.
    pub fn disconnect(&mut self) -> Result<()> {
        let mut connection = match std::mem::replace(&mut self.state, State::Disconnected) {
            State::Connected(connection) => connection,
            State::Disconnected => return Err(Error::NotConnected),
        };

        connection.link.release_interface(INTERFACE)?;

        info!("Disconnected from device");

        Ok(())
    }

    /// Send a message and wait for the device's response.
    pub fn send(&mut self, message: &Message) -> Result<Response> {
        let connection = match &mut self.state {
            State::Connected(connection) => connection,
            State::Disconnected => return Err(Error::NotConnected),
        };

        let payload = protocol::encode(message)?;
        debug!("Sending {:?}: {}", message, Hex(&payload));

        let packet = protocol::pad(&payload);
        let written = connection.link.write(&connection.out_endpoint, &packet)?;
        if written != PACKET_SIZE {
            return Err(Error::IncompleteTransfer {
                direction: Direction::Out,
                expected: PACKET_SIZE,
                actual: written,
            });
        }

        let mut response = [0; RESPONSE_SIZE];
        let read = connection.link.read(&connection.in_endpoint, &mut response)?;
        debug!("Received response: {}", Hex(&response[..read]));
        if read != RESPONSE_SIZE {
            return Err(Error::IncompleteTransfer {
                direction: Direction::In,
                expected: RESPONSE_SIZE,
                actual: read,
            });
        }

        protocol::decode(&response)
    }

    /// Connect for the lifetime of the returned guard.
    ///
    /// The session is disconnected once the guard is dropped.
    pub fn scoped(&mut self, vendor_id: u16, product_id: u16) -> Result<ScopedSession<'_, B>> {
        self.connect(vendor_id, product_id)?;
        Ok(ScopedSession { session: self })
    }

    /// Run `f` with a connected session.
    ///
    /// The device is disconnected after `f` returns, regardless of its result.
    pub fn with_connection<T, F>(&mut self, vendor_id: u16, product_id: u16, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let mut scope = self.scoped(vendor_id, product_id)?;
        let value = f(&mut *scope)?;
        scope.close()?;
        Ok(value)
    }
}

/// Find the first OUT and IN endpoints of the communication interface.
fn find_endpoints<L: UsbLink>(link: &L) -> Result<(Endpoint, Endpoint)> {
    let endpoints = link.endpoints(INTERFACE, SETTING)?;

    let find = |direction: Direction| {
        endpoints
            .iter()
            .find(|endpoint| endpoint.direction == direction)
            .copied()
            .ok_or(Error::EndpointNotFound { interface: INTERFACE, direction })
    };

    Ok((find(Direction::Out)?, find(Direction::In)?))
}

/// Session connected until dropped.
pub struct ScopedSession<'a, B: UsbBus> {
    session: &'a mut Session<B>,
}

impl<B: UsbBus> ScopedSession<'_, B> {
    /// Disconnect explicitly, reporting errors instead of logging them.
    pub fn close(self) -> Result<()> {
        if self.session.is_connected() {
            self.session.disconnect()?;
        }
        Ok(())
    }
}

impl<B: UsbBus> Deref for ScopedSession<'_, B> {
    type Target = Session<B>;

    fn deref(&self) -> &Session<B> {
        self.session
    }
}

impl<B: UsbBus> DerefMut for ScopedSession<'_, B> {
    fn deref_mut(&mut self) -> &mut Session<B> {
        self.session
    }
}

impl<B: UsbBus> Drop for ScopedSession<'_, B> {
    fn drop(&mut self) {
        if !self.session.is_connected() {
            return;
        }

        if let Err(err) = self.session.disconnect() {
            warn!("Unable to disconnect: {}", err);
        }
    }
}
