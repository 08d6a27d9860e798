//! Corsair Lightning Node Pro LED control.
//!
//! Commands are sent to the controller as fixed size USB packets, each answered
//! by a fixed size status response. [`protocol`] converts between [`Message`]s
//! and their wire format, while a [`Session`] owns the USB connection and
//! performs the exchange.

pub mod error;
pub mod logging;
pub mod protocol;
pub mod session;
pub mod transport;
pub mod usb;

pub use crate::error::{Error, Result};
pub use crate::protocol::{ChannelMode, Message, PortType, Response};
pub use crate::session::{ScopedSession, Session, PRODUCT_ID, VENDOR_ID};
pub use crate::usb::RusbBus;
