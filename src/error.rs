//! Error types.

use rusb::Direction;
use thiserror::Error;

/// Lightning Node Pro errors.
#[derive(Debug, Error)]
pub enum Error {
    /// No USB device matches the requested IDs.
    #[error("device not found: vendor_id={vendor_id:#06x}, product_id={product_id:#06x}")]
    DeviceNotFound { vendor_id: u16, product_id: u16 },

    /// The claimed interface has no endpoint in the required direction.
    #[error("no {direction:?} endpoint on interface {interface}")]
    EndpointNotFound { interface: u8, direction: Direction },

    /// Operation requires an active connection.
    #[error("session is not connected")]
    NotConnected,

    /// Reconnecting requires an explicit disconnect first.
    #[error("session is already connected")]
    AlreadyConnected,

    /// Message without a wire encoding.
    #[error("unsupported message: {0}")]
    UnsupportedMessage(&'static str),

    /// Status byte with undocumented meaning.
    #[error("unrecognized response code: {0:#04x}")]
    UnrecognizedResponse(u8),

    /// USB write, read or setup failure.
    #[error("USB transport error: {0}")]
    TransportIo(#[from] rusb::Error),

    /// Transfer moved fewer bytes than the packet size.
    #[error("incomplete {direction:?} transfer: expected {expected} bytes, got {actual}")]
    IncompleteTransfer { direction: Direction, expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
