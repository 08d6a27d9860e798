//! Lightning Node Pro wire protocol.
//!
//! Every command is a single 64 byte packet starting with an opcode, followed by
//! the opcode's payload and zero padding. The device answers each packet with a
//! 16 byte response, of which only the leading status byte is understood.

use std::fmt::{self, Display, Formatter};

use bytes::{BufMut, Bytes, BytesMut};
use clap::ValueEnum;

use crate::error::{Error, Result};

/// Size of a host to device packet.
pub const PACKET_SIZE: usize = 64;

/// Size of a device to host response.
pub const RESPONSE_SIZE: usize = 16;

pub const OPCODE_LED_TRIGGER: u8 = 0x33;
pub const OPCODE_LED_CLEAR: u8 = 0x34;
pub const OPCODE_LED_GROUP_SET: u8 = 0x35;
pub const OPCODE_LED_GROUPS_CLEAR: u8 = 0x37;
pub const OPCODE_LED_MODE: u8 = 0x38;
pub const OPCODE_LED_PORT_TYPE: u8 = 0x3b;

/// Status byte of a successful response.
pub const STATUS_OK: u8 = 0x00;

/// How the LEDs of a channel are driven.
#[derive(ValueEnum, Default, PartialEq, Eq, Debug, Copy, Clone)]
pub enum ChannelMode {
    #[default]
    Disabled,
    /// Effects rendered by the controller, no USB connection required.
    HardwarePlayback,
    /// Effects streamed from the host.
    SoftwarePlayback,
}

impl ChannelMode {
    /// Wire value of the channel mode.
    pub fn as_byte(self) -> u8 {
        match self {
            Self::Disabled => 0x00,
            Self::HardwarePlayback => 0x01,
            Self::SoftwarePlayback => 0x02,
        }
    }
}

/// LED chipset wired to a port.
#[derive(ValueEnum, Default, PartialEq, Eq, Debug, Copy, Clone)]
pub enum PortType {
    #[default]
    Ws2812b,
    Ucs1903,
}

impl PortType {
    /// Wire value of the port type.
    pub fn as_byte(self) -> u8 {
        match self {
            Self::Ws2812b => 0x01,
            Self::Ucs1903 => 0x02,
        }
    }
}

/// Host to device command.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub enum Message {
    /// Commit the pending LED group configuration.
    LedTrigger,
    /// Clear the rendered LED buffer.
    LedClear,
    /// Remove all LED groups.
    LedGroupsClear,
    /// Define a contiguous group of LEDs.
    ///
    /// The firmware is only known to accept single byte values here; larger
    /// groups might need a different encoding.
    LedGroupSet { led_start_index: u8, led_count: u8, mode: u8 },
    /// Select how the channel is driven.
    LedMode(ChannelMode),
    /// Declare the LED chipset of the port.
    LedPortType(PortType),
}

impl Message {
    /// Opcode identifying the message on the wire.
    pub fn opcode(&self) -> u8 {
        match self {
            Self::LedTrigger => OPCODE_LED_TRIGGER,
            Self::LedClear => OPCODE_LED_CLEAR,
            Self::LedGroupsClear => OPCODE_LED_GROUPS_CLEAR,
            Self::LedGroupSet { .. } => OPCODE_LED_GROUP_SET,
            Self::LedMode(_) => OPCODE_LED_MODE,
            Self::LedPortType(_) => OPCODE_LED_PORT_TYPE,
        }
    }
}

/// Device to host response.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub enum Response {
    Ok,
}

/// Convert a message to its unpadded wire format.
///
/// All current messages have an encoding, [`Error::UnsupportedMessage`] is
/// reserved for messages the device cannot represent.
pub fn encode(message: &Message) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(PACKET_SIZE);
    buf.put_u8(message.opcode());

    match *message {
        Message::LedTrigger | Message::LedClear | Message::LedGroupsClear => (),
        Message::LedGroupSet { led_start_index, led_count, mode } => {
            // Channel.
            buf.put_u8(0x00);

            buf.put_u8(led_start_index);
            buf.put_u8(led_count);
            buf.put_u8(mode);

            // Undocumented trailer, required by the firmware.
            buf.put_slice(&[0x01, 0x01]);
        },
        Message::LedMode(channel_mode) => {
            buf.put_u8(0x00);
            buf.put_u8(channel_mode.as_byte());
        },
        Message::LedPortType(port_type) => {
            buf.put_u8(0x00);
            buf.put_u8(port_type.as_byte());
        },
    }

    Ok(buf.freeze())
}

/// Zero-pad a payload to the packet size.
///
/// # Panics
///
/// Panics if the payload is larger than [`PACKET_SIZE`].
pub fn pad(payload: &[u8]) -> Bytes {
    assert!(
        payload.len() <= PACKET_SIZE,
        "payload of {} bytes exceeds packet size of {} bytes",
        payload.len(),
        PACKET_SIZE
    );

    let mut buf = BytesMut::with_capacity(PACKET_SIZE);
    buf.put_slice(payload);
    buf.resize(PACKET_SIZE, 0);

    buf.freeze()
}

/// Interpret a raw device response.
pub fn decode(response: &[u8; RESPONSE_SIZE]) -> Result<Response> {
    match response[0] {
        STATUS_OK => Ok(Response::Ok),
        code => Err(Error::UnrecognizedResponse(code)),
    }
}

/// Human-readable hex representation of raw bytes.
pub struct Hex<'a>(pub &'a [u8]);

impl Display for Hex<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_MESSAGES: [Message; 10] = [
        Message::LedTrigger,
        Message::LedClear,
        Message::LedGroupsClear,
        Message::LedGroupSet { led_start_index: 0, led_count: 64, mode: 0 },
        Message::LedMode(ChannelMode::Disabled),
        Message::LedMode(ChannelMode::HardwarePlayback),
        Message::LedMode(ChannelMode::SoftwarePlayback),
        Message::LedPortType(PortType::Ws2812b),
        Message::LedPortType(PortType::Ucs1903),
        Message::LedGroupSet { led_start_index: 255, led_count: 255, mode: 255 },
    ];

    fn packet(message: Message) -> Bytes {
        pad(&encode(&message).unwrap())
    }

    #[test]
    fn packets_are_full_size_with_opcode() {
        for message in &ALL_MESSAGES {
            let packet = packet(*message);
            assert_eq!(packet.len(), PACKET_SIZE, "{:?}", message);
            assert_eq!(packet[0], message.opcode(), "{:?}", message);
        }
    }

    #[test]
    fn opcode_table() {
        assert_eq!(Message::LedTrigger.opcode(), 0x33);
        assert_eq!(Message::LedClear.opcode(), 0x34);
        assert_eq!(Message::LedGroupSet { led_start_index: 0, led_count: 0, mode: 0 }.opcode(), 0x35);
        assert_eq!(Message::LedGroupsClear.opcode(), 0x37);
        assert_eq!(Message::LedMode(ChannelMode::Disabled).opcode(), 0x38);
        assert_eq!(Message::LedPortType(PortType::Ws2812b).opcode(), 0x3b);
    }

    #[test]
    fn opcode_only_messages() {
        assert_eq!(&encode(&Message::LedTrigger).unwrap()[..], &[0x33]);
        assert_eq!(&encode(&Message::LedClear).unwrap()[..], &[0x34]);
        assert_eq!(&encode(&Message::LedGroupsClear).unwrap()[..], &[0x37]);
    }

    #[test]
    fn groups_clear_packet() {
        let packet = packet(Message::LedGroupsClear);
        assert_eq!(packet[0], 0x37);
        assert!(packet[1..].iter().all(|&byte| byte == 0));
        assert_eq!(packet[1..].len(), 63);
    }

    #[test]
    fn group_set() {
        let message = Message::LedGroupSet { led_start_index: 0, led_count: 64, mode: 0 };
        let payload = encode(&message).unwrap();
        assert_eq!(&payload[..], &[0x35, 0x00, 0, 64, 0, 0x01, 0x01]);

        let packet = pad(&payload);
        assert_eq!(&packet[..7], &payload[..]);
        assert!(packet[7..].iter().all(|&byte| byte == 0));
    }

    #[test]
    fn port_type() {
        let ws2812b = encode(&Message::LedPortType(PortType::Ws2812b)).unwrap();
        assert_eq!(&ws2812b[..], &[0x3b, 0x00, 0x01]);

        let ucs1903 = encode(&Message::LedPortType(PortType::Ucs1903)).unwrap();
        assert_eq!(&ucs1903[..], &[0x3b, 0x00, 0x02]);
    }

    #[test]
    fn channel_mode() {
        let disabled = encode(&Message::LedMode(ChannelMode::Disabled)).unwrap();
        assert_eq!(&disabled[..], &[0x38, 0x00, 0x00]);

        let hardware = encode(&Message::LedMode(ChannelMode::HardwarePlayback)).unwrap();
        assert_eq!(&hardware[..], &[0x38, 0x00, 0x01]);

        let software = encode(&Message::LedMode(ChannelMode::SoftwarePlayback)).unwrap();
        assert_eq!(&software[..], &[0x38, 0x00, 0x02]);
    }

    #[test]
    fn pad_accepts_full_packet() {
        let payload = [0xaa; PACKET_SIZE];
        assert_eq!(&pad(&payload)[..], &payload[..]);
    }

    #[test]
    #[should_panic(expected = "exceeds packet size")]
    fn pad_rejects_oversized_payload() {
        pad(&[0; PACKET_SIZE + 1]);
    }

    #[test]
    fn decode_ok_ignores_trailing_bytes() {
        for fill in 0..=u8::MAX {
            let mut response = [fill; RESPONSE_SIZE];
            response[0] = STATUS_OK;
            assert_eq!(decode(&response).unwrap(), Response::Ok);
        }
    }

    #[test]
    fn decode_rejects_unknown_status() {
        for code in 1..=u8::MAX {
            let mut response = [0; RESPONSE_SIZE];
            response[0] = code;
            match decode(&response) {
                Err(Error::UnrecognizedResponse(actual)) => assert_eq!(actual, code),
                result => panic!("unexpected decode result for {:#04x}: {:?}", code, result),
            }
        }
    }

    #[test]
    fn hex_display() {
        assert_eq!(Hex(&[0x3b, 0x00, 0x01]).to_string(), "3b 00 01");
        assert_eq!(Hex(&[]).to_string(), "");
    }
}
