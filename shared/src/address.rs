//! Peer address validation
//!
//! Addresses are accepted only in the canonical `XX:XX:XX:XX:XX:XX` form:
//! six colon-separated pairs of uppercase hexadecimal digits.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while parsing a peer address
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("address is empty")]
    Empty,

    #[error("address has incorrect format: {0}")]
    Format(String),
}

/// A validated six-byte Bluetooth device address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerAddress([u8; 6]);

impl PeerAddress {
    /// Raw address octets, most significant first
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl FromStr for PeerAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(AddressError::Empty);
        }

        let format_error = || AddressError::Format(s.to_string());
        let mut octets = [0u8; 6];
        let mut parts = s.split(':');

        for octet in octets.iter_mut() {
            let part = parts.next().ok_or_else(format_error)?.as_bytes();
            if part.len() != 2 {
                return Err(format_error());
            }
            let hi = hex_value(part[0]).ok_or_else(format_error)?;
            let lo = hex_value(part[1]).ok_or_else(format_error)?;
            *octet = (hi << 4) | lo;
        }

        if parts.next().is_some() {
            return Err(format_error());
        }

        Ok(Self(octets))
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_address() {
        let addr: PeerAddress = "00:11:22:AA:BB:FF".parse().expect("valid address");
        assert_eq!(addr.octets(), [0x00, 0x11, 0x22, 0xAA, 0xBB, 0xFF]);
        assert_eq!(addr.to_string(), "00:11:22:AA:BB:FF");
    }

    #[test]
    fn test_reject_short_address() {
        let result = "00:11:22:33:44".parse::<PeerAddress>();
        assert_eq!(
            result,
            Err(AddressError::Format("00:11:22:33:44".into()))
        );
    }

    #[test]
    fn test_reject_lowercase() {
        assert!("00:11:22:aa:bb:cc".parse::<PeerAddress>().is_err());
    }

    #[test]
    fn test_reject_malformed() {
        for bad in [
            "00:11:22:33:44:55:66",
            "00-11-22-33-44-55",
            "0:11:22:33:44:555",
            "00:11:22:33:44:GG",
            "00:11:22:33:44:55 ",
            "YOUR ADDRESS HERE",
        ] {
            assert!(bad.parse::<PeerAddress>().is_err(), "accepted {bad}");
        }
    }

    #[test]
    fn test_reject_empty() {
        assert_eq!("".parse::<PeerAddress>(), Err(AddressError::Empty));
    }
}
