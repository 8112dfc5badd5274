//! Device identity derivation
//!
//! The launcher identifies a machine by a 32-character uppercase hex serial
//! derived from the primary MAC address widened to 128 bits. The serial is
//! not a secret and does not need to be unguessable — only stable across
//! runs on the same machine, which is what binds the registered device to
//! subsequent sync calls. The client id is a pure hex transform of the
//! serial plus the launcher device type.

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::constants::DEVICE_TYPE;

/// Derive the device serial for this machine.
///
/// Uses the first available MAC address as a 128-bit integer, hex-encoded
/// and uppercased (32 chars). When no MAC can be read (containers, exotic
/// interfaces), falls back to a hash of the hostname so the serial stays
/// stable for the machine rather than random per run.
pub fn device_serial() -> String {
    let serial = match mac_address::get_mac_address() {
        Ok(Some(mac)) => {
            let bytes = mac.bytes();
            let mut node: u128 = 0;
            for b in bytes {
                node = (node << 8) | u128::from(b);
            }
            format!("{node:032X}")
        }
        _ => {
            let host = hostname::get()
                .ok()
                .and_then(|h| h.into_string().ok())
                .unwrap_or_else(|| "unknown".to_string());
            let digest = Sha256::digest(host.as_bytes());
            let mut node: u128 = 0;
            for b in &digest[..16] {
                node = (node << 8) | u128::from(*b);
            }
            format!("{node:032X}")
        }
    };
    debug!(serial, "derived device serial");
    serial
}

/// Derive the client id from a device serial.
///
/// Hex encoding of the ASCII bytes of `"{serial}#A2UMVHOX7UP4V7"`.
/// Pure transform, no failure mode; never persisted independently of the
/// serial it was derived from.
pub fn client_id(serial: &str) -> String {
    let extended = format!("{serial}#{DEVICE_TYPE}");
    let mut hex = String::with_capacity(extended.len() * 2);
    for b in extended.as_bytes() {
        hex.push_str(&format!("{b:02x}"));
    }
    debug!(client_id = %hex, "derived client id");
    hex
}
