use std::io;

use byteorder::{BigEndian, WriteBytesExt};
use log::debug;
use num_enum::{FromPrimitive, IntoPrimitive};

use crate::errors::Result;

/// Packet Type ID of the key packets, see <https://www.rfc-editor.org/rfc/rfc9580.html#packet-types>
#[derive(Debug, PartialEq, Eq, Clone, Copy, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Tag {
    /// Secret-Key Packet
    SecretKey = 5,
    /// Public-Key Packet
    PublicKey = 6,
    /// Secret-Subkey Packet
    SecretSubkey = 7,
    /// Public-Subkey Packet
    PublicSubkey = 14,

    #[num_enum(catch_all)]
    Other(u8),
}

impl Tag {
    pub fn is_secret_key(self) -> bool {
        matches!(self, Tag::SecretKey | Tag::SecretSubkey)
    }

    pub fn is_primary(self) -> bool {
        matches!(self, Tag::SecretKey | Tag::PublicKey)
    }

    /// Writes a new format packet header for a body of `len` bytes.
    pub fn write_header(self, writer: &mut impl io::Write, len: usize) -> Result<()> {
        debug!("write_header {:?} {}", self, len);
        let tag: u8 = self.into();

        writer.write_u8(0b1100_0000 | tag)?;
        if len < 192 {
            writer.write_u8(len as u8)?;
        } else if len < 8384 {
            writer.write_u8((((len - 192) >> 8) + 192) as u8)?;
            writer.write_u8(((len - 192) & 0xFF) as u8)?;
        } else {
            let Ok(len) = u32::try_from(len) else {
                crate::errors::bail!("packet body of {} bytes is too large", len);
            };
            writer.write_u8(255)?;
            writer.write_u32::<BigEndian>(len)?;
        }

        Ok(())
    }

    /// Length of the new format header, in bytes.
    pub fn header_len(len: usize) -> usize {
        if len < 192 {
            2
        } else if len < 8384 {
            3
        } else {
            6
        }
    }
}

/// Key packet version.
#[derive(Debug, PartialEq, Eq, Clone, Copy, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum KeyVersion {
    V2 = 2,
    V3 = 3,
    V4 = 4,
    V5 = 5,
    V6 = 6,

    #[num_enum(catch_all)]
    Other(u8),
}

impl KeyVersion {
    /// Version 2 and 3 keys, which carry an expiration in days and use per field IVs.
    pub fn is_legacy(self) -> bool {
        matches!(self, KeyVersion::V2 | KeyVersion::V3)
    }
}

impl Default for KeyVersion {
    fn default() -> Self {
        Self::V4
    }
}
