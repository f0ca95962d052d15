use std::io;

use bytes::Buf;
use log::{debug, warn};

use crate::errors::{ensure, Result};
use crate::packet::PublicKey;
use crate::ser::Serialize;
use crate::types::{S2kUsage, SecretParams, Tag};

/// A secret key or secret subkey packet body.
///
/// Ref: <https://www.rfc-editor.org/rfc/rfc9580.html#name-secret-key-packet-formats>
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SecretKeyPacket {
    tag: Tag,
    public_key: PublicKey,
    secret_params: SecretParams,
}

impl SecretKeyPacket {
    pub fn new(tag: Tag, public_key: PublicKey, secret_params: SecretParams) -> Result<Self> {
        ensure!(tag.is_secret_key(), "{:?} is not a secret key packet", tag);
        if public_key.version().is_legacy() {
            ensure!(
                secret_params.usage() != S2kUsage::Sha1,
                "version {:?} keys can not use SHA-1 protection",
                public_key.version()
            );
        }

        Ok(SecretKeyPacket {
            tag,
            public_key,
            secret_params,
        })
    }

    /// Parses a packet body, without its header.
    pub fn try_from_buf<B: Buf>(tag: Tag, mut i: B) -> Result<Self> {
        let public_key = PublicKey::try_from_buf(&mut i)?;
        let secret_params = SecretParams::try_from_buf(public_key.version(), &mut i)?;
        debug!(
            "parsed {:?}: {:?} {:?}",
            tag,
            public_key.algorithm(),
            secret_params.usage()
        );
        if secret_params.is_public_only() {
            warn!("secret key packet without secret material");
        }

        Self::new(tag, public_key, secret_params)
    }

    pub fn from_slice(tag: Tag, body: &[u8]) -> Result<Self> {
        Self::try_from_buf(tag, body)
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn is_primary(&self) -> bool {
        self.tag.is_primary()
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn secret_params(&self) -> &SecretParams {
        &self.secret_params
    }

    /// Writes the body preceded by a new format packet header.
    pub fn to_writer_with_header<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        self.tag.write_header(writer, self.write_len())?;
        self.to_writer(writer)
    }
}

impl Serialize for SecretKeyPacket {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        self.public_key.to_writer(writer)?;
        self.secret_params.to_writer(writer)?;
        Ok(())
    }

    fn write_len(&self) -> usize {
        self.public_key.write_len() + self.secret_params.write_len()
    }
}
