use std::io;

use bytes::Buf;
use log::{debug, warn};
use rand::{CryptoRng, Rng};
use zeroize::Zeroizing;

use crate::crypto::checksum;
use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::errors::{bail, ensure, integrity_err, unsupported_err, Result};
use crate::parsing::BufParsing;
use crate::ser::Serialize;
use crate::types::params::cipher;
use crate::types::{KeyVersion, StringToKey};

/// The S2K usage octet, selecting how the secret material is protected.
///
/// Ref: <https://www.rfc-editor.org/rfc/rfc9580.html#name-secret-key-encryption>
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum S2kUsage {
    /// 0: stored in the clear, followed by a two octet checksum.
    Unprotected,
    /// 1..=253: the octet is the cipher, the S2K is an implicit simple MD5.
    LegacyCipher(SymmetricKeyAlgorithm),
    /// 254: cipher and S2K follow, the plaintext ends in a SHA-1 hash.
    Sha1,
    /// 255: cipher and S2K follow, the plaintext ends in a two octet checksum.
    Checksum,
}

impl From<u8> for S2kUsage {
    fn from(id: u8) -> Self {
        match id {
            0 => S2kUsage::Unprotected,
            254 => S2kUsage::Sha1,
            255 => S2kUsage::Checksum,
            sym => S2kUsage::LegacyCipher(sym.into()),
        }
    }
}

impl From<S2kUsage> for u8 {
    fn from(usage: S2kUsage) -> u8 {
        match usage {
            S2kUsage::Unprotected => 0,
            S2kUsage::LegacyCipher(sym) => sym.into(),
            S2kUsage::Sha1 => 254,
            S2kUsage::Checksum => 255,
        }
    }
}

impl S2kUsage {
    /// The integrity tag the plaintext ends in.
    pub fn integrity(self) -> IntegrityMode {
        match self {
            S2kUsage::Sha1 => IntegrityMode::Sha1,
            _ => IntegrityMode::Checksum,
        }
    }

    pub fn is_protected(self) -> bool {
        self != S2kUsage::Unprotected
    }
}

/// How the plaintext of a protected key is checked after decryption.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityMode {
    /// Two octet additive checksum.
    Checksum,
    /// 20 octet SHA-1 hash.
    #[default]
    Sha1,
}

impl IntegrityMode {
    pub fn tag_len(self) -> usize {
        match self {
            IntegrityMode::Checksum => 2,
            IntegrityMode::Sha1 => 20,
        }
    }

    /// Usage octet of a fully specified (non legacy) protection with this tag.
    pub fn usage(self) -> S2kUsage {
        match self {
            IntegrityMode::Checksum => S2kUsage::Checksum,
            IntegrityMode::Sha1 => S2kUsage::Sha1,
        }
    }

    /// Returns `data` followed by its integrity tag.
    pub fn append_tag(self, data: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let mut out = Zeroizing::new(Vec::with_capacity(data.len() + self.tag_len()));
        out.extend_from_slice(data);
        match self {
            IntegrityMode::Checksum => {
                out.extend_from_slice(&checksum::calculate_simple(data).to_be_bytes())
            }
            IntegrityMode::Sha1 => out.extend_from_slice(&checksum::calculate_sha1([data])?),
        }
        Ok(out)
    }

    /// Checks the tag at the end of `plaintext`, returning the length of the data before it.
    pub fn verify(self, plaintext: &[u8]) -> Result<usize> {
        let Some(len) = plaintext.len().checked_sub(self.tag_len()) else {
            return Err(integrity_err!(
                "plaintext of {} bytes is too short for a {:?} tag",
                plaintext.len(),
                self
            ));
        };
        let (data, tag) = plaintext.split_at(len);
        match self {
            IntegrityMode::Checksum => checksum::simple(tag, data)?,
            IntegrityMode::Sha1 => checksum::sha1(tag, data)?,
        }
        Ok(len)
    }
}

/// Secret parameters as stored in a secret key packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretParams {
    Plain(PlainSecretParams),
    Encrypted(EncryptedSecretParams),
}

/// Unprotected material: the encoded MPIs and their checksum.
#[derive(Clone, PartialEq, Eq, derive_more::Debug)]
pub struct PlainSecretParams {
    #[debug("***")]
    data: Zeroizing<Vec<u8>>,
    #[debug("{}", hex::encode(checksum))]
    checksum: [u8; 2],
}

impl PlainSecretParams {
    pub fn new(data: &[u8]) -> Self {
        PlainSecretParams {
            data: Zeroizing::new(data.to_vec()),
            checksum: checksum::calculate_simple(data).to_be_bytes(),
        }
    }

    /// The encoded material, after checking the stored checksum.
    pub fn verified_data(&self) -> Result<&[u8]> {
        checksum::simple(&self.checksum, &self.data)?;
        Ok(&self.data)
    }

    pub fn checksum(&self) -> [u8; 2] {
        self.checksum
    }
}

/// Protected material, together with everything needed to unlock it.
#[derive(Clone, PartialEq, Eq, derive_more::Debug)]
pub struct EncryptedSecretParams {
    usage: S2kUsage,
    sym_alg: SymmetricKeyAlgorithm,
    s2k: StringToKey,
    #[debug("{}", hex::encode(iv))]
    iv: Vec<u8>,
    #[debug("{}", hex::encode(data))]
    data: Vec<u8>,
}

impl SecretParams {
    /// Parses the secret fields of a key packet, starting at the usage octet.
    pub fn try_from_buf<B: Buf>(version: KeyVersion, mut i: B) -> Result<Self> {
        let usage = S2kUsage::from(i.read_u8("s2k usage")?);
        debug!("secret params: usage {:?}", usage);

        let (sym_alg, s2k) = match usage {
            S2kUsage::Unprotected => {
                let rest = i.rest();
                let Some(len) = rest.len().checked_sub(2) else {
                    bail!("unprotected secret key is missing its checksum");
                };
                let data = Zeroizing::new(rest[..len].to_vec());
                let checksum = [rest[len], rest[len + 1]];
                return Ok(SecretParams::Plain(PlainSecretParams { data, checksum }));
            }
            S2kUsage::LegacyCipher(sym_alg) => (sym_alg, StringToKey::new_legacy()),
            S2kUsage::Sha1 | S2kUsage::Checksum => {
                let sym_alg = SymmetricKeyAlgorithm::from(i.read_u8("secret key cipher")?);
                let s2k = StringToKey::try_from_buf(&mut i)?;
                (sym_alg, s2k)
            }
        };

        if version.is_legacy() && usage == S2kUsage::Sha1 {
            unsupported_err!("SHA-1 protection of a version {:?} key", version);
        }

        let iv = if s2k.is_gnu_extension() {
            Vec::new()
        } else {
            if !sym_alg.is_supported() {
                unsupported_err!("secret key cipher {:?}", sym_alg);
            }
            i.read_take(sym_alg.block_size(), "secret key iv")?.to_vec()
        };
        let data = i.rest().to_vec();

        Ok(SecretParams::Encrypted(EncryptedSecretParams {
            usage,
            sym_alg,
            s2k,
            iv,
            data,
        }))
    }

    pub fn usage(&self) -> S2kUsage {
        match self {
            SecretParams::Plain(_) => S2kUsage::Unprotected,
            SecretParams::Encrypted(enc) => enc.usage,
        }
    }

    pub fn is_encrypted(&self) -> bool {
        matches!(self, SecretParams::Encrypted(_))
    }

    /// True when the packet does not carry the secret material at all.
    pub fn is_public_only(&self) -> bool {
        match self {
            SecretParams::Plain(plain) => plain.data.is_empty(),
            SecretParams::Encrypted(enc) => enc.s2k.is_gnu_extension() || enc.data.is_empty(),
        }
    }
}

impl EncryptedSecretParams {
    /// Protects `plaintext`, which already ends in the integrity tag `usage` requires.
    ///
    /// Version 2 and 3 keys use the per field IV chaining of [`cipher::encrypt_v3`].
    pub fn encrypt<R: CryptoRng + Rng>(
        mut rng: R,
        version: KeyVersion,
        plaintext: &[u8],
        passphrase: &[u8],
        sym_alg: SymmetricKeyAlgorithm,
        s2k: StringToKey,
        usage: S2kUsage,
    ) -> Result<Self> {
        ensure!(
            usage.is_protected(),
            "cannot encrypt with usage {:?}",
            usage
        );
        if !sym_alg.is_supported() {
            unsupported_err!("secret key cipher {:?}", sym_alg);
        }
        if s2k.is_gnu_extension() {
            unsupported_err!("encryption with {:?}", s2k);
        }
        if let S2kUsage::LegacyCipher(legacy) = usage {
            ensure!(
                legacy == sym_alg && s2k == StringToKey::new_legacy(),
                "legacy cipher usage requires {:?} with a simple MD5 s2k",
                sym_alg
            );
        }

        let key = s2k.derive_key(passphrase, sym_alg.key_size())?;

        let (data, iv) = if version.is_legacy() {
            if usage == S2kUsage::Sha1 {
                unsupported_err!("SHA-1 protection of a version {:?} key", version);
            }
            warn!("encrypting a version {:?} key", version);
            let iv = sym_alg.new_iv(&mut rng);
            let data = cipher::encrypt_v3(sym_alg, &key, &iv, plaintext)?;
            (data, iv)
        } else {
            cipher::encrypt(&mut rng, sym_alg, &key, None, plaintext)?
        };

        Ok(EncryptedSecretParams {
            usage,
            sym_alg,
            s2k,
            iv,
            data,
        })
    }

    /// Decrypts the payload and verifies its integrity tag.
    ///
    /// The returned plaintext still ends in the tag.
    pub fn decrypt_raw(
        &self,
        version: KeyVersion,
        passphrase: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>> {
        if self.s2k.is_gnu_extension() {
            bail!("secret key material is not available: {:?}", self.s2k);
        }

        let key = self.s2k.derive_key(passphrase, self.sym_alg.key_size())?;
        let plaintext = if version.is_legacy() {
            cipher::decrypt_v3(self.sym_alg, &key, &self.iv, &self.data)?
        } else {
            cipher::decrypt(self.sym_alg, &key, &self.iv, &self.data)?
        };

        self.usage.integrity().verify(&plaintext)?;

        Ok(plaintext)
    }

    /// Decrypts the payload and returns the encoded material without its tag.
    pub fn unlock(&self, version: KeyVersion, passphrase: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let mut plaintext = self.decrypt_raw(version, passphrase)?;
        let len = plaintext.len() - self.usage.integrity().tag_len();
        plaintext.truncate(len);
        Ok(plaintext)
    }

    pub fn usage(&self) -> S2kUsage {
        self.usage
    }

    pub fn sym_alg(&self) -> SymmetricKeyAlgorithm {
        self.sym_alg
    }

    pub fn string_to_key(&self) -> &StringToKey {
        &self.s2k
    }

    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl Serialize for SecretParams {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        match self {
            SecretParams::Plain(plain) => {
                writer.write_all(&[0])?;
                writer.write_all(&plain.data)?;
                writer.write_all(&plain.checksum)?;
            }
            SecretParams::Encrypted(enc) => {
                writer.write_all(&[u8::from(enc.usage)])?;
                if matches!(enc.usage, S2kUsage::Sha1 | S2kUsage::Checksum) {
                    writer.write_all(&[u8::from(enc.sym_alg)])?;
                    enc.s2k.to_writer(writer)?;
                }
                writer.write_all(&enc.iv)?;
                writer.write_all(&enc.data)?;
            }
        }
        Ok(())
    }

    fn write_len(&self) -> usize {
        1 + match self {
            SecretParams::Plain(plain) => plain.data.len() + 2,
            SecretParams::Encrypted(enc) => {
                let header = match enc.usage {
                    S2kUsage::Sha1 | S2kUsage::Checksum => 1 + enc.s2k.write_len(),
                    _ => 0,
                };
                header + enc.iv.len() + enc.data.len()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::crypto::hash::HashAlgorithm;
    use crate::errors::ErrorKind;

    #[test]
    fn test_usage_octet() {
        assert_eq!(S2kUsage::from(0), S2kUsage::Unprotected);
        assert_eq!(S2kUsage::from(254), S2kUsage::Sha1);
        assert_eq!(S2kUsage::from(255), S2kUsage::Checksum);
        assert_eq!(
            S2kUsage::from(7),
            S2kUsage::LegacyCipher(SymmetricKeyAlgorithm::AES128)
        );
        for id in 0..=255u8 {
            assert_eq!(u8::from(S2kUsage::from(id)), id);
        }
        assert_eq!(S2kUsage::from(3).integrity(), IntegrityMode::Checksum);
    }

    #[test]
    fn test_integrity_tags() {
        let data = b"\x00\x03\x05";
        let tagged = IntegrityMode::Checksum.append_tag(data).unwrap();
        assert_eq!(&tagged[..], b"\x00\x03\x05\x00\x08");
        assert_eq!(IntegrityMode::Checksum.verify(&tagged).unwrap(), 3);

        let tagged = IntegrityMode::Sha1.append_tag(data).unwrap();
        assert_eq!(tagged.len(), 23);
        assert_eq!(IntegrityMode::Sha1.verify(&tagged).unwrap(), 3);

        let mut broken = tagged.to_vec();
        broken[0] ^= 1;
        assert!(IntegrityMode::Sha1.verify(&broken).unwrap_err().is_integrity());
        assert!(IntegrityMode::Sha1.verify(&[0u8; 5]).unwrap_err().is_integrity());
    }

    #[test]
    fn test_plain_roundtrip() {
        let raw = hex!("00 0003 05 0008");
        let params = SecretParams::try_from_buf(KeyVersion::V4, &raw[..]).unwrap();
        let SecretParams::Plain(ref plain) = params else {
            panic!("expected plain params");
        };
        assert_eq!(plain.verified_data().unwrap(), &[0x00, 0x03, 0x05]);
        assert_eq!(params.to_bytes().unwrap(), raw);
        assert_eq!(params.write_len(), raw.len());

        let broken = hex!("00 0003 05 0009");
        let SecretParams::Plain(plain) =
            SecretParams::try_from_buf(KeyVersion::V4, &broken[..]).unwrap()
        else {
            panic!("expected plain params");
        };
        assert!(plain.verified_data().unwrap_err().is_integrity());
    }

    #[test]
    fn test_encrypted_roundtrip() {
        let _ = pretty_env_logger::try_init();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let material = hex!("0008 ff 0010 0102");
        let plaintext = IntegrityMode::Sha1.append_tag(&material).unwrap();
        let s2k = StringToKey::new_iterated(&mut rng, HashAlgorithm::Sha256, 0x10);
        let enc = EncryptedSecretParams::encrypt(
            &mut rng,
            KeyVersion::V4,
            &plaintext,
            b"pw",
            SymmetricKeyAlgorithm::AES256,
            s2k,
            S2kUsage::Sha1,
        )
        .unwrap();

        let params = SecretParams::Encrypted(enc.clone());
        let bytes = params.to_bytes().unwrap();
        assert_eq!(bytes.len(), params.write_len());
        assert_eq!(bytes[0], 254);
        assert_eq!(bytes[1], 9);

        let parsed = SecretParams::try_from_buf(KeyVersion::V4, &bytes[..]).unwrap();
        assert_eq!(parsed, params);

        assert_eq!(&enc.unlock(KeyVersion::V4, b"pw").unwrap()[..], &material[..]);
        assert_eq!(
            &enc.decrypt_raw(KeyVersion::V4, b"pw").unwrap()[..],
            &plaintext[..]
        );
        assert_eq!(
            enc.unlock(KeyVersion::V4, b"wrong").unwrap_err().kind(),
            ErrorKind::Integrity
        );
    }

    #[test]
    fn test_gnu_dummy() {
        // usage 254, AES128, GNU dummy s2k, nothing else
        let raw = hex!("fe 07 6502474e5501");
        let params = SecretParams::try_from_buf(KeyVersion::V4, &raw[..]).unwrap();
        assert!(params.is_public_only());
        assert_eq!(params.to_bytes().unwrap(), raw);
    }

    #[test]
    fn test_v3_sha1_is_unsupported() {
        let raw = hex!("fe 07 0001 0011223344556677889900aabbccddeeff");
        let err = SecretParams::try_from_buf(KeyVersion::V3, &raw[..]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedAlgorithm);

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let err = EncryptedSecretParams::encrypt(
            &mut rng,
            KeyVersion::V3,
            &[0u8; 30],
            b"pw",
            SymmetricKeyAlgorithm::AES128,
            StringToKey::new_legacy(),
            S2kUsage::Sha1,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedAlgorithm);
    }

    #[test]
    fn test_unknown_cipher() {
        let raw = hex!("ff 63 0001 00112233445566778899");
        let err = SecretParams::try_from_buf(KeyVersion::V4, &raw[..]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedAlgorithm);
    }
}
