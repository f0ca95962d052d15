use std::io::{self, BufRead};

use chrono::{DateTime, Utc};
use log::debug;
use rand::{CryptoRng, Rng};
use zeroize::Zeroizing;

use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::errors::{bail, ensure, integrity_err, ErrorKind, Result};
use crate::gnupg::GnupgSecret;
use crate::packet::{PublicKey, SecretKeyPacket};
use crate::ser::Serialize;
use crate::types::{
    warn_weak, EncryptedSecretParams, IntegrityMode, KeyVersion, Passphrase, PlainSecretParams,
    PrivateKey, S2kUsage, SecretMaterial, SecretParams, StringToKey, Tag,
};

/// Protection settings for a new secret key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretKeyConfig {
    /// [`SymmetricKeyAlgorithm::Plaintext`] stores the key unprotected.
    pub sym_alg: SymmetricKeyAlgorithm,
    /// `None` picks a fresh default: iterated and salted SHA-256 for
    /// version 4 keys, the legacy simple MD5 for version 2 and 3.
    pub s2k: Option<StringToKey>,
    /// Ignored for version 2 and 3 keys, which always use the checksum.
    pub integrity: IntegrityMode,
}

impl Default for SecretKeyConfig {
    fn default() -> Self {
        SecretKeyConfig {
            sym_alg: SymmetricKeyAlgorithm::default(),
            s2k: None,
            integrity: IntegrityMode::default(),
        }
    }
}

/// A secret key, protected by a passphrase or stored in the clear.
///
/// Instances are immutable, changing the passphrase returns a new key.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct SecretKey {
    packet: SecretKeyPacket,
}

impl From<SecretKeyPacket> for SecretKey {
    fn from(packet: SecretKeyPacket) -> Self {
        SecretKey { packet }
    }
}

impl SecretKey {
    /// Protects `material` with the default S2K of the key version.
    #[allow(clippy::too_many_arguments)]
    pub fn new<R: CryptoRng + Rng>(
        rng: R,
        material: &SecretMaterial,
        public_key: PublicKey,
        sym_alg: SymmetricKeyAlgorithm,
        passphrase: &Passphrase<'_>,
        integrity: IntegrityMode,
        is_primary: bool,
    ) -> Result<Self> {
        let config = SecretKeyConfig {
            sym_alg,
            s2k: None,
            integrity,
        };
        Self::with_config(rng, material, public_key, &config, passphrase, is_primary)
    }

    /// Protects `material` with an explicit S2K.
    #[allow(clippy::too_many_arguments)]
    pub fn new_with_s2k<R: CryptoRng + Rng>(
        rng: R,
        material: &SecretMaterial,
        public_key: PublicKey,
        sym_alg: SymmetricKeyAlgorithm,
        s2k: StringToKey,
        passphrase: &Passphrase<'_>,
        integrity: IntegrityMode,
        is_primary: bool,
    ) -> Result<Self> {
        let config = SecretKeyConfig {
            sym_alg,
            s2k: Some(s2k),
            integrity,
        };
        Self::with_config(rng, material, public_key, &config, passphrase, is_primary)
    }

    pub fn with_config<R: CryptoRng + Rng>(
        rng: R,
        material: &SecretMaterial,
        public_key: PublicKey,
        config: &SecretKeyConfig,
        passphrase: &Passphrase<'_>,
        is_primary: bool,
    ) -> Result<Self> {
        ensure!(
            material.matches_algorithm(public_key.algorithm()),
            "inconsistent key state: {:?} material for a {:?} key",
            material.algorithm(),
            public_key.algorithm()
        );

        let version = public_key.version();
        let encoded = material.encode()?;
        let secret_params = if config.sym_alg == SymmetricKeyAlgorithm::Plaintext {
            SecretParams::Plain(PlainSecretParams::new(&encoded))
        } else {
            let integrity = if version.is_legacy() {
                IntegrityMode::Checksum
            } else {
                config.integrity
            };
            protect(
                rng,
                version,
                &encoded,
                passphrase,
                config.sym_alg,
                config.s2k.clone(),
                integrity,
                version.is_legacy(),
            )?
        };

        let packet = SecretKeyPacket::new(tag_for(is_primary), public_key, secret_params)?;
        Ok(SecretKey { packet })
    }

    /// Builds a version 4 key for `key`, deriving the public fields from it.
    pub fn from_private_key<R: CryptoRng + Rng>(
        rng: R,
        key: &PrivateKey,
        created_at: DateTime<Utc>,
        config: &SecretKeyConfig,
        passphrase: &Passphrase<'_>,
        is_primary: bool,
    ) -> Result<Self> {
        let public_key = PublicKey::new(
            KeyVersion::V4,
            key.algorithm(),
            created_at,
            None,
            key.public_params(None)?,
        )?;
        let material = key.to_material()?;

        Self::with_config(rng, &material, public_key, config, passphrase, is_primary)
    }

    /// Imports a GnuPG `protected-private-key` export as an unprotected primary key.
    pub fn from_gnupg_export<R: BufRead>(
        reader: R,
        passphrase: &Passphrase<'_>,
        created_at: DateTime<Utc>,
    ) -> Result<Self> {
        let secret = GnupgSecret::from_reader(reader, passphrase.as_bytes())?;
        debug!("imported gnupg key on {}", secret.curve());

        let public_key = PublicKey::new(
            KeyVersion::V4,
            secret.algorithm()?,
            created_at,
            None,
            secret.public_params()?,
        )?;
        let encoded = secret.material()?.encode()?;
        let secret_params = SecretParams::Plain(PlainSecretParams::new(&encoded));
        let packet = SecretKeyPacket::new(Tag::SecretKey, public_key, secret_params)?;

        Ok(SecretKey { packet })
    }

    /// Decodes a secret key packet body.
    pub fn from_bytes(tag: Tag, body: &[u8]) -> Result<Self> {
        let packet = SecretKeyPacket::from_slice(tag, body)?;
        Ok(SecretKey { packet })
    }

    /// Recovers the private key, converting the passphrase the way legacy
    /// implementations did: every `char` truncated to one byte.
    ///
    /// Returns `None` when the packet holds no secret material.
    pub fn extract_private_key(&self, passphrase: &str) -> Result<Option<PrivateKey>> {
        self.extract_private_key_with(&Passphrase::legacy(passphrase))
    }

    /// Like [`Self::extract_private_key`], with the UTF-8 bytes of `passphrase`.
    pub fn extract_private_key_utf8(&self, passphrase: &str) -> Result<Option<PrivateKey>> {
        self.extract_private_key_with(&Passphrase::utf8(passphrase))
    }

    /// Like [`Self::extract_private_key`], with the passphrase bytes as given.
    pub fn extract_private_key_raw(&self, passphrase: &[u8]) -> Result<Option<PrivateKey>> {
        self.extract_private_key_with(&Passphrase::raw(passphrase))
    }

    pub fn extract_private_key_with(
        &self,
        passphrase: &Passphrase<'_>,
    ) -> Result<Option<PrivateKey>> {
        let Some(material) = self.extract_material_with(passphrase)? else {
            return Ok(None);
        };
        let key = PrivateKey::from_material(&material, self.public_key().public_params())?;
        Ok(Some(key))
    }

    /// Decrypts and decodes the secret material, checking its integrity tag.
    pub fn extract_material_with(
        &self,
        passphrase: &Passphrase<'_>,
    ) -> Result<Option<SecretMaterial>> {
        let public_key = self.public_key();
        let encoded = match self.packet.secret_params() {
            params if params.is_public_only() => {
                debug!("no secret material to extract");
                return Ok(None);
            }
            SecretParams::Plain(plain) => Zeroizing::new(plain.verified_data()?.to_vec()),
            SecretParams::Encrypted(enc) => {
                let encoded = enc.unlock(public_key.version(), passphrase.as_bytes())?;
                // a wrong passphrase can slip past the two octet checksum
                return SecretMaterial::try_from_slice(
                    &encoded,
                    public_key.algorithm(),
                    public_key.public_params(),
                )
                .map(Some)
                .map_err(|err| {
                    if err.kind() == ErrorKind::Format {
                        integrity_err!("invalid secret key material after decryption: {}", err)
                    } else {
                        err
                    }
                });
            }
        };

        let material = SecretMaterial::try_from_slice(
            &encoded,
            public_key.algorithm(),
            public_key.public_params(),
        )?;
        Ok(Some(material))
    }

    /// Re-protects the key under a new passphrase, keeping the S2K usage where possible.
    pub fn change_passphrase<R: CryptoRng + Rng>(
        &self,
        rng: R,
        old: &Passphrase<'_>,
        new: &Passphrase<'_>,
        new_sym_alg: SymmetricKeyAlgorithm,
    ) -> Result<Self> {
        self.change_passphrase_with_s2k(rng, old, new, new_sym_alg, None)
    }

    /// Re-protects the key under a new passphrase and algorithm.
    ///
    /// [`SymmetricKeyAlgorithm::Plaintext`] removes the protection and stores
    /// the material with the two octet checksum. Otherwise the usage is
    /// kept: unprotected keys get the checksum, legacy cipher usage stays
    /// legacy with the new cipher.
    pub fn change_passphrase_with_s2k<R: CryptoRng + Rng>(
        &self,
        rng: R,
        old: &Passphrase<'_>,
        new: &Passphrase<'_>,
        new_sym_alg: SymmetricKeyAlgorithm,
        s2k: Option<StringToKey>,
    ) -> Result<Self> {
        let public_key = self.public_key();
        let version = public_key.version();
        let params = self.packet.secret_params();
        if params.is_public_only() {
            bail!("secret key material is not available");
        }

        let old_usage = params.usage();
        let plaintext = match params {
            SecretParams::Plain(plain) => {
                let mut plaintext = Zeroizing::new(plain.verified_data()?.to_vec());
                plaintext.extend_from_slice(&plain.checksum());
                plaintext
            }
            SecretParams::Encrypted(enc) => enc.decrypt_raw(version, old.as_bytes())?,
        };
        let old_integrity = old_usage.integrity();
        let data = &plaintext[..plaintext.len() - old_integrity.tag_len()];
        debug!(
            "changing passphrase: {:?} to {:?}",
            old_usage, new_sym_alg
        );

        let secret_params = if new_sym_alg == SymmetricKeyAlgorithm::Plaintext {
            SecretParams::Plain(PlainSecretParams::new(data))
        } else {
            let (integrity, prefer_legacy) = match old_usage {
                S2kUsage::Unprotected => (IntegrityMode::Checksum, version.is_legacy()),
                S2kUsage::LegacyCipher(_) => (IntegrityMode::Checksum, true),
                S2kUsage::Sha1 => (IntegrityMode::Sha1, false),
                S2kUsage::Checksum => (IntegrityMode::Checksum, false),
            };
            protect(
                rng,
                version,
                data,
                new,
                new_sym_alg,
                s2k,
                integrity,
                prefer_legacy,
            )?
        };

        let packet = SecretKeyPacket::new(self.packet.tag(), public_key.clone(), secret_params)?;
        Ok(SecretKey { packet })
    }

    pub fn public_key(&self) -> &PublicKey {
        self.packet.public_key()
    }

    pub fn packet(&self) -> &SecretKeyPacket {
        &self.packet
    }

    pub fn into_packet(self) -> SecretKeyPacket {
        self.packet
    }

    pub fn is_protected(&self) -> bool {
        self.packet.secret_params().is_encrypted()
    }

    pub fn usage(&self) -> S2kUsage {
        self.packet.secret_params().usage()
    }

    /// Writes the key as a full packet, with a new format header.
    pub fn to_writer_with_header<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        self.packet.to_writer_with_header(writer)
    }
}

impl Serialize for SecretKey {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        self.packet.to_writer(writer)
    }

    fn write_len(&self) -> usize {
        self.packet.write_len()
    }
}

fn tag_for(is_primary: bool) -> Tag {
    if is_primary {
        Tag::SecretKey
    } else {
        Tag::SecretSubkey
    }
}

/// Appends the integrity tag to `data` and encrypts it.
///
/// With `prefer_legacy` the S2K defaults to the legacy one, and with the legacy
/// S2K the usage octet is the cipher itself.
#[allow(clippy::too_many_arguments)]
fn protect<R: CryptoRng + Rng>(
    mut rng: R,
    version: KeyVersion,
    data: &[u8],
    passphrase: &Passphrase<'_>,
    sym_alg: SymmetricKeyAlgorithm,
    s2k: Option<StringToKey>,
    integrity: IntegrityMode,
    prefer_legacy: bool,
) -> Result<SecretParams> {
    let s2k = match s2k {
        Some(s2k) => s2k,
        None if prefer_legacy || version.is_legacy() => StringToKey::new_legacy(),
        None => StringToKey::new_default(&mut rng),
    };
    warn_weak(&s2k);

    let (usage, integrity) = if prefer_legacy && s2k == StringToKey::new_legacy() {
        (S2kUsage::LegacyCipher(sym_alg), IntegrityMode::Checksum)
    } else {
        (integrity.usage(), integrity)
    };

    let plaintext = integrity.append_tag(data)?;
    let enc = EncryptedSecretParams::encrypt(
        &mut rng,
        version,
        &plaintext,
        passphrase.as_bytes(),
        sym_alg,
        s2k,
        usage,
    )?;

    Ok(SecretParams::Encrypted(enc))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::crypto::ecc_curve::ECCCurve;
    use crate::crypto::hash::HashAlgorithm;
    use crate::crypto::public_key::PublicKeyAlgorithm;
    use crate::types::{MpiBytes, PublicParams};

    fn elgamal_key(version: KeyVersion) -> PublicKey {
        PublicKey::new(
            version,
            PublicKeyAlgorithm::ElgamalEncrypt,
            Utc.timestamp_opt(1_600_000_000, 0).unwrap(),
            None,
            PublicParams::Elgamal {
                p: MpiBytes::from_slice(&[23]),
                g: MpiBytes::from_slice(&[2]),
                y: MpiBytes::from_slice(&[9]),
            },
        )
        .unwrap()
    }

    fn fast_s2k(rng: &mut ChaCha8Rng) -> StringToKey {
        StringToKey::new_iterated(rng, HashAlgorithm::Sha256, 0)
    }

    #[test]
    fn test_protect_and_extract() {
        let _ = pretty_env_logger::try_init();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let material = SecretMaterial::elgamal(&[5]);
        let s2k = fast_s2k(&mut rng);

        for integrity in [IntegrityMode::Sha1, IntegrityMode::Checksum] {
            let key = SecretKey::new_with_s2k(
                &mut rng,
                &material,
                elgamal_key(KeyVersion::V4),
                SymmetricKeyAlgorithm::AES128,
                s2k.clone(),
                &Passphrase::utf8("hunter2"),
                integrity,
                false,
            )
            .unwrap();
            assert!(key.is_protected());
            assert_eq!(key.usage(), integrity.usage());
            assert_eq!(key.packet().tag(), Tag::SecretSubkey);

            let back = key
                .extract_material_with(&Passphrase::utf8("hunter2"))
                .unwrap()
                .unwrap();
            assert_eq!(back, material);

            let parsed = SecretKey::from_bytes(Tag::SecretSubkey, &key.to_bytes().unwrap()).unwrap();
            assert_eq!(parsed, key);
        }
    }

    #[test]
    fn test_plaintext_config() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let material = SecretMaterial::elgamal(&[5]);
        let config = SecretKeyConfig {
            sym_alg: SymmetricKeyAlgorithm::Plaintext,
            ..Default::default()
        };
        let key = SecretKey::with_config(
            &mut rng,
            &material,
            elgamal_key(KeyVersion::V4),
            &config,
            &Passphrase::empty(),
            true,
        )
        .unwrap();
        assert!(!key.is_protected());
        assert_eq!(key.usage(), S2kUsage::Unprotected);
        // any passphrase works
        let private = key.extract_private_key("ignored").unwrap().unwrap();
        assert!(matches!(private, PrivateKey::Elgamal(_)));
    }

    #[test]
    fn test_mismatched_material() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let err = SecretKey::new(
            &mut rng,
            &SecretMaterial::dsa(&[5]),
            elgamal_key(KeyVersion::V4),
            SymmetricKeyAlgorithm::AES128,
            &Passphrase::utf8("x"),
            IntegrityMode::Sha1,
            true,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_public_only() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let key = SecretKey::new(
            &mut rng,
            &SecretMaterial::eddsa_legacy(&[1; 32]),
            PublicKey::new(
                KeyVersion::V4,
                PublicKeyAlgorithm::EdDSALegacy,
                Utc.timestamp_opt(0, 0).unwrap(),
                None,
                PublicParams::EdDsaLegacy {
                    curve: ECCCurve::Ed25519,
                    q: MpiBytes::from_slice(&[0x40; 33]),
                },
            )
            .unwrap(),
            SymmetricKeyAlgorithm::Plaintext,
            &Passphrase::empty(),
            IntegrityMode::Checksum,
            true,
        )
        .unwrap();

        // swap the secret part for a gnu-dummy
        let mut raw = key.public_key().to_bytes().unwrap();
        raw.extend_from_slice(&[0xfe, 0x07, 0x65, 0x02, b'G', b'N', b'U', 0x01]);
        let dummy = SecretKey::from_bytes(Tag::SecretKey, &raw).unwrap();
        assert!(dummy.extract_private_key("").unwrap().is_none());
        assert!(dummy
            .change_passphrase(
                &mut rng,
                &Passphrase::empty(),
                &Passphrase::empty(),
                SymmetricKeyAlgorithm::AES128
            )
            .is_err());
    }
}
