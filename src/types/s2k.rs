use std::io;

use argon2::{Algorithm, Argon2, Params, Version};
use bytes::{Buf, Bytes};
use log::{debug, warn};
use rand::{CryptoRng, Rng};
use zeroize::Zeroizing;

use crate::crypto::hash::HashAlgorithm;
use crate::errors::{bail, ensure, unsupported_err, Error, Result};
use crate::parsing::BufParsing;
use crate::ser::Serialize;

const EXPBIAS: u32 = 6;
/// Count octet used for new iterated and salted specifiers.
pub const DEFAULT_ITER_SALTED_COUNT: u8 = 224;

const GNU_EXTENSION: u8 = 101;
const GNU_MODE_DUMMY: u8 = 1;
const GNU_MODE_DIVERT_TO_CARD: u8 = 2;

/// A String-To-Key specifier: how a passphrase turns into a symmetric key.
///
/// Ref: <https://www.rfc-editor.org/rfc/rfc9580.html#name-string-to-key-s2k-specifier>
#[derive(Clone, PartialEq, Eq, derive_more::Debug)]
pub enum StringToKey {
    Simple {
        hash_alg: HashAlgorithm,
    },
    Salted {
        hash_alg: HashAlgorithm,
        #[debug("{}", hex::encode(salt))]
        salt: [u8; 8],
    },
    IteratedAndSalted {
        hash_alg: HashAlgorithm,
        #[debug("{}", hex::encode(salt))]
        salt: [u8; 8],
        /// Encoded count, see [`StringToKey::count`].
        count: u8,
    },
    Argon2 {
        #[debug("{}", hex::encode(salt))]
        salt: [u8; 16],
        /// Number of passes
        t: u8,
        /// Degree of parallelism
        p: u8,
        /// Memory size exponent, the memory is `2^m_enc` KiB
        m_enc: u8,
    },
    /// GNU extension: the secret key material is not present at all.
    GnuDummy {
        hash_alg: HashAlgorithm,
    },
    /// GNU extension: the secret key material lives on a smartcard.
    GnuDivertToCard {
        hash_alg: HashAlgorithm,
        #[debug("{}", hex::encode(serial))]
        serial: Bytes,
    },
}

impl StringToKey {
    /// Iterated and salted SHA-256, with a fresh salt.
    pub fn new_default<R: CryptoRng + Rng>(rng: R) -> Self {
        Self::new_iterated(rng, HashAlgorithm::default(), DEFAULT_ITER_SALTED_COUNT)
    }

    pub fn new_iterated<R: CryptoRng + Rng>(mut rng: R, hash_alg: HashAlgorithm, count: u8) -> Self {
        let mut salt = [0u8; 8];
        rng.fill(&mut salt);

        StringToKey::IteratedAndSalted {
            hash_alg,
            salt,
            count,
        }
    }

    pub fn new_salted<R: CryptoRng + Rng>(mut rng: R, hash_alg: HashAlgorithm) -> Self {
        let mut salt = [0u8; 8];
        rng.fill(&mut salt);

        StringToKey::Salted { hash_alg, salt }
    }

    pub fn new_argon2<R: CryptoRng + Rng>(mut rng: R, t: u8, p: u8, m_enc: u8) -> Self {
        let mut salt = [0u8; 16];
        rng.fill(&mut salt);

        StringToKey::Argon2 { salt, t, p, m_enc }
    }

    /// The implicit specifier of packets whose usage octet is a cipher id.
    pub fn new_legacy() -> Self {
        StringToKey::Simple {
            hash_alg: HashAlgorithm::Md5,
        }
    }

    /// The type octet.
    pub fn id(&self) -> u8 {
        match self {
            Self::Simple { .. } => 0,
            Self::Salted { .. } => 1,
            Self::IteratedAndSalted { .. } => 3,
            Self::Argon2 { .. } => 4,
            Self::GnuDummy { .. } | Self::GnuDivertToCard { .. } => GNU_EXTENSION,
        }
    }

    pub fn hash_alg(&self) -> Option<HashAlgorithm> {
        match self {
            Self::Simple { hash_alg }
            | Self::Salted { hash_alg, .. }
            | Self::IteratedAndSalted { hash_alg, .. }
            | Self::GnuDummy { hash_alg }
            | Self::GnuDivertToCard { hash_alg, .. } => Some(*hash_alg),
            Self::Argon2 { .. } => None,
        }
    }

    /// Converts a coded count into the count.
    /// Ref: <https://www.rfc-editor.org/rfc/rfc9580.html#name-iterated-and-salted-s2k>
    pub fn count(&self) -> Option<usize> {
        match self {
            Self::IteratedAndSalted { count, .. } => Some(decode_count(*count)),
            _ => None,
        }
    }

    /// The specifier only marks a key whose secret material is absent.
    pub fn is_gnu_extension(&self) -> bool {
        matches!(self, Self::GnuDummy { .. } | Self::GnuDivertToCard { .. })
    }

    /// Implementations MUST NOT generate packets using MD5, SHA-1, or RIPEMD-160 as a hash
    /// function in an S2K KDF.
    pub fn known_weak_hash_algo(&self) -> bool {
        self.hash_alg().is_some_and(HashAlgorithm::is_weak)
    }

    /// Derives a key of `key_size` bytes from the passphrase.
    pub fn derive_key(&self, passphrase: &[u8], key_size: usize) -> Result<Zeroizing<Vec<u8>>> {
        match self {
            Self::Simple { hash_alg } => derive_classic(*hash_alg, None, None, passphrase, key_size),
            Self::Salted { hash_alg, salt } => {
                derive_classic(*hash_alg, Some(salt), None, passphrase, key_size)
            }
            Self::IteratedAndSalted {
                hash_alg,
                salt,
                count,
            } => derive_classic(
                *hash_alg,
                Some(salt),
                Some(decode_count(*count)),
                passphrase,
                key_size,
            ),
            Self::Argon2 { salt, t, p, m_enc } => {
                ensure!(*m_enc < 32, "argon2 memory exponent {} is too large", m_enc);
                let mem_kib = 1u32 << m_enc;
                debug!("argon2id: t={t}, p={p}, m={mem_kib}KiB");

                let params = Params::new(mem_kib, u32::from(*t), u32::from(*p), Some(key_size))?;
                let argon = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

                let mut key = Zeroizing::new(vec![0u8; key_size]);
                argon.hash_password_into(passphrase, salt, &mut key)?;

                Ok(key)
            }
            Self::GnuDummy { .. } | Self::GnuDivertToCard { .. } => {
                Err(Error::UnsupportedS2kType { typ: self.id() })
            }
        }
    }

    /// Parses a specifier from the start of `i`.
    pub fn try_from_buf<B: Buf>(mut i: B) -> Result<Self> {
        let typ = i.read_u8("s2k type")?;

        let s2k = match typ {
            0 => {
                let hash_alg = i.read_u8("s2k hash")?.into();
                Self::Simple { hash_alg }
            }
            1 => {
                let hash_alg = i.read_u8("s2k hash")?.into();
                let salt = i.read_array::<8>("s2k salt")?;
                Self::Salted { hash_alg, salt }
            }
            3 => {
                let hash_alg = i.read_u8("s2k hash")?.into();
                let salt = i.read_array::<8>("s2k salt")?;
                let count = i.read_u8("s2k count")?;
                Self::IteratedAndSalted {
                    hash_alg,
                    salt,
                    count,
                }
            }
            4 => {
                let salt = i.read_array::<16>("argon2 salt")?;
                let t = i.read_u8("argon2 t")?;
                let p = i.read_u8("argon2 p")?;
                let m_enc = i.read_u8("argon2 m_enc")?;
                Self::Argon2 { salt, t, p, m_enc }
            }
            GNU_EXTENSION => {
                let hash_alg = i.read_u8("s2k hash")?.into();
                i.read_tag(b"GNU", "gnu s2k")?;
                match i.read_u8("gnu s2k mode")? {
                    GNU_MODE_DUMMY => Self::GnuDummy { hash_alg },
                    GNU_MODE_DIVERT_TO_CARD => {
                        let len = i.read_u8("card serial length")?;
                        let serial = i.read_take(usize::from(len), "card serial")?;
                        Self::GnuDivertToCard { hash_alg, serial }
                    }
                    mode => unsupported_err!("gnu s2k extension mode {}", mode),
                }
            }
            _ => return Err(Error::UnsupportedS2kType { typ }),
        };

        if let Some(hash_alg) = s2k.hash_alg() {
            if hash_alg.is_weak() {
                debug!("s2k uses weak hash {hash_alg}");
            }
        }

        Ok(s2k)
    }
}

/// Converts the coded count octet into the number of bytes to hash.
pub fn decode_count(c: u8) -> usize {
    ((16u32 + u32::from(c & 15)) << (u32::from(c >> 4) + EXPBIAS)) as usize
}

/// Simple, salted and iterated derivation.
///
/// Every round hashes `round` zero bytes followed by the (virtual) input, and the
/// round digests are concatenated until `key_size` bytes are available. An iterated
/// round feeds `salt || passphrase` repeatedly until exactly `count` bytes went in,
/// cutting the last repetition short, even when that is the first.
pub(crate) fn derive_classic(
    hash_alg: HashAlgorithm,
    salt: Option<&[u8]>,
    count: Option<usize>,
    passphrase: &[u8],
    key_size: usize,
) -> Result<Zeroizing<Vec<u8>>> {
    let Some(digest_size) = hash_alg.digest_size() else {
        unsupported_err!("s2k hash {:?}", hash_alg);
    };
    let rounds = key_size.div_ceil(digest_size);
    debug!("s2k {hash_alg}: {rounds} rounds for {key_size} bytes, count {count:?}");

    let mut data = Zeroizing::new(Vec::with_capacity(
        salt.map(<[u8]>::len).unwrap_or_default() + passphrase.len(),
    ));
    if let Some(salt) = salt {
        data.extend_from_slice(salt);
    }
    data.extend_from_slice(passphrase);

    let zeros = vec![0u8; rounds];
    let mut key = Zeroizing::new(Vec::with_capacity(rounds * digest_size));

    for round in 0..rounds {
        let mut hasher = hash_alg.new_hasher()?;
        hasher.update(&zeros[..round]);

        match count {
            None => hasher.update(&data),
            Some(count) => {
                let mut remaining = count;
                while remaining > 0 && !data.is_empty() {
                    let n = remaining.min(data.len());
                    hasher.update(&data[..n]);
                    remaining -= n;
                }
            }
        }

        let digest = Zeroizing::new(hasher.finalize());
        key.extend_from_slice(&digest);
    }
    key.truncate(key_size);

    Ok(key)
}

impl Serialize for StringToKey {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&[self.id()])?;

        match self {
            Self::Simple { hash_alg } => {
                writer.write_all(&[u8::from(*hash_alg)])?;
            }
            Self::Salted { hash_alg, salt } => {
                writer.write_all(&[u8::from(*hash_alg)])?;
                writer.write_all(salt)?;
            }
            Self::IteratedAndSalted {
                hash_alg,
                salt,
                count,
            } => {
                writer.write_all(&[u8::from(*hash_alg)])?;
                writer.write_all(salt)?;
                writer.write_all(&[*count])?;
            }
            Self::Argon2 { salt, t, p, m_enc } => {
                writer.write_all(salt)?;
                writer.write_all(&[*t, *p, *m_enc])?;
            }
            Self::GnuDummy { hash_alg } => {
                writer.write_all(&[u8::from(*hash_alg)])?;
                writer.write_all(b"GNU")?;
                writer.write_all(&[GNU_MODE_DUMMY])?;
            }
            Self::GnuDivertToCard { hash_alg, serial } => {
                let Ok(len) = u8::try_from(serial.len()) else {
                    bail!("card serial too long: {}", serial.len());
                };
                writer.write_all(&[u8::from(*hash_alg)])?;
                writer.write_all(b"GNU")?;
                writer.write_all(&[GNU_MODE_DIVERT_TO_CARD, len])?;
                writer.write_all(serial)?;
            }
        }

        Ok(())
    }

    fn write_len(&self) -> usize {
        1 + match self {
            Self::Simple { .. } => 1,
            Self::Salted { .. } => 1 + 8,
            Self::IteratedAndSalted { .. } => 1 + 8 + 1,
            Self::Argon2 { .. } => 16 + 3,
            Self::GnuDummy { .. } => 1 + 3 + 1,
            Self::GnuDivertToCard { serial, .. } => 1 + 3 + 2 + serial.len(),
        }
    }
}

/// Logs a warning when a weak construction is about to be written.
pub(crate) fn warn_weak(s2k: &StringToKey) {
    if s2k.known_weak_hash_algo() {
        warn!("creating key protection with weak s2k {:?}", s2k);
    }
}
