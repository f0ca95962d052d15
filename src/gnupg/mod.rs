//! Import of GnuPG `protected-private-key` exports.
//!
//! GnuPG 2.1+ keeps secret keys in its agent as canonical S-expressions,
//! protected with an iterated and salted S2K and AES-128 in CBC mode.

use std::io::BufRead;
use std::str::FromStr;

use log::debug;
use zeroize::Zeroizing;

use crate::crypto::ecc_curve::ECCCurve;
use crate::crypto::hash::HashAlgorithm;
use crate::crypto::public_key::PublicKeyAlgorithm;
use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::errors::{bail, ensure, format_err, integrity_err, unsupported_err, Result};
use crate::types::params::cipher;
use crate::types::{derive_classic, MpiBytes, PrivateKey, PublicParams, SecretMaterial};

mod sexp;

use self::sexp::SexpReader;

const PROTECTION_MODE: &str = "openpgp-s2k3-sha1-aes-cbc";
const PROTECTION_CIPHER: SymmetricKeyAlgorithm = SymmetricKeyAlgorithm::AES128;

/// A decrypted elliptic curve key from a GnuPG export.
#[derive(Clone, PartialEq, Eq, derive_more::Debug)]
pub struct GnupgSecret {
    curve: ECCCurve,
    #[debug("{}", hex::encode(q))]
    q: Vec<u8>,
    #[debug("***")]
    d: Zeroizing<Vec<u8>>,
}

/// The parameters of the `protected` list.
struct Protected {
    hash_alg: HashAlgorithm,
    salt: Vec<u8>,
    count: usize,
    iv: Vec<u8>,
    ciphertext: Vec<u8>,
}

impl GnupgSecret {
    /// Parses and decrypts a `protected-private-key` S-expression.
    pub fn from_reader<R: BufRead>(reader: R, passphrase: &[u8]) -> Result<Self> {
        let mut r = SexpReader::new(reader);

        r.skip_open()?;
        r.expect_string("protected-private-key")?;
        r.skip_open()?;
        let algo = r.read_string()?;
        if algo != "ecc" {
            unsupported_err!("gnupg key algorithm {:?}", algo);
        }

        r.skip_open()?;
        r.expect_string("curve")?;
        let curve_name = r.read_string()?;
        r.skip_close()?;
        let name = curve_name.strip_prefix("NIST ").unwrap_or(&curve_name);
        let Some(curve) = ECCCurve::from_name(name) else {
            unsupported_err!("gnupg curve {:?}", curve_name);
        };

        // optional flags, then the public point
        let q = loop {
            r.skip_open()?;
            let name = r.read_string()?;
            match name.as_str() {
                "flags" => r.skip_rest()?,
                "q" => {
                    let q = r.read_bytes()?.to_vec();
                    // must fit the bit length prefix of an mpi
                    MpiBytes::from_slice(&q).bits()?;
                    r.skip_close()?;
                    break q;
                }
                _ => bail!("expected \"q\", found \"{}\"", name),
            }
        };

        r.skip_open()?;
        r.expect_string("protected")?;
        let protected = read_protected(&mut r)?;

        // trailing lists such as protected-at
        while r.at_open()? {
            r.skip_open()?;
            r.skip_rest()?;
        }
        r.skip_close()?;
        r.skip_close()?;

        let d = decrypt(&protected, passphrase)?;
        let secret = GnupgSecret { curve, q, d };
        secret.check_public()?;

        Ok(secret)
    }

    pub fn curve(&self) -> &ECCCurve {
        &self.curve
    }

    /// The public point, as stored by GnuPG.
    pub fn q(&self) -> &[u8] {
        &self.q
    }

    /// The private scalar.
    pub fn d(&self) -> &[u8] {
        &self.d
    }

    /// The OpenPGP algorithm of a key on this curve.
    pub fn algorithm(&self) -> Result<PublicKeyAlgorithm> {
        match self.curve {
            ECCCurve::Ed25519 => Ok(PublicKeyAlgorithm::EdDSALegacy),
            ref curve if curve.is_montgomery() || matches!(curve, ECCCurve::Ed448) => {
                unsupported_err!("import of gnupg {} keys", curve)
            }
            _ => Ok(PublicKeyAlgorithm::ECDSA),
        }
    }

    pub fn public_params(&self) -> Result<PublicParams> {
        let q = MpiBytes::from_slice(&self.q);
        match self.algorithm()? {
            PublicKeyAlgorithm::EdDSALegacy => Ok(PublicParams::EdDsaLegacy {
                curve: self.curve.clone(),
                q,
            }),
            _ => Ok(PublicParams::Ecdsa {
                curve: self.curve.clone(),
                p: q,
            }),
        }
    }

    pub fn material(&self) -> Result<SecretMaterial> {
        match self.algorithm()? {
            PublicKeyAlgorithm::EdDSALegacy => {
                let seed = MpiBytes::from_slice(&self.d).to_padded(32)?;
                Ok(SecretMaterial::eddsa_legacy(&Zeroizing::new(seed)))
            }
            _ => Ok(SecretMaterial::ecdsa(&self.d)),
        }
    }

    /// Checks `d` against `q` on the curves this crate computes points for.
    fn check_public(&self) -> Result<()> {
        if !matches!(
            self.curve,
            ECCCurve::P256
                | ECCCurve::P384
                | ECCCurve::P521
                | ECCCurve::Secp256k1
                | ECCCurve::Ed25519
        ) {
            debug!("not checking gnupg key on {}", self.curve);
            return Ok(());
        }

        let public = self.public_params()?;
        let key = PrivateKey::from_material(&self.material()?, &public)
            .map_err(|err| integrity_err!("invalid gnupg secret scalar: {}", err))?;
        key.verify_public(&public)
    }
}

fn read_protected<R: BufRead>(r: &mut SexpReader<R>) -> Result<Protected> {
    let mode = r.read_string()?;
    if mode != PROTECTION_MODE {
        unsupported_err!("gnupg protection mode {:?}", mode);
    }

    r.skip_open()?;
    r.skip_open()?;
    let hash_alg = HashAlgorithm::from_str(&r.read_string()?)?;
    let salt = r.read_bytes()?.to_vec();
    ensure!(salt.len() == 8, "invalid s2k salt length {}", salt.len());
    let count = r.read_string()?;
    let count: usize = count
        .parse()
        .map_err(|_| format_err!("invalid s2k count {:?}", count))?;
    r.skip_close()?;
    let iv = r.read_bytes()?.to_vec();
    r.skip_close()?;
    let ciphertext = r.read_bytes()?.to_vec();
    r.skip_close()?;

    Ok(Protected {
        hash_alg,
        salt,
        count,
        iv,
        ciphertext,
    })
}

fn decrypt(protected: &Protected, passphrase: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    debug!(
        "gnupg key: {} s2k, count {}",
        protected.hash_alg, protected.count
    );
    let key = derive_classic(
        protected.hash_alg,
        Some(protected.salt.as_slice()),
        Some(protected.count),
        passphrase,
        PROTECTION_CIPHER.key_size(),
    )?;
    ensure!(
        protected.iv.len() == PROTECTION_CIPHER.block_size(),
        "invalid iv length {}",
        protected.iv.len()
    );
    let plaintext = cipher::decrypt_cbc(
        PROTECTION_CIPHER,
        &key,
        &protected.iv,
        &protected.ciphertext,
    )?;

    read_scalar(&plaintext).map_err(|_| integrity_err!("failed to decrypt gnupg secret key"))
}

/// Reads `(((1:d<scalar>)...` from the decrypted plaintext.
fn read_scalar(plaintext: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let mut r = SexpReader::new(plaintext);
    r.skip_open()?;
    r.skip_open()?;
    r.skip_open()?;
    r.expect_string("d")?;
    r.read_bytes()
}
