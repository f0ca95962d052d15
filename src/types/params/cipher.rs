//! Symmetric protection of secret key material.
//!
//! Version 4 keys encrypt the whole plaintext once with CFB. Version 2 and 3
//! keys encrypt only the magnitude of each of the four RSA MPIs, restarting
//! CFB for every field with an IV taken from the preceding ciphertext.

use log::debug;
use rand::{CryptoRng, Rng};
use zeroize::Zeroizing;

use crate::crypto::sym::SymmetricKeyAlgorithm;
use crate::errors::{bail, ensure, ensure_eq, Result};

/// Number of MPIs in a version 3 RSA secret key: d, p, q, u.
const V3_FIELDS: usize = 4;

/// Encrypts `plaintext` with CFB, generating a fresh IV unless one is given.
///
/// Returns the ciphertext and the IV that was used.
pub fn encrypt<R: CryptoRng + Rng>(
    rng: R,
    sym_alg: SymmetricKeyAlgorithm,
    key: &[u8],
    iv: Option<&[u8]>,
    plaintext: &[u8],
) -> Result<(Vec<u8>, Vec<u8>)> {
    let iv = match iv {
        Some(iv) => iv.to_vec(),
        None => sym_alg.new_iv(rng),
    };
    ensure_eq!(iv.len(), sym_alg.block_size(), "invalid iv length");

    let mut data = plaintext.to_vec();
    sym_alg.encrypt_with_iv_regular(key, &iv, &mut data)?;

    Ok((data, iv))
}

/// Decrypts `ciphertext` with CFB.
pub fn decrypt(
    sym_alg: SymmetricKeyAlgorithm,
    key: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    ensure_eq!(iv.len(), sym_alg.block_size(), "invalid iv length");

    let mut data = Zeroizing::new(ciphertext.to_vec());
    sym_alg.decrypt_with_iv_regular(key, iv, &mut data)?;

    Ok(data)
}

/// Decrypts `ciphertext` with CBC and no padding, as GnuPG does for its key files.
pub fn decrypt_cbc(
    sym_alg: SymmetricKeyAlgorithm,
    key: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    let mut data = Zeroizing::new(ciphertext.to_vec());
    sym_alg.decrypt_cbc_no_padding(key, iv, &mut data)?;

    Ok(data)
}

/// Encrypts a version 3 RSA key.
///
/// `plaintext` holds the four MPIs followed by the two octet checksum. Length
/// prefixes and checksum stay in the clear.
pub fn encrypt_v3(
    sym_alg: SymmetricKeyAlgorithm,
    key: &[u8],
    iv: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>> {
    let mut data = plaintext.to_vec();
    chain_v3(sym_alg, key, iv, &mut data, Direction::Encrypt)?;
    Ok(data)
}

/// Decrypts a version 3 RSA key, the inverse of [`encrypt_v3`].
pub fn decrypt_v3(
    sym_alg: SymmetricKeyAlgorithm,
    key: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    let mut data = Zeroizing::new(ciphertext.to_vec());
    chain_v3(sym_alg, key, iv, &mut data, Direction::Decrypt)?;
    Ok(data)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Encrypt,
    Decrypt,
}

fn chain_v3(
    sym_alg: SymmetricKeyAlgorithm,
    key: &[u8],
    iv: &[u8],
    data: &mut [u8],
    direction: Direction,
) -> Result<()> {
    let bs = sym_alg.block_size();
    ensure_eq!(iv.len(), bs, "invalid iv length");
    debug!("v3 {:?} of {} bytes with {:?}", direction, data.len(), sym_alg);

    let mut iv = iv.to_vec();
    let mut pos = 0;

    for field in 0..V3_FIELDS {
        ensure!(
            data.len() - pos >= 2,
            "missing length of secret field {}",
            field
        );
        let bits = u16::from_be_bytes([data[pos], data[pos + 1]]);
        pos += 2;

        let len = (usize::from(bits) + 7) / 8;
        if len > data.len() - pos {
            bail!(
                "secret field {} declares {} bytes, only {} remaining",
                field,
                len,
                data.len() - pos
            );
        }

        // the next iv is the last block of ciphertext ending at this field
        let end = pos + len;
        ensure!(end >= bs, "secret field {} is too short for iv chaining", field);
        let next_iv = if direction == Direction::Decrypt {
            Some(data[end - bs..end].to_vec())
        } else {
            None
        };

        let field_data = &mut data[pos..end];
        match direction {
            Direction::Encrypt => sym_alg.encrypt_with_iv_regular(key, &iv, field_data)?,
            Direction::Decrypt => sym_alg.decrypt_with_iv_regular(key, &iv, field_data)?,
        }
        pos = end;

        if field + 1 < V3_FIELDS {
            iv = match next_iv {
                Some(next) => next,
                None => data[end - bs..end].to_vec(),
            };
        }
    }

    ensure_eq!(
        data.len() - pos,
        2,
        "expected a two octet checksum after the secret fields"
    );

    Ok(())
}
