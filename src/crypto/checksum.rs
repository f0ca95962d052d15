use sha1_checked::{CollisionResult, Digest, Sha1};

use crate::errors::{integrity_err, Error, Result};

/// Two octet checksum: sum of all octets mod 65536.
#[inline]
pub fn calculate_simple(data: &[u8]) -> u16 {
    data.iter()
        .fold(0u16, |acc, &v| acc.wrapping_add(u16::from(v)))
}

/// Verifies a big-endian two octet checksum against `data`.
pub fn simple(actual: &[u8], data: &[u8]) -> Result<()> {
    let Ok(actual) = <[u8; 2]>::try_from(actual) else {
        return Err(integrity_err!("checksum must be 2 bytes, got {}", actual.len()));
    };
    let expected = calculate_simple(data);
    if u16::from_be_bytes(actual) != expected {
        return Err(integrity_err!(
            "invalid simple checksum: {:04x} != {:04x}",
            u16::from_be_bytes(actual),
            expected
        ));
    }

    Ok(())
}

/// SHA-1 over the concatenation of `data`, using sha1_checked.
pub fn calculate_sha1<I, T>(data: I) -> Result<[u8; 20]>
where
    T: AsRef<[u8]>,
    I: IntoIterator<Item = T>,
{
    let mut digest = Sha1::default();
    for chunk in data {
        digest.update(chunk.as_ref());
    }
    match digest.try_finalize() {
        CollisionResult::Ok(sha1) => Ok(sha1.into()),
        CollisionResult::Collision(_) | CollisionResult::Mitigated(_) => {
            Err(Error::Sha1HashCollision)
        }
    }
}

/// Verifies a SHA-1 hash tag against `data`.
pub fn sha1(hash: &[u8], data: &[u8]) -> Result<()> {
    let expected = calculate_sha1([data])?;
    if hash != expected {
        return Err(integrity_err!("invalid SHA1 checksum"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;

    #[test]
    fn test_simple_checksum() {
        assert_eq!(calculate_simple(&[]), 0);
        assert_eq!(calculate_simple(&[0xff, 0xff, 0x02]), 0x0200);
        // wraps at 2^16
        let data = vec![0xffu8; 258];
        assert_eq!(calculate_simple(&data), (258u32 * 255 % 65536) as u16);

        simple(&[0x02, 0x00], &[0xff, 0xff, 0x02]).unwrap();
        assert!(simple(&[0x02, 0x01], &[0xff, 0xff, 0x02])
            .unwrap_err()
            .is_integrity());
        assert!(simple(&[0x02], &[]).unwrap_err().is_integrity());
    }

    #[test]
    fn test_sha1() {
        let hash = calculate_sha1([&b"hel"[..], &b"lo"[..]]).unwrap();
        assert_eq!(hash, hex!("aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d"));
        sha1(&hash, b"hello").unwrap();
        assert!(sha1(&hash, b"hellO").unwrap_err().is_integrity());
    }
}
