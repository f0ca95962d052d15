use std::io;

use byteorder::{BigEndian, WriteBytesExt};
use bytes::{Buf, Bytes};
use num_bigint::BigUint;
use zeroize::Zeroize;

use crate::errors::{bail, Result};
use crate::parsing::BufParsing;
use crate::ser::Serialize;

/// Number of bits we accept when reading or writing MPIs.
/// The value is the same as gnupgs.
const MAX_EXTERN_MPI_BITS: u16 = 16384;

/// Represents an owned MPI value.
/// The inner value is ready to be serialized, without the need to strip leading zeros.
///
/// Ref: <https://www.rfc-editor.org/rfc/rfc9580.html#name-multiprecision-integers>
#[derive(Default, Clone, PartialEq, Eq, derive_more::Debug)]
pub struct MpiBytes(#[debug("{}", hex::encode(_0))] Bytes);

impl MpiBytes {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parses the given buffer as an MPI.
    ///
    /// The buffer is expected to be length-prefixed.
    pub fn from_buf<B: Buf>(mut i: B) -> Result<Self> {
        let len_bits = i.read_be_u16("mpi bit length")?;

        if len_bits > MAX_EXTERN_MPI_BITS {
            bail!("mpi of {} bits is too large", len_bits);
        }

        let len_bytes = (len_bits + 7) >> 3;
        let n = i.read_take(usize::from(len_bytes), "mpi")?;
        let n_stripped = strip_leading_zeros(&n);
        let n_stripped = n.slice_ref(n_stripped);

        Ok(MpiBytes(n_stripped))
    }

    /// Represent the data in `raw` as an Mpi.
    /// Note that `raw` is not expected to be length-prefixed!
    ///
    /// Strips leading zeros.
    pub fn from_slice(raw: &[u8]) -> Self {
        Self(strip_leading_zeros(raw).to_vec().into())
    }

    /// The declared bit length, as written in the length prefix.
    pub fn bits(&self) -> Result<u16> {
        let bits = bit_size(&self.0);
        let Ok(bits) = u16::try_from(bits) else {
            bail!("mpi of {} bits is too large", bits);
        };
        Ok(bits)
    }

    /// Left pads the value with zeros to `size` bytes.
    pub fn to_padded(&self, size: usize) -> Result<Vec<u8>> {
        pad_key(&self.0, size)
    }
}

/// Reads a length-prefixed MPI in place, returning the magnitude without
/// leading zeros. Secret material is never copied into a [`Bytes`] this way.
pub(crate) fn mpi_slice<'a>(i: &mut &'a [u8]) -> Result<&'a [u8]> {
    let len_bits = i.read_be_u16("mpi bit length")?;
    if len_bits > MAX_EXTERN_MPI_BITS {
        bail!("mpi of {} bits is too large", len_bits);
    }

    let len_bytes = usize::from((len_bits + 7) >> 3);
    if i.len() < len_bytes {
        bail!(
            "mpi declares {} bytes, only {} remaining",
            len_bytes,
            i.len()
        );
    }
    let (n, rest) = i.split_at(len_bytes);
    *i = rest;

    Ok(strip_leading_zeros(n))
}

/// Left pads `val` with zeros to exactly `size` bytes.
pub(crate) fn pad_key(val: &[u8], size: usize) -> Result<Vec<u8>> {
    if val.len() > size {
        bail!("invalid secret key size: {} > {}", val.len(), size);
    }

    let mut key = vec![0u8; size];
    key[size - val.len()..].copy_from_slice(val);
    Ok(key)
}

/// Returns the bit length of a given slice.
#[inline]
pub(crate) fn bit_size(val: &[u8]) -> usize {
    if val.is_empty() {
        0
    } else {
        (val.len() * 8) - val[0].leading_zeros() as usize
    }
}

#[inline]
pub(crate) fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    bytes
        .iter()
        .position(|b| b != &0)
        .map_or(&[], |offset| &bytes[offset..])
}

impl AsRef<[u8]> for MpiBytes {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl Serialize for MpiBytes {
    fn to_writer<W: io::Write>(&self, w: &mut W) -> Result<()> {
        w.write_u16::<BigEndian>(self.bits()?)?;
        w.write_all(&self.0)?;

        Ok(())
    }

    fn write_len(&self) -> usize {
        2 + self.0.len()
    }
}

impl From<BigUint> for MpiBytes {
    fn from(other: BigUint) -> Self {
        MpiBytes::from(&other)
    }
}

impl From<&BigUint> for MpiBytes {
    fn from(other: &BigUint) -> Self {
        let mut bytes = other.to_bytes_be();
        let mpi = MpiBytes::from_slice(&bytes);
        bytes.zeroize();
        mpi
    }
}

impl From<&MpiBytes> for BigUint {
    fn from(other: &MpiBytes) -> Self {
        BigUint::from_bytes_be(other.as_ref())
    }
}

impl From<MpiBytes> for BigUint {
    fn from(other: MpiBytes) -> Self {
        BigUint::from(&other)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    impl Arbitrary for MpiBytes {
        type Parameters = ();
        type Strategy = BoxedStrategy<Self>;

        fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
            proptest::collection::vec(0u8..255, 1..500)
                .prop_map(|v| MpiBytes::from_slice(&v))
                .boxed()
        }
    }

    #[test]
    fn test_mpi() {
        // Decode the number `511` (`0x1FF` in hex).
        assert_eq!(
            MpiBytes::from_buf(&mut &[0x00, 0x09, 0x01, 0xFF][..]).unwrap(),
            MpiBytes::from_slice(&[0x01, 0xFF][..])
        );

        // Decode the number `2^255 + 7`.
        let mut encoded = vec![0x01, 0x00, 0x80];
        encoded.extend_from_slice(&[0u8; 30]);
        encoded.push(0x07);
        let mut expected = vec![0x80];
        expected.extend_from_slice(&[0u8; 30]);
        expected.push(0x07);
        assert_eq!(
            MpiBytes::from_buf(&mut &encoded[..]).unwrap(),
            MpiBytes::from_slice(&expected)
        );
    }

    #[test]
    fn test_mpi_length_checks() {
        // declares 16 bits, only one byte present
        assert!(MpiBytes::from_buf(&mut &[0x00, 0x10, 0x01][..]).is_err());
        // larger than gnupg accepts
        assert!(MpiBytes::from_buf(&mut &[0x40, 0x01, 0x01][..]).is_err());
    }

    #[test]
    fn test_mpi_slice() {
        let mut i = &[0x00, 0x09, 0x01, 0xFF, 0x00, 0x01, 0x01, 0xAA][..];
        assert_eq!(mpi_slice(&mut i).unwrap(), &[0x01, 0xFF]);
        assert_eq!(mpi_slice(&mut i).unwrap(), &[0x01]);
        assert_eq!(i, &[0xAA]);

        let mut short = &[0x00, 0x20, 0x01][..];
        assert!(mpi_slice(&mut short).is_err());
    }

    #[test]
    fn test_leading_zeros_are_not_counted() {
        let mpi = MpiBytes::from_slice(&[0x00, 0x00, 0x01, 0x00]);
        assert_eq!(mpi.bits().unwrap(), 9);
        assert_eq!(mpi.to_bytes().unwrap(), vec![0x00, 0x09, 0x01, 0x00]);
        assert_eq!(mpi.to_padded(4).unwrap(), vec![0x00, 0x00, 0x01, 0x00]);
        assert!(mpi.to_padded(1).is_err());
    }

    #[test]
    fn test_oversized_value_is_rejected() {
        let mpi = MpiBytes::from_slice(&[0xff; 8191]);
        assert_eq!(mpi.bits().unwrap(), 65528);

        let mpi = MpiBytes::from_slice(&[0xff; 8192]);
        assert!(mpi.bits().is_err());
        assert!(mpi.to_bytes().is_err());
    }

    #[test]
    fn test_strip_leading_zeros_with_all_zeros() {
        let buf = [0u8, 0u8, 0u8];
        let stripped: &[u8] = strip_leading_zeros(&buf[..]);
        assert!(stripped.is_empty());
        assert_eq!(MpiBytes::from_slice(&buf).to_bytes().unwrap(), vec![0, 0]);
    }

    proptest! {
        #[test]
        fn mpi_bytes_write_len(m: MpiBytes) {
            let mut buf = Vec::new();
            m.to_writer(&mut buf)?;

            prop_assert_eq!(m.write_len(), buf.len());
        }

        #[test]
        fn mpi_bytes_roundtrip(m: MpiBytes) {
            let mut buf = Vec::new();
            m.to_writer(&mut buf)?;

            let m_back = MpiBytes::from_buf(&mut &buf[..])?;
            prop_assert_eq!(m, m_back);
        }

        #[test]
        fn mpi_biguint_roundtrip(m: MpiBytes) {
            let n: BigUint = (&m).into();
            prop_assert_eq!(MpiBytes::from(&n), m);
        }
    }
}
