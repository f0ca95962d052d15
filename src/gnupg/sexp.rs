//! Reader for canonical S-expressions, as used by the GnuPG key store.
//!
//! Lists are delimited by `(` and `)`, atoms are written as
//! `<decimal length>:<bytes>` with no whitespace between tokens.

use std::io::BufRead;

use zeroize::Zeroizing;

use crate::errors::{bail, ensure, Result};

/// Atoms longer than this are rejected.
const MAX_ATOM_LEN: usize = 64 * 1024;

/// Digits of a length prefix, enough for [`MAX_ATOM_LEN`].
const MAX_LEN_DIGITS: usize = 5;

pub(crate) struct SexpReader<R> {
    inner: R,
}

impl<R: BufRead> SexpReader<R> {
    pub(crate) fn new(inner: R) -> Self {
        SexpReader { inner }
    }

    fn peek(&mut self) -> Result<Option<u8>> {
        let buf = self.inner.fill_buf()?;
        Ok(buf.first().copied())
    }

    fn next_byte(&mut self, expected: &str) -> Result<u8> {
        let Some(b) = self.peek()? else {
            bail!("unexpected end of s-expression, expected {}", expected);
        };
        self.inner.consume(1);
        Ok(b)
    }

    fn expect_byte(&mut self, token: u8) -> Result<()> {
        let b = self.next_byte(&(token as char).to_string())?;
        ensure!(
            b == token,
            "expected '{}', found 0x{:02x}",
            token as char,
            b
        );
        Ok(())
    }

    /// Consumes the opening paren of a list.
    pub(crate) fn skip_open(&mut self) -> Result<()> {
        self.expect_byte(b'(')
    }

    /// Consumes the closing paren of a list.
    pub(crate) fn skip_close(&mut self) -> Result<()> {
        self.expect_byte(b')')
    }

    /// Is the next token the start of a list?
    pub(crate) fn at_open(&mut self) -> Result<bool> {
        Ok(self.peek()? == Some(b'('))
    }

    fn read_len(&mut self) -> Result<usize> {
        let mut len = 0usize;
        let mut digits = 0;
        loop {
            let b = self.next_byte("atom length")?;
            match b {
                b'0'..=b'9' => {
                    ensure!(digits < MAX_LEN_DIGITS, "atom length prefix is too long");
                    len = len * 10 + usize::from(b - b'0');
                    digits += 1;
                }
                b':' if digits > 0 => break,
                _ => bail!("invalid atom length, found 0x{:02x}", b),
            }
        }
        ensure!(
            len <= MAX_ATOM_LEN,
            "atom of {} bytes exceeds the limit of {}",
            len,
            MAX_ATOM_LEN
        );
        Ok(len)
    }

    /// Reads a length prefixed atom.
    pub(crate) fn read_bytes(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        let len = self.read_len()?;
        let mut out = Zeroizing::new(vec![0u8; len]);
        let mut read = 0;
        while read < len {
            let buf = self.inner.fill_buf()?;
            if buf.is_empty() {
                bail!("atom declares {} bytes, only {} available", len, read);
            }
            let available = (len - read).min(buf.len());
            out[read..read + available].copy_from_slice(&buf[..available]);
            read += available;
            self.inner.consume(available);
        }
        Ok(out)
    }

    /// Reads an atom that must be valid UTF-8.
    pub(crate) fn read_string(&mut self) -> Result<String> {
        let bytes = self.read_bytes()?;
        let Ok(s) = std::str::from_utf8(&bytes) else {
            bail!("atom is not a valid string");
        };
        Ok(s.to_string())
    }

    /// Reads an atom and checks it against `expected`.
    pub(crate) fn expect_string(&mut self, expected: &str) -> Result<()> {
        let bytes = self.read_bytes()?;
        if &bytes[..] != expected.as_bytes() {
            bail!(
                "expected \"{}\", found \"{}\"",
                expected,
                String::from_utf8_lossy(&bytes)
            );
        }
        Ok(())
    }

    /// Skips the remaining tokens of the current list, including its closing paren.
    pub(crate) fn skip_rest(&mut self) -> Result<()> {
        let mut depth = 1usize;
        while depth > 0 {
            match self.peek()? {
                Some(b'(') => {
                    self.inner.consume(1);
                    depth += 1;
                }
                Some(b')') => {
                    self.inner.consume(1);
                    depth -= 1;
                }
                Some(_) => {
                    self.read_bytes()?;
                }
                None => bail!("unexpected end of s-expression in list"),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn test_tokens() {
        let mut r = SexpReader::new(&b"(3:ecc(5:curve10:NIST P-256)4:\x00\x01\x02\x03)"[..]);
        r.skip_open().unwrap();
        r.expect_string("ecc").unwrap();
        assert!(r.at_open().unwrap());
        r.skip_open().unwrap();
        r.expect_string("curve").unwrap();
        assert_eq!(r.read_string().unwrap(), "NIST P-256");
        r.skip_close().unwrap();
        assert_eq!(&r.read_bytes().unwrap()[..], &[0, 1, 2, 3]);
        assert!(!r.at_open().unwrap());
        r.skip_close().unwrap();
        assert!(r.skip_close().is_err());
    }

    #[test]
    fn test_skip_rest() {
        let mut r = SexpReader::new(&b"(5:flags(1:a1:b)3:xyz)(1:q)"[..]);
        r.skip_open().unwrap();
        r.expect_string("flags").unwrap();
        r.skip_rest().unwrap();
        r.skip_open().unwrap();
        r.expect_string("q").unwrap();
    }

    #[test]
    fn test_errors() {
        let err = SexpReader::new(&b"3:abc"[..])
            .expect_string("abd")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(err.to_string().contains("abd"));

        // truncated atom
        assert!(SexpReader::new(&b"5:abc"[..]).read_bytes().is_err());
        // oversized atom
        assert!(SexpReader::new(&b"65537:"[..]).read_bytes().is_err());
        assert!(SexpReader::new(&b"123456:"[..]).read_bytes().is_err());
        // missing length
        assert!(SexpReader::new(&b":abc"[..]).read_bytes().is_err());
        assert!(SexpReader::new(&b""[..]).skip_open().is_err());
    }
}
