use zeroize::Zeroizing;

/// A passphrase handed to key derivation.
///
/// The variant decides who owns the buffer: an `Owned` passphrase is wiped
/// when it is dropped, a `Borrowed` one is only read and stays untouched.
#[derive(derive_more::Debug)]
pub enum Passphrase<'a> {
    Owned(#[debug("***")] Zeroizing<Vec<u8>>),
    Borrowed(#[debug("***")] &'a [u8]),
}

impl Passphrase<'static> {
    /// Legacy conversion: every `char` is truncated to its low byte.
    ///
    /// This matches what older PGP implementations did with non-ASCII
    /// passphrases. Prefer [`Passphrase::utf8`] for new keys.
    pub fn legacy(value: &str) -> Self {
        Self::Owned(Zeroizing::new(value.chars().map(|c| c as u8).collect()))
    }

    /// The UTF-8 encoding of `value`.
    pub fn utf8(value: &str) -> Self {
        Self::Owned(Zeroizing::new(value.as_bytes().to_vec()))
    }

    /// Takes ownership of `value`, it is zeroed once the passphrase is dropped.
    pub fn owned(value: Vec<u8>) -> Self {
        Self::Owned(Zeroizing::new(value))
    }

    pub fn empty() -> Self {
        Self::Owned(Zeroizing::new(Vec::new()))
    }
}

impl<'a> Passphrase<'a> {
    /// Borrows caller bytes as they are.
    pub fn raw(value: &'a [u8]) -> Self {
        Self::Borrowed(value)
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Owned(v) => v.as_slice(),
            Self::Borrowed(v) => v,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

impl Default for Passphrase<'static> {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<&str> for Passphrase<'static> {
    fn from(value: &str) -> Self {
        Self::utf8(value)
    }
}

impl From<String> for Passphrase<'static> {
    fn from(value: String) -> Self {
        Self::owned(value.into_bytes())
    }
}

impl<'a> From<&'a [u8]> for Passphrase<'a> {
    fn from(value: &'a [u8]) -> Self {
        Self::raw(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encodings() {
        assert_eq!(Passphrase::utf8("abc").as_bytes(), b"abc");
        assert_eq!(Passphrase::legacy("abc").as_bytes(), b"abc");

        // U+00E9 is two bytes in UTF-8, but a single byte in the legacy form
        assert_eq!(Passphrase::utf8("\u{e9}").as_bytes(), &[0xc3, 0xa9]);
        assert_eq!(Passphrase::legacy("\u{e9}").as_bytes(), &[0xe9]);
        // U+20AC keeps only its low byte
        assert_eq!(Passphrase::legacy("\u{20ac}").as_bytes(), &[0xac]);
    }

    #[test]
    fn test_borrowed_is_untouched() {
        let buf = vec![1u8, 2, 3];
        {
            let pw = Passphrase::raw(&buf);
            assert_eq!(pw.as_bytes(), &[1, 2, 3]);
        }
        assert_eq!(buf, vec![1, 2, 3]);
    }

    #[test]
    fn test_debug_hides_secret() {
        let pw = Passphrase::utf8("secret");
        assert_eq!(format!("{pw:?}"), "Owned(***)");
        assert!(Passphrase::default().is_empty());
    }
}
