use const_oid::ObjectIdentifier;

const OID_CURVE25519: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.4.1.3029.1.5.1");
const OID_CURVE448: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.111");
const OID_ED25519: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.4.1.11591.15.1");
const OID_ED448: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.113");
const OID_P256: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");
const OID_P384: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.34");
const OID_P521: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.35");
const OID_BRAINPOOL_P256R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.36.3.3.2.8.1.1.7");
const OID_BRAINPOOL_P384R1: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.36.3.3.2.8.1.1.11");
const OID_BRAINPOOL_P512R1: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.36.3.3.2.8.1.1.13");
const OID_SECP256K1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.10");

/// Elliptic curves usable in ECDH, ECDSA and legacy EdDSA keys.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ECCCurve {
    Curve25519,
    Curve448,
    Ed25519,
    Ed448,
    P256,
    P384,
    P521,
    BrainpoolP256r1,
    BrainpoolP384r1,
    BrainpoolP512r1,
    Secp256k1,
    Unknown(ObjectIdentifier),
}

const KNOWN: [ECCCurve; 11] = [
    ECCCurve::Curve25519,
    ECCCurve::Curve448,
    ECCCurve::Ed25519,
    ECCCurve::Ed448,
    ECCCurve::P256,
    ECCCurve::P384,
    ECCCurve::P521,
    ECCCurve::BrainpoolP256r1,
    ECCCurve::BrainpoolP384r1,
    ECCCurve::BrainpoolP512r1,
    ECCCurve::Secp256k1,
];

impl ECCCurve {
    /// Standard name
    pub fn name(&self) -> &str {
        match self {
            ECCCurve::Curve25519 => "Curve25519",
            ECCCurve::Curve448 => "X448",
            ECCCurve::Ed25519 => "Ed25519",
            ECCCurve::Ed448 => "Ed448",
            ECCCurve::P256 => "NIST P-256",
            ECCCurve::P384 => "NIST P-384",
            ECCCurve::P521 => "NIST P-521",
            ECCCurve::BrainpoolP256r1 => "brainpoolP256r1",
            ECCCurve::BrainpoolP384r1 => "brainpoolP384r1",
            ECCCurve::BrainpoolP512r1 => "brainpoolP512r1",
            ECCCurve::Secp256k1 => "secp256k1",
            ECCCurve::Unknown(_oid) => "unknown",
        }
    }

    /// Alternative name of the curve, as used by GnuPG.
    pub fn alias(&self) -> Option<&str> {
        match self {
            ECCCurve::Curve25519 => Some("cv25519"),
            ECCCurve::Curve448 => Some("cv448"),
            ECCCurve::Ed25519 => Some("ed25519"),
            ECCCurve::Ed448 => Some("ed448"),
            ECCCurve::P256 => Some("nistp256"),
            ECCCurve::P384 => Some("nistp384"),
            ECCCurve::P521 => Some("nistp521"),
            _ => None,
        }
    }

    pub fn oid(&self) -> ObjectIdentifier {
        match self {
            ECCCurve::Curve25519 => OID_CURVE25519,
            ECCCurve::Curve448 => OID_CURVE448,
            ECCCurve::Ed25519 => OID_ED25519,
            ECCCurve::Ed448 => OID_ED448,
            ECCCurve::P256 => OID_P256,
            ECCCurve::P384 => OID_P384,
            ECCCurve::P521 => OID_P521,
            ECCCurve::BrainpoolP256r1 => OID_BRAINPOOL_P256R1,
            ECCCurve::BrainpoolP384r1 => OID_BRAINPOOL_P384R1,
            ECCCurve::BrainpoolP512r1 => OID_BRAINPOOL_P512R1,
            ECCCurve::Secp256k1 => OID_SECP256K1,
            ECCCurve::Unknown(oid) => *oid,
        }
    }

    /// Length in bytes of the fixed size secret scalar or seed.
    pub const fn secret_key_length(&self) -> Option<usize> {
        match self {
            ECCCurve::Curve25519 => Some(32),
            ECCCurve::Curve448 => Some(56),
            ECCCurve::Ed25519 => Some(32),
            ECCCurve::Ed448 => Some(57),
            ECCCurve::P256 => Some(32),
            ECCCurve::P384 => Some(48),
            ECCCurve::P521 => Some(66),
            ECCCurve::BrainpoolP256r1 => Some(32),
            ECCCurve::BrainpoolP384r1 => Some(48),
            ECCCurve::BrainpoolP512r1 => Some(64),
            ECCCurve::Secp256k1 => Some(32),
            ECCCurve::Unknown(_) => None,
        }
    }

    /// Montgomery curves store their scalars little-endian.
    pub fn is_montgomery(&self) -> bool {
        matches!(self, ECCCurve::Curve25519 | ECCCurve::Curve448)
    }

    /// Get the right curve given the DER encoded body of an oid.
    pub fn from_oid(oid: &[u8]) -> Option<Self> {
        if let Some(curve) = KNOWN.iter().find(|c| c.oid().as_bytes() == oid) {
            return Some(curve.clone());
        }

        ObjectIdentifier::from_bytes(oid).ok().map(ECCCurve::Unknown)
    }

    /// Looks up a curve by its standard name or alias, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        KNOWN
            .iter()
            .find(|c| {
                c.name().eq_ignore_ascii_case(name)
                    || c.alias().is_some_and(|a| a.eq_ignore_ascii_case(name))
                    || c.oid().to_string() == name
            })
            .cloned()
            .or_else(|| match name {
                "P-256" | "prime256v1" | "secp256r1" => Some(ECCCurve::P256),
                "P-384" | "secp384r1" => Some(ECCCurve::P384),
                "P-521" | "secp521r1" => Some(ECCCurve::P521),
                _ => None,
            })
    }
}

impl std::fmt::Display for ECCCurve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ecc_curve_to_oid() {
        assert_eq!(
            ECCCurve::P256.oid().as_bytes(),
            [0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x03, 0x01, 0x07]
        );
        assert_eq!(
            ECCCurve::P384.oid().as_bytes(),
            [0x2B, 0x81, 0x04, 0x00, 0x22]
        );
        assert_eq!(
            ECCCurve::Ed25519.oid().as_bytes(),
            [0x2B, 0x06, 0x01, 0x04, 0x01, 0xDA, 0x47, 0x0F, 0x01]
        );
        assert_eq!(
            ECCCurve::Curve25519.oid().as_bytes(),
            [0x2B, 0x06, 0x01, 0x04, 0x01, 0x97, 0x55, 0x01, 0x05, 0x01]
        );
        assert_eq!(ECCCurve::Curve448.oid().as_bytes(), [0x2B, 0x65, 0x6F]);
    }

    #[test]
    fn test_ecc_curve_from_oid() {
        let one = [0x2A, 0x86, 0x48, 0xCE, 0x3D, 0x03, 0x01, 0x07];
        assert_eq!(ECCCurve::from_oid(&one), Some(ECCCurve::P256));

        // brainpoolP160r1, not handled explicitly
        const OID: &[u8] = &[0x2B, 0x24, 0x03, 0x03, 0x02, 0x08, 0x01, 0x01, 0x01];
        let bp_p160r1 = ECCCurve::from_oid(OID).unwrap();
        assert_eq!(bp_p160r1.oid().to_string(), "1.3.36.3.3.2.8.1.1.1");
        assert_eq!(bp_p160r1.secret_key_length(), None);
    }

    #[test]
    fn test_ecc_curve_from_name() {
        assert_eq!(ECCCurve::from_name("NIST P-256"), Some(ECCCurve::P256));
        assert_eq!(ECCCurve::from_name("P-384"), Some(ECCCurve::P384));
        assert_eq!(ECCCurve::from_name("nistp521"), Some(ECCCurve::P521));
        assert_eq!(ECCCurve::from_name("Ed25519"), Some(ECCCurve::Ed25519));
        assert_eq!(ECCCurve::from_name("cv25519"), Some(ECCCurve::Curve25519));
        assert_eq!(ECCCurve::from_name("secp256k1"), Some(ECCCurve::Secp256k1));
        assert_eq!(ECCCurve::from_name("1.3.132.0.34"), Some(ECCCurve::P384));
        assert_eq!(ECCCurve::from_name("P-999"), None);
    }
}
