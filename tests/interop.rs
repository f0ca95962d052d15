//! Secret key packets exported by GnuPG, protected with "correct".

use pgp_secret::crypto::hash::HashAlgorithm;
use pgp_secret::crypto::public_key::PublicKeyAlgorithm;
use pgp_secret::crypto::sym::SymmetricKeyAlgorithm;
use pgp_secret::types::{
    EcdhSecretKey, EddsaSecretKey, Passphrase, PrivateKey, S2kUsage,
    SecretParams, StringToKey, Tag,
};
use pgp_secret::{SecretKey, Serialize};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use testresult::TestResult;

fn load(name: &str) -> TestResult<(Vec<u8>, SecretKey)> {
    let _ = pretty_env_logger::try_init();
    let raw = std::fs::read(format!("./tests/fixtures/gnupg/{name}.key"))?;
    let key = SecretKey::from_bytes(Tag::SecretKey, &raw)?;
    Ok((raw, key))
}

/// Decrypts the key and checks it against its public parameters.
fn unlock(name: &str, algorithm: PublicKeyAlgorithm) -> TestResult<PrivateKey> {
    let (raw, key) = load(name)?;
    assert_eq!(key.public_key().algorithm(), algorithm);
    assert_eq!(key.usage(), S2kUsage::Sha1);

    let SecretParams::Encrypted(params) = key.packet().secret_params() else {
        panic!("{name} is not protected");
    };
    assert_eq!(params.sym_alg(), SymmetricKeyAlgorithm::AES128);
    assert!(matches!(
        params.string_to_key(),
        StringToKey::IteratedAndSalted { count: 96, .. }
    ));

    // byte exact round trip
    assert_eq!(key.to_bytes()?, raw);

    let private = key
        .extract_private_key("correct")?
        .ok_or("missing secret material")?;
    private.verify_public(key.public_key().public_params())?;

    let err = key.extract_private_key("incorrect").unwrap_err();
    assert!(err.is_integrity(), "{name}: {err}");

    Ok(private)
}

#[test]
fn gnupg_rsa() -> TestResult {
    let key = unlock("rsa1024", PublicKeyAlgorithm::RSA)?;
    assert!(matches!(key, PrivateKey::Rsa(_)));
    Ok(())
}

#[test]
fn gnupg_dsa() -> TestResult {
    let key = unlock("dsa2048", PublicKeyAlgorithm::DSA)?;
    assert!(matches!(key, PrivateKey::Dsa(_)));
    Ok(())
}

#[test]
fn gnupg_elgamal() -> TestResult {
    let key = unlock("elgamal1024", PublicKeyAlgorithm::ElgamalEncrypt)?;
    assert!(matches!(key, PrivateKey::Elgamal(_)));
    Ok(())
}

#[test]
fn gnupg_ed25519() -> TestResult {
    let key = unlock("ed25519-primary", PublicKeyAlgorithm::EdDSALegacy)?;
    assert!(matches!(key, PrivateKey::EdDsa(EddsaSecretKey::Ed25519(_))));
    Ok(())
}

#[test]
fn gnupg_cv25519() -> TestResult {
    let key = unlock("cv25519", PublicKeyAlgorithm::ECDH)?;
    assert!(matches!(key, PrivateKey::Ecdh(EcdhSecretKey::Curve25519(_))));
    Ok(())
}

#[test]
fn gnupg_nistp256_ecdh() -> TestResult {
    let key = unlock("nistp256-ecdh", PublicKeyAlgorithm::ECDH)?;
    assert!(matches!(key, PrivateKey::Ecdh(EcdhSecretKey::P256(_))));
    Ok(())
}

#[test]
fn gnupg_reencrypt() -> TestResult {
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    for name in ["ed25519-primary", "cv25519", "dsa2048"] {
        let (_, key) = load(name)?;
        let s2k = StringToKey::new_iterated(&mut rng, HashAlgorithm::Sha256, 0);
        let changed = key.change_passphrase_with_s2k(
            &mut rng,
            &Passphrase::utf8("correct"),
            &Passphrase::utf8("fresh"),
            SymmetricKeyAlgorithm::AES256,
            Some(s2k),
        )?;
        assert_eq!(changed.usage(), S2kUsage::Sha1);
        assert_eq!(
            changed.extract_material_with(&Passphrase::utf8("fresh"))?,
            key.extract_material_with(&Passphrase::utf8("correct"))?
        );
    }

    Ok(())
}
