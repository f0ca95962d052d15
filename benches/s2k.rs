use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pgp_secret::crypto::hash::HashAlgorithm;
use pgp_secret::crypto::sym::SymmetricKeyAlgorithm;
use pgp_secret::types::{Passphrase, StringToKey, Tag};
use pgp_secret::SecretKey;
use rand::distributions::{Alphanumeric, DistString};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn bench_s2k(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(0);

    let mut group = c.benchmark_group("s2k");
    let algs = [
        HashAlgorithm::Sha1,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha3_256,
        HashAlgorithm::Sha512,
    ];
    // minimum, default, maximum
    let counts = [1u8, 224, u8::MAX];

    for size in [10, 100] {
        for alg in algs {
            for count in counts {
                let s2k = StringToKey::new_iterated(&mut rng, alg, count);
                let passphrase = Alphanumeric.sample_string(&mut rng, size);

                group.bench_with_input(
                    BenchmarkId::new("iterated_and_salted", format!("{size}/{alg:?}/{count}")),
                    &(s2k, passphrase),
                    |b, (s2k, passphrase)| {
                        b.iter(|| {
                            let key = s2k
                                .derive_key(passphrase.as_bytes(), SymmetricKeyAlgorithm::AES256.key_size())
                                .unwrap();
                            black_box(key);
                        })
                    },
                );
            }
        }
    }

    let s2k = StringToKey::new_argon2(&mut rng, 1, 1, 10);
    group.bench_function("argon2/t1/p1/m10", |b| {
        b.iter(|| black_box(s2k.derive_key(b"passphrase", 32).unwrap()))
    });
    group.finish();
}

fn bench_unlock(c: &mut Criterion) {
    let raw = std::fs::read("./tests/fixtures/gnupg/rsa1024.key").unwrap();
    let key = SecretKey::from_bytes(Tag::SecretKey, &raw).unwrap();
    let passphrase = Passphrase::utf8("correct");

    c.bench_function("unlock_rsa1024", |b| {
        b.iter(|| black_box(key.extract_private_key_with(&passphrase).unwrap()))
    });
}

criterion_group!(benches, bench_s2k, bench_unlock);
criterion_main!(benches);
