pub(crate) mod mpi;
mod packet;
pub mod params;
mod password;
mod private_key;
mod s2k;

pub use self::mpi::MpiBytes;
pub use self::packet::{KeyVersion, Tag};
pub use self::params::{
    EncryptedSecretParams, IntegrityMode, PlainSecretParams, PublicParams, S2kUsage,
    SecretMaterial, SecretParams,
};
pub use self::password::Passphrase;
pub use self::private_key::{
    EcdhSecretKey, EcdsaSecretKey, EddsaSecretKey, ElgamalSecretKey, PrivateKey,
};
pub use self::s2k::{decode_count, StringToKey, DEFAULT_ITER_SALTED_COUNT};
pub(crate) use self::params::ensure_supported;
pub(crate) use self::s2k::{derive_classic, warn_weak};
