pub mod cipher;
mod material;
mod public;
mod secret;

pub use self::material::SecretMaterial;
pub(crate) use self::material::ensure_supported;
pub use self::public::PublicParams;
pub use self::secret::{
    EncryptedSecretParams, IntegrityMode, PlainSecretParams, S2kUsage, SecretParams,
};
