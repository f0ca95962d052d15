//! Key packet bodies: the public fields and the secret key packet built on them.

mod public_key;
mod secret_key;

pub use self::public_key::PublicKey;
pub use self::secret_key::SecretKeyPacket;
