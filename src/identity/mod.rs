//! Signing identity resolution and validation.
//!
//! A [`SigningIdentity`] is the credential material that authorizes
//! ledger-visible actions. It is resolved by identifier from a store
//! external to the engine, held only for the duration of a single
//! operation, and zeroized on drop. The engine never persists it.
//!
//! Exactly one key encoding is accepted: 64 canonical hex characters
//! decoding to a 32-byte scalar that is a valid secp256k1 private key
//! (non-zero and strictly below the group order).

pub mod file_store;
pub mod mock;

pub use file_store::FileIdentityResolver;
pub use mock::MockIdentityResolver;

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Required length of a hex-encoded private key.
pub const PRIVATE_KEY_HEX_LEN: usize = 64;

/// secp256k1 group order n, big-endian.
const SECP256K1_ORDER: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xfe, 0xba, 0xae, 0xdc, 0xe6, 0xaf, 0x48, 0xa0, 0x3b, 0xbf, 0xd2, 0x5e, 0x8c, 0xd0, 0x36,
    0x41, 0x41,
];

/// Result type for identity operations.
pub type IdentityResult<T> = Result<T, IdentityError>;

/// Identity resolution errors.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// No credential matches the requested identifier.
    #[error("no credential found for id '{0}'")]
    NotFound(String),

    /// The resolved material fails format or curve validation.
    #[error("invalid private key: {0}")]
    Invalid(String),

    /// The backing store could not be read.
    #[error("credential store error: {0}")]
    Store(String),
}

/// A credential identifier plus key material sufficient to authorize
/// ledger transactions. Key bytes are zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SigningIdentity {
    #[zeroize(skip)]
    id: String,
    key: [u8; 32],
}

impl SigningIdentity {
    /// Build an identity from a hex-encoded private key, enforcing the
    /// single accepted encoding.
    pub fn from_hex(id: &str, key_hex: &str) -> IdentityResult<Self> {
        let key = validate_private_key_hex(key_hex)?;
        Ok(Self {
            id: id.to_string(),
            key,
        })
    }

    /// Credential identifier this identity was resolved from.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Raw private scalar. Callers must not copy this beyond the
    /// duration of the ledger call being authorized.
    pub fn key_bytes(&self) -> &[u8; 32] {
        &self.key
    }

    /// Hex encoding of the private scalar, for gateway transports.
    pub fn key_hex(&self) -> String {
        hex::encode(self.key)
    }
}

// Never reveal key material through Debug output.
impl fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("id", &self.id)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Validate a hex-encoded private key against the single accepted
/// encoding: 64 hex characters, non-zero, strictly below the secp256k1
/// group order.
pub fn validate_private_key_hex(key_hex: &str) -> IdentityResult<[u8; 32]> {
    if key_hex.len() != PRIVATE_KEY_HEX_LEN {
        return Err(IdentityError::Invalid(format!(
            "expected {} hex characters, got {}",
            PRIVATE_KEY_HEX_LEN,
            key_hex.len()
        )));
    }

    let decoded = hex::decode(key_hex)
        .map_err(|e| IdentityError::Invalid(format!("not valid hex: {}", e)))?;

    let mut key = [0u8; 32];
    key.copy_from_slice(&decoded);

    if key.iter().all(|b| *b == 0) {
        key.zeroize();
        return Err(IdentityError::Invalid("scalar is zero".to_string()));
    }

    // Big-endian comparison against the group order.
    if key >= SECP256K1_ORDER {
        key.zeroize();
        return Err(IdentityError::Invalid(
            "scalar is not below the secp256k1 group order".to_string(),
        ));
    }

    Ok(key)
}

/// Resolves a named identifier to signing credential material.
///
/// Side-effect free, no network or ledger interaction. The proposer role
/// resolves twice (setup and execution) and must tolerate the credential
/// changing between the calls.
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, id: &str) -> IdentityResult<SigningIdentity>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const VALID_KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    #[test]
    fn test_valid_key_accepted() {
        let identity = SigningIdentity::from_hex("deployer", VALID_KEY).unwrap();
        assert_eq!(identity.id(), "deployer");
        assert_eq!(identity.key_hex(), VALID_KEY);
    }

    #[test]
    fn test_wrong_length_rejected() {
        let result = validate_private_key_hex("abcd");
        assert!(matches!(result, Err(IdentityError::Invalid(_))));
    }

    #[test]
    fn test_odd_length_rejected() {
        let odd = &VALID_KEY[..63];
        assert!(matches!(
            validate_private_key_hex(odd),
            Err(IdentityError::Invalid(_))
        ));
    }

    #[test]
    fn test_non_hex_rejected() {
        let bad = "zz".repeat(32);
        assert!(matches!(
            validate_private_key_hex(&bad),
            Err(IdentityError::Invalid(_))
        ));
    }

    #[test]
    fn test_zero_scalar_rejected() {
        let zero = "00".repeat(32);
        assert!(matches!(
            validate_private_key_hex(&zero),
            Err(IdentityError::Invalid(_))
        ));
    }

    #[test]
    fn test_scalar_at_order_rejected() {
        let order_hex = "fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141";
        assert!(matches!(
            validate_private_key_hex(order_hex),
            Err(IdentityError::Invalid(_))
        ));
    }

    #[test]
    fn test_scalar_just_below_order_accepted() {
        let below_hex = "fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364140";
        assert!(validate_private_key_hex(below_hex).is_ok());
    }

    #[test]
    fn test_debug_redacts_key() {
        let identity = SigningIdentity::from_hex("deployer", VALID_KEY).unwrap();
        let debug = format!("{:?}", identity);
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains(VALID_KEY));
    }

    proptest! {
        /// Any 32-byte value below the group order and non-zero is a
        /// valid scalar; its canonical hex must validate.
        #[test]
        fn prop_small_scalars_accepted(seed in 1u64..u64::MAX) {
            let mut key = [0u8; 32];
            key[24..].copy_from_slice(&seed.to_be_bytes());
            let key_hex = hex::encode(key);
            prop_assert!(validate_private_key_hex(&key_hex).is_ok());
        }

        /// Hex strings of any length other than 64 never validate.
        #[test]
        fn prop_wrong_length_rejected(len in 0usize..128) {
            prop_assume!(len != PRIVATE_KEY_HEX_LEN);
            let key_hex = "a".repeat(len);
            prop_assert!(validate_private_key_hex(&key_hex).is_err());
        }
    }
}
