//! Key-system capabilities and the SR25519 implementation
//!
//! Issuers and verifiers only ever see the two capability traits:
//!
//! - [`TokenSigner`] - holds a secret key and signs raw bytes
//! - [`KeyScheme`] - verifies raw signatures and derives addresses from public keys
//!
//! The SR25519 implementation follows Substrate key derivation so that recovery
//! phrases and secret URIs produce the same keys and addresses as other
//! Substrate tooling.

use std::fmt;

use bip39::{Language, Mnemonic};
use blake2::{Blake2b, Digest, digest::consts::U32};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use schnorrkel::{
    ExpansionMode, Keypair, MiniSecretKey, PublicKey, SecretKey, Signature,
    derive::{ChainCode, Derivation},
};
use sha2::Sha512;
use zeroize::Zeroize;

use crate::{Result, errors::TokenError, ss58, types::Algorithm};

/// Signing context used by Substrate for `sr25519` signatures
pub const SIGNING_CONTEXT: &[u8] = b"substrate";

/// Well-known development phrase used when a secret URI has no phrase
pub const DEV_PHRASE: &str = "bottom drive obey lake curtain smoke basket hold race lonely fit walk";

const SEED_LEN: usize = 32;
const PUBLIC_KEY_LEN: usize = 32;
const PBKDF2_ROUNDS: u32 = 2048;
const CHAIN_CODE_LEN: usize = 32;

/// Holder of a secret key able to sign token signing input
pub trait TokenSigner: Send + Sync {
    /// Algorithm of the produced signatures
    fn algorithm(&self) -> Algorithm;

    /// Raw public key bytes
    fn public_key(&self) -> Vec<u8>;

    /// Sign raw bytes
    ///
    /// # Errors
    /// Returns [`TokenError::Signing`] if the underlying key is unavailable.
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>>;
}

/// Public-key operations of a signature scheme
pub trait KeyScheme: Send + Sync {
    /// Algorithm implemented by this scheme
    fn algorithm(&self) -> Algorithm;

    /// Raw signature length in bytes
    fn signature_len(&self) -> usize {
        self.algorithm().signature_len()
    }

    /// Raw public key length in bytes
    fn public_key_len(&self) -> usize;

    /// Verify a raw signature over `message`
    ///
    /// # Errors
    /// [`TokenError::MalformedToken`] if the public key cannot be parsed,
    /// [`TokenError::InvalidSignature`] if the signature does not verify.
    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<()>;

    /// Derive the address identifying `public_key` under `address_prefix`
    ///
    /// The prefix comes from issuer or verifier configuration, so both sides
    /// agree on the address rule by configuring the same value.
    fn derive_address(&self, public_key: &[u8], address_prefix: u16) -> Result<String>;
}

/// SR25519 scheme with SS58 addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sr25519Scheme;

impl KeyScheme for Sr25519Scheme {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Sr25519
    }

    fn public_key_len(&self) -> usize {
        PUBLIC_KEY_LEN
    }

    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> Result<()> {
        let public_key = PublicKey::from_bytes(public_key)
            .map_err(|e| TokenError::malformed(format!("invalid sr25519 public key: {e}")))?;

        if signature.len() != self.signature_len() {
            return Err(TokenError::InvalidSignature);
        }
        let signature = Signature::from_bytes(signature).map_err(|_| TokenError::InvalidSignature)?;

        public_key
            .verify_simple(SIGNING_CONTEXT, message, &signature)
            .map_err(|_| TokenError::InvalidSignature)
    }

    fn derive_address(&self, public_key: &[u8], address_prefix: u16) -> Result<String> {
        ss58::encode(public_key, address_prefix)
    }
}

/// SR25519 keypair
///
/// Secret material is zeroized on drop by `schnorrkel`.
pub struct Sr25519Keypair {
    inner: Keypair,
}

impl Sr25519Keypair {
    /// Keypair from a 32-byte mini secret (Substrate "seed")
    pub fn from_seed(seed: &[u8; SEED_LEN]) -> Result<Self> {
        Ok(Self {
            inner: Keypair::from(expand_seed(seed)?),
        })
    }

    /// Fresh random keypair
    pub fn generate() -> Result<Self> {
        let mut seed = [0u8; SEED_LEN];
        rand::rng().fill_bytes(&mut seed);
        let keypair = Self::from_seed(&seed);
        seed.zeroize();
        keypair
    }

    /// Keypair from a BIP-39 English recovery phrase
    ///
    /// The phrase entropy is stretched with PBKDF2-HMAC-SHA512 (2048 rounds, salt
    /// `"mnemonic" + password`) and the first 32 bytes become the mini secret.
    pub fn from_phrase(phrase: &str, password: &str) -> Result<Self> {
        let mut seed = mini_secret_from_phrase(phrase, password)?;
        let keypair = Self::from_seed(&seed);
        seed.zeroize();
        keypair
    }

    /// Keypair from a Substrate secret URI
    ///
    /// `<phrase | 0x-seed>[//hard][/soft]...[///password]`. An empty phrase means
    /// [`DEV_PHRASE`], so `//Alice` resolves to the standard development key.
    pub fn from_uri(uri: &str) -> Result<Self> {
        let SecretUri {
            phrase,
            junctions,
            password,
        } = SecretUri::parse(uri)?;

        let mut seed = if let Some(hex_seed) = phrase.strip_prefix("0x") {
            seed_from_hex(hex_seed)?
        } else {
            let phrase = if phrase.is_empty() { DEV_PHRASE } else { phrase };
            mini_secret_from_phrase(phrase, password.unwrap_or(""))?
        };
        let secret = expand_seed(&seed);
        seed.zeroize();
        let mut secret = secret?;

        for junction in &junctions {
            secret = if junction.hard {
                secret
                    .hard_derive_mini_secret_key(Some(ChainCode(junction.chain_code)), b"")
                    .0
                    .expand(ExpansionMode::Ed25519)
            } else {
                secret
                    .derived_key_simple(ChainCode(junction.chain_code), b"")
                    .0
            };
        }

        Ok(Self {
            inner: Keypair::from(secret),
        })
    }

    /// Raw 32-byte public key
    #[must_use]
    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_LEN] {
        self.inner.public.to_bytes()
    }

    /// SS58 address of this keypair
    pub fn address(&self, ss58_prefix: u16) -> Result<String> {
        ss58::encode(&self.public_key_bytes(), ss58_prefix)
    }
}

impl TokenSigner for Sr25519Keypair {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Sr25519
    }

    fn public_key(&self) -> Vec<u8> {
        self.public_key_bytes().to_vec()
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        Ok(self
            .inner
            .sign_simple(SIGNING_CONTEXT, message)
            .to_bytes()
            .to_vec())
    }
}

impl fmt::Debug for Sr25519Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sr25519Keypair")
            .field("public_key", &hex::encode(self.public_key_bytes()))
            .finish_non_exhaustive()
    }
}

/// Generate a new English recovery phrase
///
/// `words` must be one of 12, 15, 18, 21 or 24.
pub fn generate_phrase(words: usize) -> Result<String> {
    let entropy_len = match words {
        12 | 15 | 18 | 21 | 24 => words / 3 * 4,
        other => {
            return Err(TokenError::KeyDerivation {
                reason: format!("unsupported phrase length {other}, expected 12/15/18/21/24 words"),
            });
        }
    };

    let mut entropy = vec![0u8; entropy_len];
    rand::rng().fill_bytes(&mut entropy);
    let mnemonic = Mnemonic::from_entropy_in(Language::English, &entropy).map_err(|e| {
        TokenError::KeyDerivation {
            reason: format!("failed to build phrase: {e}"),
        }
    });
    entropy.zeroize();
    Ok(mnemonic?.to_string())
}

fn expand_seed(seed: &[u8; SEED_LEN]) -> Result<SecretKey> {
    MiniSecretKey::from_bytes(seed)
        .map(|mini| mini.expand(ExpansionMode::Ed25519))
        .map_err(|e| TokenError::KeyDerivation {
            reason: format!("invalid sr25519 seed: {e}"),
        })
}

fn mini_secret_from_phrase(phrase: &str, password: &str) -> Result<[u8; SEED_LEN]> {
    let mnemonic = Mnemonic::parse_in_normalized(Language::English, phrase).map_err(|e| {
        TokenError::KeyDerivation {
            reason: format!("invalid recovery phrase: {e}"),
        }
    })?;
    let mut entropy = mnemonic.to_entropy();

    let mut salt = String::with_capacity(8 + password.len());
    salt.push_str("mnemonic");
    salt.push_str(password);

    let mut stretched = [0u8; 64];
    pbkdf2_hmac::<Sha512>(&entropy, salt.as_bytes(), PBKDF2_ROUNDS, &mut stretched);
    entropy.zeroize();
    salt.zeroize();

    let mut seed = [0u8; SEED_LEN];
    seed.copy_from_slice(&stretched[..SEED_LEN]);
    stretched.zeroize();
    Ok(seed)
}

fn seed_from_hex(hex_seed: &str) -> Result<[u8; SEED_LEN]> {
    let mut bytes = hex::decode(hex_seed).map_err(|e| TokenError::KeyDerivation {
        reason: format!("invalid hex seed: {e}"),
    })?;
    let seed = <[u8; SEED_LEN]>::try_from(bytes.as_slice()).map_err(|_| {
        TokenError::KeyDerivation {
            reason: format!("hex seed must be {SEED_LEN} bytes, got {}", bytes.len()),
        }
    });
    bytes.zeroize();
    seed
}

/// Parsed secret URI
#[derive(Debug)]
struct SecretUri<'a> {
    phrase: &'a str,
    junctions: Vec<Junction>,
    password: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Junction {
    hard: bool,
    chain_code: [u8; CHAIN_CODE_LEN],
}

impl<'a> SecretUri<'a> {
    fn parse(uri: &'a str) -> Result<Self> {
        let (rest, password) = match uri.split_once("///") {
            Some((rest, password)) => (rest, Some(password)),
            None => (uri, None),
        };
        let (phrase, path) = match rest.find('/') {
            Some(index) => rest.split_at(index),
            None => (rest, ""),
        };

        let mut junctions = Vec::new();
        let mut hard = false;
        for part in path.split('/').skip(1) {
            if part.is_empty() {
                if hard {
                    return Err(invalid_uri("empty derivation junction"));
                }
                hard = true;
                continue;
            }
            junctions.push(Junction {
                hard,
                chain_code: chain_code(part),
            });
            hard = false;
        }
        if hard {
            return Err(invalid_uri("dangling derivation separator"));
        }

        Ok(Self {
            phrase: phrase.trim(),
            junctions,
            password,
        })
    }
}

fn invalid_uri(reason: &str) -> TokenError {
    TokenError::KeyDerivation {
        reason: format!("invalid secret URI: {reason}"),
    }
}

/// Chain code of a derivation junction: integers as u64 little-endian, anything
/// else as a SCALE-encoded string, hashed when longer than 32 bytes
fn chain_code(junction: &str) -> [u8; CHAIN_CODE_LEN] {
    let encoded = match junction.parse::<u64>() {
        Ok(index) => index.to_le_bytes().to_vec(),
        Err(_) => {
            let mut encoded = compact_len(junction.len());
            encoded.extend_from_slice(junction.as_bytes());
            encoded
        }
    };

    let mut code = [0u8; CHAIN_CODE_LEN];
    if encoded.len() > CHAIN_CODE_LEN {
        code.copy_from_slice(&Blake2b::<U32>::digest(&encoded));
    } else {
        code[..encoded.len()].copy_from_slice(&encoded);
    }
    code
}

/// SCALE compact encoding of a length prefix
fn compact_len(len: usize) -> Vec<u8> {
    let len = len as u64;
    match len {
        0..=0x3f => vec![(len as u8) << 2],
        0x40..=0x3fff => (((len as u16) << 2) | 0b01).to_le_bytes().to_vec(),
        0x4000..=0x3fff_ffff => (((len as u32) << 2) | 0b10).to_le_bytes().to_vec(),
        _ => {
            let bytes = len.to_le_bytes();
            let used = 8 - (len.leading_zeros() / 8) as usize;
            let mut encoded = vec![(((used - 4) as u8) << 2) | 0b11];
            encoded.extend_from_slice(&bytes[..used]);
            encoded
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE_PUBLIC: &str = "d43593c715fdd31c61141abd04a99fd6822c8558854ccde39a5684e7a56da27d";
    const ALICE_ADDRESS: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";
    const BOB_PUBLIC: &str = "8eaf04151687736326c9fea17e25fc5287613693c912909cb226aa4794f26a48";
    const DEV_ROOT_PUBLIC: &str = "46ebddef8cd9bb167dc30878d7113b7e168e6f0646beffd77d69d39bad76b47a";

    #[test]
    fn test_dev_phrase_root_key() {
        let keypair = Sr25519Keypair::from_phrase(DEV_PHRASE, "").unwrap();
        assert_eq!(hex::encode(keypair.public_key_bytes()), DEV_ROOT_PUBLIC);
    }

    #[test]
    fn test_well_known_development_accounts() {
        let alice = Sr25519Keypair::from_uri("//Alice").unwrap();
        assert_eq!(hex::encode(alice.public_key_bytes()), ALICE_PUBLIC);
        assert_eq!(alice.address(42).unwrap(), ALICE_ADDRESS);

        let bob = Sr25519Keypair::from_uri("//Bob").unwrap();
        assert_eq!(hex::encode(bob.public_key_bytes()), BOB_PUBLIC);
    }

    #[test]
    fn test_uri_with_explicit_phrase_matches_dev_default() {
        let implicit = Sr25519Keypair::from_uri("//Alice").unwrap();
        let explicit = Sr25519Keypair::from_uri(&format!("{DEV_PHRASE}//Alice")).unwrap();
        assert_eq!(implicit.public_key_bytes(), explicit.public_key_bytes());
    }

    #[test]
    fn test_plain_phrase_uri_equals_from_phrase() {
        let phrase = generate_phrase(12).unwrap();
        let from_uri = Sr25519Keypair::from_uri(&phrase).unwrap();
        let from_phrase = Sr25519Keypair::from_phrase(&phrase, "").unwrap();
        assert_eq!(from_uri.public_key_bytes(), from_phrase.public_key_bytes());
    }

    #[test]
    fn test_password_changes_key() {
        let plain = Sr25519Keypair::from_phrase(DEV_PHRASE, "").unwrap();
        let with_password = Sr25519Keypair::from_uri(&format!("{DEV_PHRASE}///secret")).unwrap();
        assert_ne!(plain.public_key_bytes(), with_password.public_key_bytes());
        assert_eq!(
            with_password.public_key_bytes(),
            Sr25519Keypair::from_phrase(DEV_PHRASE, "secret")
                .unwrap()
                .public_key_bytes()
        );
    }

    #[test]
    fn test_soft_and_hard_junctions_differ() {
        let hard = Sr25519Keypair::from_uri("//Alice//stash").unwrap();
        let soft = Sr25519Keypair::from_uri("//Alice/stash").unwrap();
        assert_ne!(hard.public_key_bytes(), soft.public_key_bytes());
    }

    #[test]
    fn test_hex_seed_uri() {
        let seed = [7u8; 32];
        let from_seed = Sr25519Keypair::from_seed(&seed).unwrap();
        let from_uri = Sr25519Keypair::from_uri(&format!("0x{}", hex::encode(seed))).unwrap();
        assert_eq!(from_seed.public_key_bytes(), from_uri.public_key_bytes());
        assert!(Sr25519Keypair::from_uri("0x1234").is_err());
    }

    #[test]
    fn test_invalid_uris_and_phrases() {
        assert!(Sr25519Keypair::from_uri("//Alice///").is_ok());
        assert!(Sr25519Keypair::from_uri("//Alice/").is_err());
        assert!(Sr25519Keypair::from_uri("//Alice//").is_err());
        assert!(matches!(
            Sr25519Keypair::from_phrase("not a real phrase at all", ""),
            Err(TokenError::KeyDerivation { .. })
        ));
    }

    #[test]
    fn test_chain_code_encoding() {
        let numeric = chain_code("1");
        assert_eq!(&numeric[..8], &1u64.to_le_bytes());
        assert!(numeric[8..].iter().all(|b| *b == 0));

        let named = chain_code("Alice");
        assert_eq!(&named[..6], &[0x14, b'A', b'l', b'i', b'c', b'e']);

        let long = "x".repeat(40);
        let mut encoded = vec![0xa0];
        encoded.extend_from_slice(long.as_bytes());
        assert_eq!(chain_code(&long)[..], Blake2b::<U32>::digest(&encoded)[..]);
    }

    #[test]
    fn test_compact_len() {
        assert_eq!(compact_len(5), vec![0x14]);
        assert_eq!(compact_len(64), vec![0x01, 0x01]);
        assert_eq!(compact_len(0x4000), vec![0x02, 0x00, 0x01, 0x00]);
    }

    #[test]
    fn test_sign_and_verify() {
        let keypair = Sr25519Keypair::generate().unwrap();
        let scheme = Sr25519Scheme::default();
        let signature = keypair.sign(b"payload").unwrap();
        assert_eq!(signature.len(), 64);

        assert!(scheme.verify(&keypair.public_key(), b"payload", &signature).is_ok());
        assert_eq!(
            scheme.verify(&keypair.public_key(), b"tampered", &signature),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn test_signatures_are_randomized() {
        let keypair = Sr25519Keypair::from_seed(&[1u8; 32]).unwrap();
        assert_ne!(keypair.sign(b"m").unwrap(), keypair.sign(b"m").unwrap());
    }

    #[test]
    fn test_verify_rejects_bad_lengths() {
        let keypair = Sr25519Keypair::from_seed(&[2u8; 32]).unwrap();
        let scheme = Sr25519Scheme::default();
        let signature = keypair.sign(b"m").unwrap();

        assert_eq!(
            scheme.verify(&keypair.public_key(), b"m", &signature[..63]),
            Err(TokenError::InvalidSignature)
        );
        assert!(matches!(
            scheme.verify(&[0u8; 31], b"m", &signature),
            Err(TokenError::MalformedToken { .. })
        ));
    }

    #[test]
    fn test_generate_phrase_lengths() {
        for words in [12, 15, 18, 21, 24] {
            let phrase = generate_phrase(words).unwrap();
            assert_eq!(phrase.split_whitespace().count(), words);
            assert!(Sr25519Keypair::from_phrase(&phrase, "").is_ok());
        }
        assert!(generate_phrase(13).is_err());
    }

    #[test]
    fn test_debug_hides_secret() {
        let keypair = Sr25519Keypair::from_seed(&[3u8; 32]).unwrap();
        let debug = format!("{keypair:?}");
        assert!(debug.contains(&hex::encode(keypair.public_key_bytes())));
        assert!(!debug.contains("secret"));
    }
}
