//! Seed-derived ed25519 identity keys.
//!
//! The 64-byte private key is SHA-512 of the seed with the lower half clamped,
//! the layout used by DHT clients. Two identities agree on a shared secret by
//! running X25519 between one party's clamped scalar and the other party's
//! public key mapped to the Montgomery curve.

#[cfg(test)]
use std::cell::Cell;
use std::convert::TryFrom;
use std::fmt;

use bitcoin::hashes::{hash160, sha256d, Hash};
use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::digest::generic_array::GenericArray;
use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::errors::*;

pub const SEED_LEN: usize = 32;
pub const PRIVATE_KEY_LEN: usize = 64;
pub const PUBLIC_KEY_LEN: usize = 32;
pub const SHARED_SECRET_LEN: usize = 32;

/// Heap-pinned key material, locked in RAM while alive and zeroed on drop.
///
/// Locking is best effort: when `mlock` is refused (or unavailable on this
/// platform) the buffer still works and is still zeroed.
pub struct SecretBuffer<const N: usize> {
    bytes: Box<[u8; N]>,
    locked: bool,
}

impl<const N: usize> SecretBuffer<N> {
    /// Allocate a locked buffer and let `fill` write the secret into it in place.
    ///
    /// The buffer owns the memory before `fill` runs, so it is wiped even if
    /// `fill` panics.
    pub fn with<F: FnOnce(&mut [u8; N])>(fill: F) -> Self {
        let bytes = Box::new([0u8; N]);
        let locked = lock_memory(bytes.as_ptr(), N);
        if !locked {
            warn!("failed to lock {} bytes of key material in memory", N);
        }
        let mut buf = SecretBuffer { bytes, locked };
        fill(&mut *buf.bytes);
        buf
    }

    pub fn as_bytes(&self) -> &[u8; N] {
        &self.bytes
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    fn wipe(&mut self) {
        self.bytes.zeroize();
        if self.locked {
            unlock_memory(self.bytes.as_ptr(), N);
            self.locked = false;
        }
        #[cfg(test)]
        WIPES.with(|count| count.set(count.get() + 1));
    }
}

impl<const N: usize> Drop for SecretBuffer<N> {
    fn drop(&mut self) {
        self.wipe();
    }
}

#[cfg(test)]
thread_local! {
    static WIPES: Cell<usize> = Cell::new(0);
}

#[cfg(unix)]
fn lock_memory(ptr: *const u8, len: usize) -> bool {
    unsafe { libc::mlock(ptr as *const libc::c_void, len) == 0 }
}

#[cfg(unix)]
fn unlock_memory(ptr: *const u8, len: usize) {
    unsafe {
        libc::munlock(ptr as *const libc::c_void, len);
    }
}

#[cfg(not(unix))]
fn lock_memory(_ptr: *const u8, _len: usize) -> bool {
    false
}

#[cfg(not(unix))]
fn unlock_memory(_ptr: *const u8, _len: usize) {}

/// Output of the key exchange; zeroed on drop, compared in constant time.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret([u8; SHARED_SECRET_LEN]);

impl PartialEq for SharedSecret {
    fn eq(&self, other: &Self) -> bool {
        self.0[..].ct_eq(&other.0[..]).into()
    }
}

impl Eq for SharedSecret {}

impl SharedSecret {
    pub fn as_bytes(&self) -> &[u8; SHARED_SECRET_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(&self.0[..]))
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("SharedSecret(..)")
    }
}

/// Identity keypair. Immutable once built.
pub struct IdentityKeypair {
    seed: SecretBuffer<SEED_LEN>,
    private_key: SecretBuffer<PRIVATE_KEY_LEN>,
    public_key: [u8; PUBLIC_KEY_LEN],
}

impl IdentityKeypair {
    /// New identity from a random seed.
    pub fn generate() -> Self {
        let mut seed = Zeroizing::new([0u8; SEED_LEN]);
        OsRng.fill_bytes(&mut seed[..]);
        IdentityKeypair::from_seed(&seed)
    }

    /// Deterministic: the same seed always yields the same keypair.
    pub fn from_seed(seed: &[u8; SEED_LEN]) -> Self {
        let private_key = SecretBuffer::with(|buf: &mut [u8; PRIVATE_KEY_LEN]| {
            Sha512::new()
                .chain_update(seed)
                .finalize_into(GenericArray::from_mut_slice(&mut buf[..]));
            buf[0] &= 248;
            buf[31] &= 63;
            buf[31] |= 64;
        });
        let public_key = SigningKey::from_bytes(seed).verifying_key().to_bytes();

        IdentityKeypair {
            seed: SecretBuffer::<SEED_LEN>::with(|buf| buf.copy_from_slice(seed)),
            private_key,
            public_key,
        }
    }

    pub fn from_seed_slice(seed: &[u8]) -> Result<Self> {
        if seed.len() != SEED_LEN {
            bail!(ErrorKind::InvalidSeed(seed.len()));
        }
        let mut buf = Zeroizing::new([0u8; SEED_LEN]);
        buf.copy_from_slice(seed);
        Ok(IdentityKeypair::from_seed(&buf))
    }

    pub fn from_seed_hex(seed_hex: &str) -> Result<Self> {
        let seed = Zeroizing::new(hex::decode(seed_hex)?);
        IdentityKeypair::from_seed_slice(&seed)
    }

    pub fn public_key(&self) -> [u8; PUBLIC_KEY_LEN] {
        self.public_key
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(&self.public_key[..])
    }

    pub fn private_key(&self) -> Zeroizing<[u8; PRIVATE_KEY_LEN]> {
        Zeroizing::new(*self.private_key.as_bytes())
    }

    pub fn private_key_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(&self.private_key.as_bytes()[..]))
    }

    pub fn seed(&self) -> Zeroizing<[u8; SEED_LEN]> {
        Zeroizing::new(*self.seed.as_bytes())
    }

    pub fn seed_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(&self.seed.as_bytes()[..]))
    }

    /// Double-SHA256 of the public key.
    pub fn identity_hash(&self) -> sha256d::Hash {
        sha256d::Hash::hash(&self.public_key)
    }

    /// HASH160 of the public key, a short identifier.
    pub fn key_id(&self) -> hash160::Hash {
        hash160::Hash::hash(&self.public_key)
    }

    /// `shared_secret(a, b.public) == shared_secret(b, a.public)` for any `a`, `b`.
    pub fn shared_secret(&self, peer_public_key: &[u8]) -> Result<SharedSecret> {
        let peer = <[u8; PUBLIC_KEY_LEN]>::try_from(peer_public_key).map_err(|_| {
            ErrorKind::InvalidPublicKey(format!(
                "expected {} bytes, got {}",
                PUBLIC_KEY_LEN,
                peer_public_key.len()
            ))
        })?;
        let peer = VerifyingKey::from_bytes(&peer)
            .map_err(|e| ErrorKind::InvalidPublicKey(e.to_string()))?;

        let mut scalar = Zeroizing::new([0u8; 32]);
        scalar.copy_from_slice(&self.private_key.as_bytes()[..32]);
        let scalar = StaticSecret::from(*scalar);
        let shared = scalar.diffie_hellman(&PublicKey::from(peer.to_montgomery().to_bytes()));

        if !shared.was_contributory() {
            bail!(ErrorKind::WeakSharedSecret);
        }
        Ok(SharedSecret(*shared.as_bytes()))
    }

    /// Keypair seeded by the shared secret with `peer_public_key`. Both sides of
    /// a link derive the same one.
    pub fn link_shared_keypair(&self, peer_public_key: &[u8]) -> Result<IdentityKeypair> {
        let secret = self.shared_secret(peer_public_key)?;
        Ok(IdentityKeypair::from_seed(secret.as_bytes()))
    }

    pub fn link_shared_public_key(&self, peer_public_key: &[u8]) -> Result<[u8; PUBLIC_KEY_LEN]> {
        Ok(self.link_shared_keypair(peer_public_key)?.public_key())
    }
}

impl fmt::Debug for IdentityKeypair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("IdentityKeypair")
            .field("public_key", &self.public_key_hex())
            .field("locked", &self.private_key.is_locked())
            .finish()
    }
}

/// Startup self-test of key derivation and key exchange.
pub fn sanity_check() -> bool {
    let alice = IdentityKeypair::generate();
    let bob = IdentityKeypair::generate();

    if IdentityKeypair::from_seed(&alice.seed()).public_key() != alice.public_key() {
        error!("identity key derivation is not deterministic");
        return false;
    }
    match (
        alice.shared_secret(&bob.public_key()),
        bob.shared_secret(&alice.public_key()),
    ) {
        (Ok(ab), Ok(ba)) if ab == ba => true,
        (Ok(_), Ok(_)) => {
            error!("shared secrets differ between peers");
            false
        }
        (Err(e), _) | (_, Err(e)) => {
            error!("shared secret derivation failed: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 8032, section 7.1, test 1
    const SEED: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";
    const PUBLIC: &str = "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a";

    #[test]
    fn test_known_seed() {
        let key = IdentityKeypair::from_seed_hex(SEED).unwrap();
        assert_eq!(key.public_key_hex(), PUBLIC);
        assert_eq!(&*key.seed_hex(), SEED);
    }

    #[test]
    fn test_deterministic() {
        let seed = [42u8; SEED_LEN];
        let a = IdentityKeypair::from_seed(&seed);
        let b = IdentityKeypair::from_seed(&seed);
        assert_eq!(a.public_key(), b.public_key());
        assert_eq!(*a.private_key(), *b.private_key());
        assert_eq!(*a.seed(), seed);

        let other = IdentityKeypair::from_seed(&[43u8; SEED_LEN]);
        assert_ne!(a.public_key(), other.public_key());
    }

    #[test]
    fn test_private_key_layout() {
        let seed = [7u8; SEED_LEN];
        let key = IdentityKeypair::from_seed(&seed);
        let private_key = key.private_key();
        let hash = Sha512::digest(&seed);

        assert_eq!(private_key[0] & 7, 0);
        assert_eq!(private_key[31] & 0xc0, 0x40);
        assert_eq!(&private_key[1..31], &hash[1..31]);
        assert_eq!(&private_key[32..], &hash[32..]);
        assert_eq!(key.private_key_hex().len(), 2 * PRIVATE_KEY_LEN);
    }

    #[test]
    fn test_seed_length_checked() {
        match IdentityKeypair::from_seed_slice(&[1u8; 31]) {
            Err(Error(ErrorKind::InvalidSeed(31), _)) => (),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(IdentityKeypair::from_seed_hex("zz").is_err());
    }

    #[test]
    fn test_generated_keys_differ() {
        let a = IdentityKeypair::generate();
        let b = IdentityKeypair::generate();
        assert_ne!(*a.seed(), *b.seed());
        assert_ne!(a.public_key(), b.public_key());
    }

    #[test]
    fn test_shared_secret_symmetry() {
        let a = IdentityKeypair::generate();
        let b = IdentityKeypair::generate();
        let ab = a.shared_secret(&b.public_key()).unwrap();
        let ba = b.shared_secret(&a.public_key()).unwrap();
        assert_eq!(ab, ba);

        let c = IdentityKeypair::generate();
        assert_ne!(ab, a.shared_secret(&c.public_key()).unwrap());
    }

    #[test]
    fn test_link_shared_public_key_symmetry() {
        let a = IdentityKeypair::generate();
        let b = IdentityKeypair::generate();
        assert_eq!(
            a.link_shared_public_key(&b.public_key()).unwrap(),
            b.link_shared_public_key(&a.public_key()).unwrap()
        );
    }

    #[test]
    fn test_shared_secret_rejects_bad_peer() {
        let key = IdentityKeypair::generate();
        match key.shared_secret(&[1u8; 31]) {
            Err(Error(ErrorKind::InvalidPublicKey(_), _)) => (),
            other => panic!("unexpected result: {:?}", other),
        }

        // the identity point maps to u = 0
        let mut identity = [0u8; PUBLIC_KEY_LEN];
        identity[0] = 1;
        match key.shared_secret(&identity) {
            Err(Error(ErrorKind::WeakSharedSecret, _)) => (),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_hashes() {
        let key = IdentityKeypair::from_seed(&[9u8; SEED_LEN]);
        assert_eq!(key.identity_hash(), sha256d::Hash::hash(&key.public_key()));
        assert_eq!(key.key_id(), hash160::Hash::hash(&key.public_key()));
    }

    #[test]
    fn test_secret_buffer_contents() {
        let buf = SecretBuffer::<4>::with(|b| b.copy_from_slice(&[1, 2, 3, 4]));
        assert_eq!(buf.as_bytes(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_wipe_zeroes_and_unlocks() {
        let mut buf = SecretBuffer::<32>::with(|b| b.copy_from_slice(&[0xab; 32]));
        buf.wipe();
        assert_eq!(buf.as_bytes(), &[0u8; 32]);
        assert!(!buf.is_locked());
    }

    #[test]
    fn test_panicking_fill_still_wipes() {
        let before = WIPES.with(Cell::get);
        let result = std::panic::catch_unwind(|| {
            SecretBuffer::<32>::with(|b| {
                b.copy_from_slice(&[0xab; 32]);
                panic!("fill failed");
            })
        });
        assert!(result.is_err());
        assert_eq!(WIPES.with(Cell::get), before + 1);
    }

    #[test]
    fn test_buffer_wiped_on_drop() {
        let before = WIPES.with(Cell::get);
        drop(SecretBuffer::<8>::with(|b| b.copy_from_slice(&[7; 8])));
        assert_eq!(WIPES.with(Cell::get), before + 1);
    }

    #[test]
    fn test_shared_secret_eq() {
        assert_eq!(SharedSecret([5; SHARED_SECRET_LEN]), SharedSecret([5; SHARED_SECRET_LEN]));
        let mut other = [5; SHARED_SECRET_LEN];
        other[31] = 6;
        assert_ne!(SharedSecret([5; SHARED_SECRET_LEN]), SharedSecret(other));
    }

    #[test]
    fn test_sanity_check() {
        assert!(sanity_check());
    }

    #[test]
    fn test_debug_hides_secrets() {
        let key = IdentityKeypair::from_seed_hex(SEED).unwrap();
        let shown = format!("{:?}", key);
        assert!(shown.contains(PUBLIC));
        assert!(!shown.contains(SEED));
    }
}
