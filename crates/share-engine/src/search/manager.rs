//! `SearchManager` — the process-global search coordinator: SUDP key pool,
//! AES-128-CBC datagram encryption, and the `SearchInstance` registry.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use aes::Aes128;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};
use crate::listener::{EventBus, SearchManagerEvent};
use crate::search::instance::{InstanceToken, SearchInstance};
use crate::search::query::SearchQuery;

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;

const BLOCK_SIZE: usize = 16;
const ZERO_IV: [u8; BLOCK_SIZE] = [0u8; BLOCK_SIZE];

struct SudpKey {
    bytes: [u8; BLOCK_SIZE],
    created_at: Instant,
}

pub struct SearchManager {
    instances: RwLock<HashMap<InstanceToken, SearchInstance>>,
    next_token: RwLock<InstanceToken>,
    sudp_keys: RwLock<Vec<SudpKey>>,
    sudp_key_ttl: Duration,
    events: EventBus<SearchManagerEvent>,
}

impl SearchManager {
    pub fn new(sudp_key_ttl: Duration) -> Self {
        Self {
            instances: RwLock::new(HashMap::new()),
            next_token: RwLock::new(1),
            sudp_keys: RwLock::new(Vec::new()),
            sudp_key_ttl,
            events: EventBus::default(),
        }
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<SearchManagerEvent> {
        self.events.subscribe()
    }

    pub fn create_search_instance(&self, owner_id: String, expires_in: Option<Duration>) -> InstanceToken {
        let mut next = self.next_token.write();
        let token = *next;
        *next += 1;
        drop(next);

        let instance = SearchInstance::new(token, owner_id, expires_in);
        self.instances.write().insert(token, instance);
        token
    }

    pub fn remove_search_instance(&self, token: InstanceToken) -> Option<SearchInstance> {
        let removed = self.instances.write().remove(&token);
        if let Some(ref instance) = removed {
            self.events.publish(SearchManagerEvent::InstanceClosed {
                instance_id: token,
                result_count: instance.result_count(),
            });
        }
        removed
    }

    pub fn with_instance<R>(&self, token: InstanceToken, f: impl FnOnce(&mut SearchInstance) -> R) -> Option<R> {
        self.instances.write().get_mut(&token).map(f)
    }

    /// Culls expired instances and ages out SUDP keys; intended to run on a
    /// minute timer alongside the bloom-rebuild sweep.
    pub fn run_maintenance(&self) {
        let now = Instant::now();
        self.instances.write().retain(|_, instance| !instance.is_expired(now));

        let ttl = self.sudp_key_ttl;
        self.sudp_keys.write().retain(|key| key.created_at.elapsed() < ttl);
    }

    /// Generate a fresh SUDP key for an outgoing search and register it in
    /// the decrypt pool.
    pub fn generate_sudp_key(&self) -> [u8; BLOCK_SIZE] {
        let mut bytes = [0u8; BLOCK_SIZE];
        getrandom::getrandom(&mut bytes).expect("RNG failed");

        self.sudp_keys.write().push(SudpKey {
            bytes,
            created_at: Instant::now(),
        });
        bytes
    }

    /// Encrypt a search-result datagram: 16 random IV-position bytes
    /// prepended to the plaintext, PKCS#5 padded to a block boundary, then
    /// AES-128-CBC encrypted with a zero IV (the randomness lives in the
    /// prepended bytes, not the cipher IV).
    pub fn encrypt_sudp(key: &[u8; BLOCK_SIZE], plaintext: &[u8]) -> Vec<u8> {
        let mut prefixed = vec![0u8; BLOCK_SIZE];
        getrandom::getrandom(&mut prefixed).expect("RNG failed");
        prefixed.extend_from_slice(plaintext);

        let pad_len = BLOCK_SIZE - (prefixed.len() % BLOCK_SIZE);
        prefixed.resize(prefixed.len() + pad_len, pad_len as u8);

        let mut encryptor = Aes128CbcEnc::new(key.into(), &ZERO_IV.into());
        for block in prefixed.chunks_mut(BLOCK_SIZE) {
            let block: &mut [u8; BLOCK_SIZE] = block.try_into().expect("block-aligned buffer");
            encryptor.encrypt_block_mut(block.into());
        }
        prefixed
    }

    /// Try every active key, newest first, to decrypt an inbound datagram.
    pub fn decrypt_sudp(&self, datagram: &[u8]) -> EngineResult<Vec<u8>> {
        if datagram.len() % BLOCK_SIZE != 0 || datagram.is_empty() {
            return Err(EngineError::SudpDecryptFailed);
        }

        let keys = self.sudp_keys.read();
        for candidate in keys.iter().rev() {
            if let Some(plaintext) = try_decrypt_with_key(&candidate.bytes, datagram) {
                return Ok(plaintext);
            }
        }
        warn!("SUDP decrypt failed against {} pooled keys", keys.len());
        Err(EngineError::SudpDecryptFailed)
    }
}

fn try_decrypt_with_key(key: &[u8; BLOCK_SIZE], datagram: &[u8]) -> Option<Vec<u8>> {
    let mut buf = datagram.to_vec();
    let mut decryptor = Aes128CbcDec::new(key.into(), &ZERO_IV.into());
    for block in buf.chunks_mut(BLOCK_SIZE) {
        let block: &mut [u8; BLOCK_SIZE] = block.try_into().ok()?;
        decryptor.decrypt_block_mut(block.into());
    }

    let pad_len = *buf.last()? as usize;
    if pad_len == 0 || pad_len > BLOCK_SIZE || pad_len > buf.len() {
        return None;
    }
    if !buf[buf.len() - pad_len..].iter().all(|&b| b as usize == pad_len) {
        return None;
    }
    buf.truncate(buf.len() - pad_len);

    if buf.len() < BLOCK_SIZE {
        return None;
    }
    Some(buf.split_off(BLOCK_SIZE))
}

/// Synthesizes an outgoing `SEARCH`/`RES` wire payload description; the
/// actual hub transport is a collaborator concern.
#[derive(Clone, Debug)]
pub struct SearchQueueInfo {
    pub queued_hubs: Vec<String>,
    pub sent_hubs: Vec<String>,
}

pub fn dispatch_search(hub_urls: &[String], _query: &SearchQuery) -> SearchQueueInfo {
    debug!("dispatching search to {} hubs", hub_urls.len());
    SearchQueueInfo {
        queued_hubs: Vec::new(),
        sent_hubs: hub_urls.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sudp_round_trips_arbitrary_payload() {
        let mut key = [0u8; BLOCK_SIZE];
        getrandom::getrandom(&mut key).unwrap();

        let plaintext = b"RES FNpath SI1234 TOabc";
        let encrypted = SearchManager::encrypt_sudp(&key, plaintext);

        let decrypted = try_decrypt_with_key(&key, &encrypted).expect("decrypt should succeed");
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn sudp_decrypt_with_known_test_vector_key() {
        let key_bytes = share_core::base32::decode("DR6AOECCMYK5DQ2VDATONKFSWU").unwrap();
        let key: [u8; BLOCK_SIZE] = key_bytes.try_into().unwrap();

        let plaintext = b"hello from a hub";
        let encrypted = SearchManager::encrypt_sudp(&key, plaintext);
        let decrypted = try_decrypt_with_key(&key, &encrypted).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn decrypt_fails_with_wrong_key() {
        let key_a = [1u8; BLOCK_SIZE];
        let key_b = [2u8; BLOCK_SIZE];
        let encrypted = SearchManager::encrypt_sudp(&key_a, b"payload");
        assert!(try_decrypt_with_key(&key_b, &encrypted).is_none());
    }

    #[test]
    fn manager_tries_newest_key_first() {
        let manager = SearchManager::new(Duration::from_secs(900));
        let _old_key = manager.generate_sudp_key();
        let new_key = manager.generate_sudp_key();

        let encrypted = SearchManager::encrypt_sudp(&new_key, b"payload");
        let decrypted = manager.decrypt_sudp(&encrypted).unwrap();
        assert_eq!(decrypted, b"payload");
    }

    #[test]
    fn instance_registry_create_and_remove() {
        let manager = SearchManager::new(Duration::from_secs(900));
        let token = manager.create_search_instance("owner".into(), None);
        assert!(manager.with_instance(token, |_| ()).is_some());
        assert!(manager.remove_search_instance(token).is_some());
        assert!(manager.with_instance(token, |_| ()).is_none());
    }
}
