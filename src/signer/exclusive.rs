//! At-most-one in-flight signing call per key handle

use super::DigestSigner;
use crate::address::PUBLIC_KEY_LENGTH;
use crate::error::{TxError, TxResult};
use crate::types::{KeyHandle, RawSignature, DIGEST_LENGTH};
use std::collections::HashSet;
use std::sync::Mutex;

/// Wraps a signer whose device cannot run concurrent sessions on one key.
///
/// A request against a handle that is already signing fails immediately
/// with a signer error rather than queueing behind it.
#[derive(Debug)]
pub struct ExclusiveSigner<S> {
    inner: S,
    in_flight: Mutex<HashSet<KeyHandle>>,
}

impl<S: DigestSigner> ExclusiveSigner<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Whether a signing call is currently running on `key`
    pub fn is_busy(&self, key: KeyHandle) -> TxResult<bool> {
        Ok(self.registry()?.contains(&key))
    }

    fn registry(&self) -> TxResult<std::sync::MutexGuard<'_, HashSet<KeyHandle>>> {
        self.in_flight
            .lock()
            .map_err(|_| TxError::signer("in-flight registry lock poisoned"))
    }

    fn acquire(&self, key: KeyHandle) -> TxResult<SlotGuard<'_>> {
        let mut registry = self.registry()?;
        if !registry.insert(key) {
            crate::log_warn!("exclusive_signer", "Rejected concurrent signing request", key_handle = key);
            return Err(TxError::signer(format!("key handle {} busy", key)));
        }
        Ok(SlotGuard {
            registry: &self.in_flight,
            key,
        })
    }
}

/// Releases the key handle when the signing call returns or unwinds
struct SlotGuard<'a> {
    registry: &'a Mutex<HashSet<KeyHandle>>,
    key: KeyHandle,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        let mut registry = match self.registry.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        registry.remove(&self.key);
    }
}

impl<S: DigestSigner> DigestSigner for ExclusiveSigner<S> {
    fn public_key(&self, key: KeyHandle) -> TxResult<[u8; PUBLIC_KEY_LENGTH]> {
        self.inner.public_key(key)
    }

    fn sign(&self, digest: &[u8; DIGEST_LENGTH], key: KeyHandle) -> TxResult<RawSignature> {
        let _slot = self.acquire(key)?;
        self.inner.sign(digest, key)
    }

    fn verify(
        &self,
        digest: &[u8; DIGEST_LENGTH],
        signature: &RawSignature,
        key: KeyHandle,
    ) -> TxResult<bool> {
        self.inner.verify(digest, signature, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::thread;

    /// Blocks inside `sign` until released through a channel
    struct GatedSigner {
        entered: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl DigestSigner for GatedSigner {
        fn public_key(&self, _key: KeyHandle) -> TxResult<[u8; 64]> {
            Ok([0; 64])
        }

        fn sign(&self, _digest: &[u8; 32], _key: KeyHandle) -> TxResult<RawSignature> {
            self.entered.lock().unwrap().send(()).unwrap();
            self.release.lock().unwrap().recv().unwrap();
            Ok(RawSignature::new([1; 32], [1; 32], 0))
        }

        fn verify(&self, _: &[u8; 32], _: &RawSignature, _: KeyHandle) -> TxResult<bool> {
            Ok(true)
        }
    }

    #[test]
    fn test_concurrent_request_on_same_handle_rejected() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let signer = Arc::new(ExclusiveSigner::new(GatedSigner {
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        }));

        let background = {
            let signer = Arc::clone(&signer);
            thread::spawn(move || signer.sign(&[0; 32], KeyHandle(1)))
        };
        entered_rx.recv().unwrap();

        assert!(signer.is_busy(KeyHandle(1)).unwrap());
        let err = signer.sign(&[0; 32], KeyHandle(1)).unwrap_err();
        assert!(matches!(err, TxError::Signer(ref msg) if msg.contains("busy")));

        release_tx.send(()).unwrap();
        assert!(background.join().unwrap().is_ok());
        assert!(!signer.is_busy(KeyHandle(1)).unwrap());
    }

    #[test]
    fn test_slot_released_after_failure() {
        let signer = ExclusiveSigner::new(crate::signer::FixedSigner::new([0; 64]));
        assert!(signer.sign(&[0; 32], KeyHandle(2)).is_err());
        assert!(!signer.is_busy(KeyHandle(2)).unwrap());
    }
}
