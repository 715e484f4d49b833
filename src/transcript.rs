use sha2::{Digest, Sha256, Sha384};

use crate::buffer::Buf;
use crate::Error;

/// Hash algorithms a transcript can commit to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    /// SHA-256.
    Sha256,
    /// SHA-384.
    Sha384,
}

/// The rolling handshake transcript hash.
///
/// Until the hello exchange settles the cipher suite, the algorithm is not
/// known, yet message bytes must already be accumulated. The transcript
/// therefore starts *deferred*: a growing log of the exact bytes fed to it.
/// [`commit`][TranscriptHash::commit] replays that log into the negotiated
/// algorithm, after which updates flow straight into the hash state.
pub enum TranscriptHash {
    /// Byte log kept before the algorithm is known.
    Deferred(Buf),
    /// Committed SHA-256 state.
    Sha256(Sha256),
    /// Committed SHA-384 state.
    Sha384(Sha384),
}

impl TranscriptHash {
    /// Create a new, deferred transcript.
    pub fn new() -> Self {
        TranscriptHash::Deferred(Buf::new())
    }

    /// Feed bytes to the transcript.
    pub fn update(&mut self, data: &[u8]) {
        match self {
            TranscriptHash::Deferred(log) => log.extend_from_slice(data),
            TranscriptHash::Sha256(hash) => hash.update(data),
            TranscriptHash::Sha384(hash) => hash.update(data),
        }
    }

    /// Collapse a deferred transcript into the given algorithm by replaying
    /// the byte log. A no-op on an already committed transcript.
    pub fn commit(&mut self, algorithm: HashAlgorithm) {
        let TranscriptHash::Deferred(log) = self else {
            trace!("Transcript already committed");
            return;
        };

        let mut concrete = match algorithm {
            HashAlgorithm::Sha256 => TranscriptHash::Sha256(Sha256::new()),
            HashAlgorithm::Sha384 => TranscriptHash::Sha384(Sha384::new()),
        };
        concrete.update(log);

        *self = concrete;
    }

    /// Finalize a fork of the current state and return the digest. The live
    /// transcript is untouched and keeps accumulating.
    ///
    /// A deferred transcript has no digest yet.
    pub fn clone_and_finalize(&self) -> Result<Vec<u8>, Error> {
        match self {
            TranscriptHash::Deferred(_) => Err(Error::UncommittedTranscript),
            TranscriptHash::Sha256(hash) => Ok(hash.clone().finalize().to_vec()),
            TranscriptHash::Sha384(hash) => Ok(hash.clone().finalize().to_vec()),
        }
    }

    /// Restart the transcript. A committed transcript keeps its algorithm;
    /// a deferred one drops its log.
    pub fn reset(&mut self) {
        match self {
            TranscriptHash::Deferred(_) => *self = TranscriptHash::new(),
            TranscriptHash::Sha256(_) => *self = TranscriptHash::Sha256(Sha256::new()),
            TranscriptHash::Sha384(_) => *self = TranscriptHash::Sha384(Sha384::new()),
        }
    }
}

impl Default for TranscriptHash {
    fn default() -> Self {
        TranscriptHash::new()
    }
}
