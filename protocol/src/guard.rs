//! In-flight guards around the two worker phases.
//!
//! The orchestrator is otherwise stateless: the artifact is round-tripped by
//! the caller and nothing about a request survives between build and submit.
//! These two guards are the exception. They exist to uphold two at-most-once
//! rules on a single replica:
//!
//! - [`BuildGuard`]: one build per (requestor, kind) at a time, so two
//!   concurrent builds cannot both draw on the same off-chain reward balance.
//! - [`SubmissionGuard`]: an artifact is offered for merge+submit at most
//!   once successfully. A digest is held while the submit runs and kept once
//!   it succeeds, until the retention window passes. A failed submit
//!   releases the digest so the caller may retry.
//!
//! Both hand out RAII tokens; dropping a token without committing releases it.

use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use sha2::{Digest, Sha256};

use crate::config::SUBMISSION_RETENTION_SECS;
use crate::transaction::types::{TransactionKind, TxId, UnsignedTxHex};

// ---------------------------------------------------------------------------
// BuildGuard
// ---------------------------------------------------------------------------

type BuildKey = (String, TransactionKind);

/// Tracks which (requestor, kind) pairs have a build in flight.
#[derive(Debug, Default)]
pub struct BuildGuard {
    in_flight: DashSet<BuildKey>,
}

/// Proof that the holder owns the build slot for its key.
#[derive(Debug)]
pub struct BuildPermit<'a> {
    guard: &'a BuildGuard,
    key: BuildKey,
}

impl BuildGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the build slot, or returns `None` if it is already taken.
    pub fn try_acquire(&self, requestor: &str, kind: TransactionKind) -> Option<BuildPermit<'_>> {
        let key = (requestor.to_string(), kind);
        if self.in_flight.insert(key.clone()) {
            Some(BuildPermit { guard: self, key })
        } else {
            None
        }
    }

    pub fn is_building(&self, requestor: &str, kind: TransactionKind) -> bool {
        self.in_flight.contains(&(requestor.to_string(), kind))
    }
}

impl Drop for BuildPermit<'_> {
    fn drop(&mut self) {
        self.guard.in_flight.remove(&self.key);
    }
}

// ---------------------------------------------------------------------------
// SubmissionGuard
// ---------------------------------------------------------------------------

/// What the guard knows about an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    /// A merge+submit for this artifact is running.
    InFlight,
    /// The network accepted it under this id.
    Submitted(TxId),
}

/// SHA-256 of the artifact's hex text, case-folded.
pub type ArtifactDigest = [u8; 32];

#[derive(Debug, Clone)]
struct Tracked {
    state: SubmissionState,
    since: Instant,
}

/// Remembers artifacts that were submitted or are being submitted.
///
/// `Submitted` entries older than the retention window are pruned on the
/// next [`claim`](Self::claim). In-flight entries are never pruned; their
/// claim removes them.
#[derive(Debug)]
pub struct SubmissionGuard {
    artifacts: DashMap<ArtifactDigest, Tracked>,
    retention: Duration,
}

impl Default for SubmissionGuard {
    fn default() -> Self {
        Self::with_retention(Duration::from_secs(SUBMISSION_RETENTION_SECS))
    }
}

/// An exclusive claim on submitting one artifact.
#[derive(Debug)]
pub struct SubmissionClaim<'a> {
    guard: &'a SubmissionGuard,
    digest: ArtifactDigest,
    committed: bool,
}

impl SubmissionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retention(retention: Duration) -> Self {
        Self {
            artifacts: DashMap::new(),
            retention,
        }
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Drops `Submitted` entries older than the retention window.
    pub fn prune(&self) {
        let retention = self.retention;
        self.artifacts.retain(|_, tracked| {
            matches!(tracked.state, SubmissionState::InFlight)
                || tracked.since.elapsed() < retention
        });
    }

    pub fn digest(artifact: &UnsignedTxHex) -> ArtifactDigest {
        let mut hasher = Sha256::new();
        hasher.update(artifact.as_str().to_ascii_lowercase().as_bytes());
        hasher.finalize().into()
    }

    /// Claims `artifact` for submission. Fails with the existing state if it
    /// is in flight or already submitted.
    pub fn claim(&self, artifact: &UnsignedTxHex) -> Result<SubmissionClaim<'_>, SubmissionState> {
        self.prune();
        let digest = Self::digest(artifact);
        match self.artifacts.entry(digest) {
            Entry::Occupied(existing) => Err(existing.get().state.clone()),
            Entry::Vacant(slot) => {
                slot.insert(Tracked {
                    state: SubmissionState::InFlight,
                    since: Instant::now(),
                });
                Ok(SubmissionClaim {
                    guard: self,
                    digest,
                    committed: false,
                })
            }
        }
    }

    pub fn state(&self, artifact: &UnsignedTxHex) -> Option<SubmissionState> {
        self.artifacts
            .get(&Self::digest(artifact))
            .map(|tracked| tracked.state.clone())
    }
}

impl SubmissionClaim<'_> {
    /// Records a successful submission. The artifact stays claimed until
    /// the retention window passes.
    pub fn commit(mut self, tx_id: TxId) {
        self.guard.artifacts.insert(
            self.digest,
            Tracked {
                state: SubmissionState::Submitted(tx_id),
                since: Instant::now(),
            },
        );
        self.committed = true;
    }
}

impl Drop for SubmissionClaim<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.guard.artifacts.remove(&self.digest);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_build_for_same_key_is_refused() {
        let guard = BuildGuard::new();
        let permit = guard.try_acquire("alice", TransactionKind::Mint);
        assert!(permit.is_some());
        assert!(guard.try_acquire("alice", TransactionKind::Mint).is_none());

        // Other requestors and other kinds are independent.
        assert!(guard.try_acquire("bob", TransactionKind::Mint).is_some());
        assert!(guard.try_acquire("alice", TransactionKind::Burn).is_some());
    }

    #[test]
    fn dropping_permit_releases_slot() {
        let guard = BuildGuard::new();
        {
            let _permit = guard.try_acquire("alice", TransactionKind::Mint).unwrap();
            assert!(guard.is_building("alice", TransactionKind::Mint));
        }
        assert!(!guard.is_building("alice", TransactionKind::Mint));
        assert!(guard.try_acquire("alice", TransactionKind::Mint).is_some());
    }

    #[test]
    fn committed_artifact_cannot_be_claimed_again() {
        let guard = SubmissionGuard::new();
        let artifact = UnsignedTxHex::new("84a400");

        guard.claim(&artifact).unwrap().commit(TxId::new("abc123"));

        assert_eq!(
            guard.claim(&artifact).unwrap_err(),
            SubmissionState::Submitted(TxId::new("abc123"))
        );
    }

    #[test]
    fn in_flight_artifact_cannot_be_claimed_twice() {
        let guard = SubmissionGuard::new();
        let artifact = UnsignedTxHex::new("84a400");
        let _claim = guard.claim(&artifact).unwrap();
        assert_eq!(
            guard.claim(&artifact).unwrap_err(),
            SubmissionState::InFlight
        );
    }

    #[test]
    fn abandoned_claim_is_released() {
        let guard = SubmissionGuard::new();
        let artifact = UnsignedTxHex::new("84a400");
        drop(guard.claim(&artifact).unwrap());
        assert_eq!(guard.state(&artifact), None);
        assert!(guard.claim(&artifact).is_ok());
    }

    #[test]
    fn submitted_entries_expire_after_retention() {
        let guard = SubmissionGuard::with_retention(Duration::from_millis(50));
        let artifact = UnsignedTxHex::new("84a400");
        guard.claim(&artifact).unwrap().commit(TxId::new("abc123"));
        assert!(guard.claim(&artifact).is_err());

        std::thread::sleep(Duration::from_millis(80));

        let claim = guard.claim(&artifact).expect("expired entry was pruned");
        claim.commit(TxId::new("def456"));
        assert_eq!(guard.len(), 1);
    }

    #[test]
    fn in_flight_entries_survive_pruning() {
        let guard = SubmissionGuard::with_retention(Duration::ZERO);
        let artifact = UnsignedTxHex::new("84a400");
        let _claim = guard.claim(&artifact).unwrap();

        guard.prune();
        assert_eq!(guard.state(&artifact), Some(SubmissionState::InFlight));
    }

    #[test]
    fn claim_prunes_unrelated_expired_entries() {
        let guard = SubmissionGuard::with_retention(Duration::ZERO);
        for hex in ["84a401", "84a402", "84a403"] {
            guard
                .claim(&UnsignedTxHex::new(hex))
                .unwrap()
                .commit(TxId::new(hex));
        }
        drop(guard.claim(&UnsignedTxHex::new("84a404")).unwrap());
        assert!(guard.is_empty());
    }

    #[test]
    fn digest_ignores_hex_case() {
        assert_eq!(
            SubmissionGuard::digest(&UnsignedTxHex::new("84A4FF")),
            SubmissionGuard::digest(&UnsignedTxHex::new("84a4ff"))
        );
    }
}
