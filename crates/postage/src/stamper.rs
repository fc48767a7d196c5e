//! Stamper trait and implementations for creating signed stamps.
//!
//! # EIP-191 Compatibility
//!
//! To be compatible with Go/bee implementations, stamps must be signed using
//! EIP-191 personal message signing. The prehash (keccak256 of stamp data) is
//! treated as the message, which gets prefixed with `"\x19Ethereum Signed Message:\n32"`.
//!
//! Use alloy's [`SignerSync`] trait with `sign_message_sync(prehash.as_slice())`
//! rather than `sign_hash_sync` to ensure compatibility.

use std::sync::Arc;

use alloy_primitives::{Address, Signature};
use alloy_signer::{Signer, SignerSync};
use bytes::Bytes;
use parking_lot::Mutex;
use pollen_primitives::SwarmAddress;
use tracing::trace;

use crate::error::SigningError;
use crate::{
    BatchId, BucketLayout, MemoryIssuer, Stamp, StampDigest, StampError, StampIndex, StampIssuer,
    current_timestamp,
};

/// A signed stamp together with the issuer that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// The batch paying for the chunk.
    pub batch_id: BatchId,
    /// Address of the batch owner that signed the stamp.
    pub issuer: Address,
    /// Bucket and position allocated to the chunk.
    pub index: StampIndex,
    /// Nanoseconds since the Unix epoch.
    pub timestamp: u64,
    /// EIP-191 signature over the stamp digest.
    pub signature: Signature,
}

impl Envelope {
    /// The 8 byte index as sent alongside the chunk.
    pub const fn index_bytes(&self) -> [u8; 8] {
        self.index.to_be_bytes()
    }

    /// The 113 byte stamp wire form.
    pub fn to_stamp(&self) -> Stamp {
        Stamp::new(
            self.batch_id,
            self.index,
            self.timestamp,
            self.signature.as_bytes(),
        )
    }

    /// Checks that the signature over the chunk at `address` recovers to the
    /// issuer.
    pub fn verify(&self, address: &SwarmAddress) -> Result<(), StampError> {
        let actual = self.to_stamp().recover_issuer(*address)?;
        if actual != self.issuer {
            return Err(StampError::OwnerMismatch {
                expected: self.issuer,
                actual,
            });
        }
        Ok(())
    }
}

/// A trait for entities that can stamp chunks.
///
/// Stamping takes `&self`: implementations serialize access to their counters
/// internally, so one stamper can be shared by concurrent uploads.
pub trait Stamper: Send + Sync {
    /// Stamps a chunk identified by its address.
    ///
    /// # Errors
    ///
    /// Returns an error if the bucket of the chunk is full or signing fails.
    fn stamp(&self, address: &SwarmAddress) -> Result<Envelope, SigningError>;

    /// Returns the batch ID that stamps are issued for.
    fn batch_id(&self) -> BatchId;
}

impl<T: Stamper + ?Sized> Stamper for Arc<T> {
    fn stamp(&self, address: &SwarmAddress) -> Result<Envelope, SigningError> {
        (**self).stamp(address)
    }

    fn batch_id(&self) -> BatchId {
        (**self).batch_id()
    }
}

/// A stamper that combines a [`MemoryIssuer`] with a signer.
///
/// The issuer sits behind a mutex that is held only for the index
/// allocation, so each call makes exactly one allocation decision and
/// signing runs outside the lock.
///
/// # Example
///
/// ```
/// use alloy_primitives::B256;
/// use alloy_signer_local::PrivateKeySigner;
/// use pollen_postage::{BatchStamper, Stamper};
/// use pollen_primitives::SwarmAddress;
///
/// let stamper = BatchStamper::from_blank(PrivateKeySigner::random(), B256::ZERO, 17, 16).unwrap();
/// let envelope = stamper.stamp(&SwarmAddress::zero()).unwrap();
/// assert_eq!(envelope.index.index(), 0);
/// ```
#[derive(Debug)]
pub struct BatchStamper<S> {
    issuer: Mutex<MemoryIssuer>,
    signer: S,
    owner: Address,
}

impl<S> BatchStamper<S>
where
    S: SignerSync + Signer,
{
    /// Creates a new batch stamper with the given issuer and signer.
    pub fn new(issuer: MemoryIssuer, signer: S) -> Self {
        let owner = signer.address();
        Self {
            issuer: Mutex::new(issuer),
            signer,
            owner,
        }
    }

    /// Creates a stamper for a batch with no stamps issued yet.
    pub fn from_blank(
        signer: S,
        batch_id: BatchId,
        depth: u8,
        bucket_depth: u8,
    ) -> Result<Self, StampError> {
        let layout = BucketLayout::new(depth, bucket_depth)?;
        Ok(Self::new(MemoryIssuer::new(batch_id, layout), signer))
    }

    /// Resumes stamping from counters exported by [`state`](Self::state).
    pub fn from_state(
        signer: S,
        batch_id: BatchId,
        state: &[u8],
        depth: u8,
        bucket_depth: u8,
    ) -> Result<Self, StampError> {
        let layout = BucketLayout::new(depth, bucket_depth)?;
        Ok(Self::new(
            MemoryIssuer::from_state(batch_id, layout, state)?,
            signer,
        ))
    }

    /// Exports the bucket counters.
    pub fn state(&self) -> Bytes {
        self.issuer.lock().state()
    }

    /// Address of the signer.
    pub const fn owner(&self) -> Address {
        self.owner
    }

    /// Returns a reference to the signer.
    pub const fn signer(&self) -> &S {
        &self.signer
    }

    /// Current utilization of the given bucket.
    pub fn bucket_utilization(&self, bucket: u32) -> u32 {
        self.issuer.lock().bucket_utilization(bucket)
    }

    /// Current utilization of the most-used bucket.
    pub fn max_bucket_utilization(&self) -> u32 {
        self.issuer.lock().max_bucket_utilization()
    }

    /// Whether the given bucket accepts another chunk.
    pub fn bucket_has_capacity(&self, bucket: u32) -> bool {
        self.issuer.lock().bucket_has_capacity(bucket)
    }

    /// Total number of stamps issued.
    pub fn stamps_issued(&self) -> u64 {
        self.issuer.lock().stamps_issued()
    }

    /// Stamps a chunk with a caller-chosen timestamp.
    pub fn stamp_at(
        &self,
        address: &SwarmAddress,
        timestamp: u64,
    ) -> Result<Envelope, SigningError> {
        let digest = self.issuer.lock().prepare_stamp(address, timestamp)?;
        self.sign(digest)
    }

    fn sign(&self, digest: StampDigest) -> Result<Envelope, SigningError> {
        let prehash = digest.to_prehash();
        let signature = self.signer.sign_message_sync(prehash.as_slice())?;

        trace!(
            address = %digest.chunk_address,
            bucket = digest.index.bucket(),
            index = digest.index.index(),
            "stamp issued"
        );

        Ok(Envelope {
            batch_id: digest.batch_id,
            issuer: self.owner,
            index: digest.index,
            timestamp: digest.timestamp,
            signature,
        })
    }
}

impl<S> Stamper for BatchStamper<S>
where
    S: SignerSync + Signer + Send + Sync,
{
    fn stamp(&self, address: &SwarmAddress) -> Result<Envelope, SigningError> {
        self.stamp_at(address, current_timestamp())
    }

    fn batch_id(&self) -> BatchId {
        self.issuer.lock().batch_id()
    }
}
