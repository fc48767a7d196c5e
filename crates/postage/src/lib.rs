//! Client-side postage stamping for Ethereum Swarm.
//!
//! A postage batch pays for `2^depth` chunks, split into `2^bucket_depth`
//! collision buckets. Before a chunk is handed to a node it needs a stamp: a
//! bucket slot allocated from the batch and a signature by the batch owner.
//! This crate keeps the per-bucket counters locally, refusing a chunk whose
//! bucket is full exactly as the network would.
//!
//! # Core Types
//!
//! - [`BucketLayout`]: depth and bucket depth of a batch
//! - [`MemoryIssuer`]: the per-bucket counters, exportable as a state blob
//! - [`BatchStamper`]: an issuer behind a mutex plus a signer
//! - [`Envelope`]: a signed stamp with its issuer
//! - [`Stamp`]: the 113 byte stamp wire form
//!
//! # Features
//!
//! - `serde`: serde derives for [`BucketLayout`] and [`StampIndex`]

mod batch;
mod error;
mod issuer;
mod stamp;
mod stamper;
mod util;

pub use batch::{BatchId, BucketLayout, DEFAULT_BUCKET_DEPTH, MAX_BUCKET_DEPTH};
pub use error::{SigningError, StampError};
pub use issuer::{MemoryIssuer, StampIssuer};
pub use stamp::{STAMP_SIZE, Stamp, StampBytes, StampDigest, StampIndex};
pub use stamper::{BatchStamper, Envelope, Stamper};
pub use util::{calculate_bucket, current_timestamp};
