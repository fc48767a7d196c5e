//! Swarm file hashing.
//!
//! Data larger than one chunk is stored as a tree: 4096 byte leaves at the
//! bottom, intermediate chunks of up to 128 child addresses above them and a
//! single root whose address identifies the whole file.
//!
//! - [`ChunkTree`]: single pass splitter, emitting chunks to a sink
//! - [`split`] / [`root_address`]: one-shot helpers
//! - [`join`]: walks a tree in a [`ChunkStore`](pollen_store::ChunkStore) back into bytes
//! - [`upload`]: splits, stamps and stores data
//! - [`RequestLimit`]: one cap on store requests for a whole traversal, see
//!   [`join_with`] and [`upload_with`]
//!
//! ```
//! use pollen_file::root_address;
//!
//! let address = root_address(b"helloworld").unwrap();
//! assert_eq!(
//!     address.to_string(),
//!     "c3d78c959eb23a464619e893358a1d90e467f37c72742985ccc89159350098b4"
//! );
//! ```

mod error;
mod join;
mod limit;
mod tree;
mod upload;

pub use error::{FileError, Result};
pub use join::{fetch_chunk, join, join_with};
pub use limit::RequestLimit;
pub use tree::{ChunkTree, root_address, split};
pub use upload::{UploadResult, put_chunk, upload, upload_with};
