//! Binary node encoding, mantaray version 0.2.
//!
//! ```text
//! obfuscation_key(32) || xor(obfuscation_key,
//!     version_hash(31) || ref_size(1) || entry(ref_size) || fork_bitmap(32) || fork*
//! )
//! fork = type(1) || prefix_len(1) || prefix(30) || reference(ref_size) || metadata?
//! metadata = len(2, BE) || json, padded with '\n' to a multiple of 32
//! ```
//!
//! Bit `k` of the bitmap (least significant bit first within each byte) is
//! set when a fork with first byte `k` follows. Forks appear in byte order.

use alloy_primitives::{B256, hex};
use bytes::{BufMut, Bytes, BytesMut};
use pollen_primitives::Reference;

use crate::node::{MAX_PREFIX_LENGTH, MantarayNode, Metadata, TYPE_WITH_METADATA};
use crate::{MantarayError, Result};

/// First 31 bytes of `keccak256("mantaray:0.2")`.
pub const VERSION_HASH: [u8; 31] =
    hex!("5768b3b6a7db56d21d1abff40d41cebfc83448fed8d7e9b06ec0d3b073f28f");

const KEY_LENGTH: usize = 32;
const BITMAP_LENGTH: usize = 32;
const METADATA_ALIGNMENT: usize = 32;

impl MantarayNode {
    /// Encodes this node.
    ///
    /// Every fork must already have a reference, see
    /// [`save_recursively`](Self::save_recursively).
    pub fn marshal(&self) -> Result<Bytes> {
        self.ensure_loaded(&self.path)?;
        let ref_size = self.reference_size()?;

        let mut body = BytesMut::with_capacity(4096);
        body.extend_from_slice(&VERSION_HASH);
        body.put_u8(ref_size as u8);
        match &self.entry {
            Some(entry) => body.extend_from_slice(&entry.to_vec()),
            None => body.put_bytes(0, ref_size),
        }

        let mut bitmap = [0u8; BITMAP_LENGTH];
        for key in self.forks.keys() {
            bitmap[usize::from(*key / 8)] |= 1 << (key % 8);
        }
        body.extend_from_slice(&bitmap);

        for child in self.forks.values() {
            let reference = child.self_address.ok_or_else(|| {
                MantarayError::Unsaved(String::from_utf8_lossy(&child.path).into_owned())
            })?;

            body.put_u8(child.node_type());
            body.put_u8(child.path.len() as u8);
            body.extend_from_slice(&child.path);
            body.put_bytes(0, MAX_PREFIX_LENGTH - child.path.len());
            body.extend_from_slice(&reference.to_vec());

            if let Some(metadata) = &child.metadata {
                encode_metadata(metadata, &mut body)?;
            }
        }

        let mut data = BytesMut::with_capacity(KEY_LENGTH + body.len());
        data.extend_from_slice(self.obfuscation_key.as_slice());
        xor_in_place(&mut body, &self.obfuscation_key);
        data.extend_from_slice(&body);
        Ok(data.freeze())
    }

    /// Decodes a node without fetching its forks.
    ///
    /// Forks come back unloaded, carrying their prefix, metadata and
    /// reference. An all-zero entry is read as no entry.
    pub fn unmarshal(data: &[u8]) -> Result<Self> {
        let mut reader = data;
        let key = B256::from_slice(take(&mut reader, KEY_LENGTH)?);

        let mut body = reader.to_vec();
        xor_in_place(&mut body, &key);
        let mut reader = body.as_slice();

        if take(&mut reader, VERSION_HASH.len())? != VERSION_HASH {
            return Err(MantarayError::InvalidVersion);
        }

        let ref_size = usize::from(take(&mut reader, 1)?[0]);
        let entry = match ref_size {
            0 => None,
            Reference::PLAIN_LENGTH | Reference::ENCRYPTED_LENGTH => {
                let bytes = take(&mut reader, ref_size)?;
                if bytes.iter().all(|b| *b == 0) {
                    None
                } else {
                    Some(Reference::from_slice(bytes)?)
                }
            }
            other => return Err(MantarayError::InvalidReferenceSize(other)),
        };

        let mut bitmap = [0u8; BITMAP_LENGTH];
        bitmap.copy_from_slice(take(&mut reader, BITMAP_LENGTH)?);

        let mut node = Self {
            entry,
            obfuscation_key: key,
            ..Self::default()
        };

        for key in 0..=u8::MAX {
            if bitmap[usize::from(key / 8)] & (1 << (key % 8)) == 0 {
                continue;
            }
            if ref_size == 0 {
                return Err(MantarayError::InvalidReferenceSize(0));
            }

            let flags = take(&mut reader, 1)?[0];
            let prefix_len = usize::from(take(&mut reader, 1)?[0]);
            if prefix_len == 0 || prefix_len > MAX_PREFIX_LENGTH {
                return Err(MantarayError::InvalidFork("prefix length out of range"));
            }
            let prefix = &take(&mut reader, MAX_PREFIX_LENGTH)?[..prefix_len];
            if prefix[0] != key {
                return Err(MantarayError::InvalidFork("prefix does not match its bitmap key"));
            }
            let reference = Reference::from_slice(take(&mut reader, ref_size)?)?;

            let metadata = if flags & TYPE_WITH_METADATA != 0 {
                let len = take(&mut reader, 2)?;
                let len = usize::from(u16::from_be_bytes([len[0], len[1]]));
                Some(serde_json::from_slice::<Metadata>(take(&mut reader, len)?)?)
            } else {
                None
            };

            node.forks.insert(
                key,
                Self {
                    path: prefix.to_vec(),
                    metadata,
                    self_address: Some(reference),
                    lazy_flags: Some(flags),
                    ..Self::default()
                },
            );
        }

        Ok(node)
    }

    /// Size of every reference in the encoded node.
    fn reference_size(&self) -> Result<usize> {
        let size = self
            .entry
            .as_ref()
            .or_else(|| self.forks.values().find_map(|child| child.self_address.as_ref()))
            .map_or(Reference::PLAIN_LENGTH, Reference::len);

        match self
            .forks
            .values()
            .filter_map(|child| child.self_address.as_ref())
            .find(|reference| reference.len() != size)
        {
            Some(reference) => Err(MantarayError::InvalidReferenceSize(reference.len())),
            None => Ok(size),
        }
    }
}

fn encode_metadata(metadata: &Metadata, out: &mut BytesMut) -> Result<()> {
    let json = serde_json::to_vec(metadata)?;
    let padded = (2 + json.len()).div_ceil(METADATA_ALIGNMENT) * METADATA_ALIGNMENT;
    let len = u16::try_from(padded - 2)
        .map_err(|_| MantarayError::Metadata(format!("{} bytes of metadata", json.len())))?;

    out.put_u16(len);
    out.extend_from_slice(&json);
    out.put_bytes(b'\n', padded - 2 - json.len());
    Ok(())
}

fn take<'a>(reader: &mut &'a [u8], len: usize) -> Result<&'a [u8]> {
    if reader.len() < len {
        return Err(MantarayError::Truncated {
            needed: len,
            available: reader.len(),
        });
    }
    let (head, tail) = reader.split_at(len);
    *reader = tail;
    Ok(head)
}

fn xor_in_place(data: &mut [u8], key: &B256) {
    if key.is_zero() {
        return;
    }
    for (byte, k) in data.iter_mut().zip(key.iter().cycle()) {
        *byte ^= k;
    }
}
