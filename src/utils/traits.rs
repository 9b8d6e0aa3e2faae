use bincode::{Decode, Encode};

use crate::fs::{FsError, Result};

/// Trait for fixed-layout records that live at a known offset of the image
/// # Note
/// Records are encoded with [bincode::config::legacy],
/// little-endian with fixed-width integers, so field order is the on-disk order.
pub trait OnDiskRecord: Encode + Decode<()> {
    /// bytes reserved for one record in its region
    const SLOT_SIZE: usize;

    /// serialize into the start of `buf`,
    /// bytes after the record are left untouched
    /// # Returns
    /// The number of bytes written if successful
    fn write_into(&self, buf: &mut [u8]) -> Result<usize> {
        let slot = buf
            .get_mut(..Self::SLOT_SIZE)
            .ok_or_else(|| FsError::Corrupted("record slot is shorter than the record".into()))?;
        let config = bincode::config::legacy();
        Ok(bincode::encode_into_slice(self, slot, config)?)
    }

    /// deserialize from the start of `buf`
    fn read_from(buf: &[u8]) -> Result<Self> {
        let slot = buf
            .get(..Self::SLOT_SIZE)
            .ok_or_else(|| FsError::Corrupted("record slot is shorter than the record".into()))?;
        let config = bincode::config::legacy();
        let (object, _bytes_read): (Self, usize) = bincode::decode_from_slice(slot, config)?;
        Ok(object)
    }
}
