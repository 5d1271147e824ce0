use crate::sedes::{self, Serialize, Deserialize, SedesError};
use super::{disk, data, inode};

const SUPERBLOCK_SIZE: usize = 34;

/// Written to block 0 when the disk is formatted. A wrong or missing
/// magic number means the file holds no file system.
pub const MAGIC: u16 = 0xE3AC;

// ====== SUPERBLOCK ======

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Superblock {
    pub magic: u16,                 // 2
    pub block_size: u32,            // 4
    pub block_count: u32,           // 4
    pub inode_count: u32,           // 4
    pub inode_bitmap_offset: u32,   // 4
    pub inode_offset: u32,          // 4
    pub data_bitmap_offset: u32,    // 4
    pub data_offset: u32,           // 4
    pub max_file_size: u32,         // 4
}

impl Superblock {
    pub fn new() -> Self {
        Self {
            magic: MAGIC,
            block_size: disk::BLOCK_SIZE,
            block_count: disk::BLOCK_COUNT,
            inode_count: inode::INODE_COUNT,
            inode_bitmap_offset: inode::BITMAP_OFFSET,
            inode_offset: inode::INODE_OFFSET,
            data_bitmap_offset: data::BITMAP_OFFSET,
            data_offset: data::DATA_OFFSET,
            max_file_size: inode::MAX_SIZE,
        }
    }
}

impl Serialize for Superblock {
    fn serialize(&self) -> Vec<u8> {
        let mut v = Vec::<u8>::with_capacity(SUPERBLOCK_SIZE);
        v.extend_from_slice(&sedes::u16_to_u8arr(self.magic));
        v.extend_from_slice(&sedes::u32_to_u8arr(self.block_size));
        v.extend_from_slice(&sedes::u32_to_u8arr(self.block_count));
        v.extend_from_slice(&sedes::u32_to_u8arr(self.inode_count));
        v.extend_from_slice(&sedes::u32_to_u8arr(self.inode_bitmap_offset));
        v.extend_from_slice(&sedes::u32_to_u8arr(self.inode_offset));
        v.extend_from_slice(&sedes::u32_to_u8arr(self.data_bitmap_offset));
        v.extend_from_slice(&sedes::u32_to_u8arr(self.data_offset));
        v.extend_from_slice(&sedes::u32_to_u8arr(self.max_file_size));
        v
    }
}

impl Deserialize for Superblock {
    fn deserialize(buf: &mut Vec<u8>) -> std::result::Result<Self, SedesError> {
        if buf.len() < SUPERBLOCK_SIZE {
            return Err(SedesError::DeserialBufferTooSmall)
        }
        let bytes = buf.as_slice();
        let mut me = Self::new();
        me.magic = sedes::u8arr_to_u16(&bytes[0..2]);
        me.block_size = sedes::u8arr_to_u32(&bytes[2..6]);
        me.block_count = sedes::u8arr_to_u32(&bytes[6..10]);
        me.inode_count = sedes::u8arr_to_u32(&bytes[10..14]);
        me.inode_bitmap_offset = sedes::u8arr_to_u32(&bytes[14..18]);
        me.inode_offset = sedes::u8arr_to_u32(&bytes[18..22]);
        me.data_bitmap_offset = sedes::u8arr_to_u32(&bytes[22..26]);
        me.data_offset = sedes::u8arr_to_u32(&bytes[26..30]);
        me.max_file_size = sedes::u8arr_to_u32(&bytes[30..34]);
        Ok(me)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_keeps_layout_fields() {
        let sb = Superblock::new();
        let mut buf = sb.serialize();
        assert_eq!(buf.len(), SUPERBLOCK_SIZE);
        let back = Superblock::deserialize(&mut buf).unwrap();
        assert_eq!(back, sb);
        assert_eq!(back.magic, MAGIC);
    }

    #[test]
    fn short_buffer_is_rejected() {
        let mut buf = vec![0u8; SUPERBLOCK_SIZE - 1];
        assert!(Superblock::deserialize(&mut buf).is_err());
    }
}
