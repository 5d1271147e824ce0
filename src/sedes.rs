// Serialization of on-disk structures.
//
// Every structure stored on the virtual disk (superblock, bitmaps,
// inodes, directory entries) implements [Serialize] and [Deserialize]
// with a fixed-size big-endian layout.

use std::{error, fmt};

#[derive(Debug)]
pub enum SedesError {
    DeserialBufferTooSmall,
}

impl error::Error for SedesError {}

impl fmt::Display for SedesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[SEDES] {:?}", self)
    }
}

pub trait Serialize {
    fn serialize(&self) -> Vec<u8>;
}

pub trait Deserialize {
    fn deserialize(buf: &mut Vec<u8>) -> Result<Self, SedesError> where Self: Sized;
}

pub fn u16_to_u8arr(a: u16) -> [u8; 2] {
    a.to_be_bytes()
}

pub fn u32_to_u8arr(a: u32) -> [u8; 4] {
    a.to_be_bytes()
}

pub fn u64_to_u8arr(a: u64) -> [u8; 8] {
    a.to_be_bytes()
}

/// Read a big-endian [u16] from the first two bytes of `arr`.
/// Missing bytes read as zero.
pub fn u8arr_to_u16(arr: &[u8]) -> u16 {
    let mut b = [0u8; 2];
    for (i, v) in b.iter_mut().enumerate() {
        *v = arr.get(i).copied().unwrap_or(0);
    }
    u16::from_be_bytes(b)
}

pub fn u8arr_to_u32(arr: &[u8]) -> u32 {
    let mut b = [0u8; 4];
    for (i, v) in b.iter_mut().enumerate() {
        *v = arr.get(i).copied().unwrap_or(0);
    }
    u32::from_be_bytes(b)
}

pub fn u8arr_to_u64(arr: &[u8]) -> u64 {
    let mut b = [0u8; 8];
    for (i, v) in b.iter_mut().enumerate() {
        *v = arr.get(i).copied().unwrap_or(0);
    }
    u64::from_be_bytes(b)
}
