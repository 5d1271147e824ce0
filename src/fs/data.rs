// Data block allocation. Addresses handed out are absolute block
// addresses on the disk, offset past the metadata region; address 0
// can never be a data block, which lets pointer lists use it as a
// terminator.

const BITMAP_BLOCK: u32 = 16;
pub const BITMAP_OFFSET: u32 = inode::INODE_OFFSET + inode::INODE_COUNT / inode::INODE_PER_BLOCK;
pub const DATA_OFFSET: u32 = BITMAP_OFFSET + BITMAP_BLOCK;
const MAX_DATA_BLOCK: u32 = disk::BLOCK_COUNT - DATA_OFFSET;

// ====== ERROR ======

use std::{error, fmt, result};
use crate::sedes::SedesError;
use super::disk::DiskError;

#[derive(Debug)]
pub enum DataError {
    InsufficientUsableBlocks,
    InvalidAddr,
    DiskErr(DiskError),
    SedesErr(SedesError),
}

impl error::Error for DataError {}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DataError: {:?}", &self)
    }
}

impl From<DiskError> for DataError {
    fn from(e: DiskError) -> Self { Self::DiskErr(e) }
}

impl From<SedesError> for DataError {
    fn from(e: SedesError) -> Self { Self::SedesErr(e) }
}

type Result<T> = result::Result<T, DataError>;

// ====== FN ======

use crate::sedes::Deserialize;

use super::{disk, inode};
use super::disk::Disk;
use super::bitmap::Bitmap;

fn get_bitmap(d: &mut Disk) -> Result<Bitmap> {
    let addrs: Vec<u32> = (BITMAP_OFFSET..DATA_OFFSET).collect();
    let mut data = d.read_blocks(&addrs)?;
    Ok(Bitmap::deserialize(&mut data)?)
}

fn save_bitmap(d: &mut Disk, bitmap: &Bitmap) -> Result<()> {
    let mut data = Vec::<(u32, Vec<u8>)>::with_capacity(BITMAP_BLOCK as usize);
    for i in 0..BITMAP_BLOCK {
        let bytes = match bitmap.get_serialized_map(i as usize) {
            Ok(b) => b,
            Err(_) => break
        };
        data.push((BITMAP_OFFSET + i, bytes));
    }
    Ok(d.write_blocks(&data)?)
}

/// Allocate `count` data blocks and return their absolute addresses.
/// Nothing is written until all of them are found, so a failed
/// allocation leaves the bitmap on disk untouched.
///
/// ## Error
///
/// - `InsufficientUsableBlocks`
/// - `DiskErr`
pub fn alloc_blocks(d: &mut Disk, count: u32) -> Result<Vec<u32>> {
    let mut bitmap = get_bitmap(d)?;
    let mut v = Vec::<u32>::with_capacity(count as usize);
    for _ in 0..count {
        let pos = match bitmap.next_usable() {
            Some(p) if p < MAX_DATA_BLOCK => p,
            _ => return Err(DataError::InsufficientUsableBlocks)
        };
        if bitmap.set_true(pos).is_err() {
            return Err(DataError::InvalidAddr)
        }
        v.push(pos + DATA_OFFSET);
    }
    save_bitmap(d, &bitmap)?;
    Ok(v)
}

/// Return data blocks to the allocator.
///
/// ## Error
///
/// - `InvalidAddr`: some address is not in the data region
/// - `DiskErr`
pub fn free_blocks(d: &mut Disk, addrs: &[u32]) -> Result<()> {
    if addrs.is_empty() {
        return Ok(())
    }
    let mut bitmap = get_bitmap(d)?;
    for addr in addrs {
        if *addr < DATA_OFFSET {
            return Err(DataError::InvalidAddr)
        }
        if bitmap.set_false(*addr - DATA_OFFSET).is_err() {
            return Err(DataError::InvalidAddr)
        }
    }
    save_bitmap(d, &bitmap)?;
    Ok(())
}

/// Count of unallocated data blocks.
pub fn free_count(d: &mut Disk) -> Result<u32> {
    let bitmap = get_bitmap(d)?;
    let spare = BITMAP_BLOCK * super::bitmap::BITS_PER_MAP - MAX_DATA_BLOCK;
    Ok(bitmap.rest_usable() - spare)
}
