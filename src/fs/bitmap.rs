use crate::sedes::{self, Serialize, Deserialize, SedesError};

use super::disk::BLOCK_SIZE;

/// Number of [u64] words in one bitmap block.
pub const BITMAP_SIZE: usize = BLOCK_SIZE as usize / 8;
/// Number of bits tracked by one bitmap block.
pub const BITS_PER_MAP: u32 = (BITMAP_SIZE * 64) as u32;

// ====== ERROR ======

use std::{error, fmt, result};

#[derive(Debug)]
pub enum BitmapError {
    InvalidPos,
}

impl error::Error for BitmapError {}

impl fmt::Display for BitmapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BitmapError: {:?}", &self)
    }
}

type Result<T> = result::Result<T, BitmapError>;

// ====== BITMAP ======

/// An allocation bitmap that fits exactly one disk block.
/// A set bit marks the slot at that position as used.
pub struct BlockBitmap {
    data: [u64; BITMAP_SIZE],
}

impl BlockBitmap {
    fn word(&self, pos: u32) -> Result<usize> {
        let i = (pos / 64) as usize;
        if i >= BITMAP_SIZE {
            return Err(BitmapError::InvalidPos);
        }
        Ok(i)
    }

    pub fn check(&self, pos: u32) -> Result<bool> {
        let i = self.word(pos)?;
        Ok(self.data[i] & (1 << (pos % 64)) > 0)
    }

    /// Position of the first clear bit, or [None] when full.
    pub fn next_usable(&self) -> Option<u32> {
        for (i, word) in self.data.iter().enumerate() {
            if *word != u64::MAX {
                return Some(i as u32 * 64 + word.trailing_ones());
            }
        }
        None
    }

    pub fn rest_usable(&self) -> u32 {
        self.data.iter().map(|w| w.count_zeros()).sum()
    }

    pub fn set_true(&mut self, pos: u32) -> Result<()> {
        let i = self.word(pos)?;
        self.data[i] |= 1 << (pos % 64);
        Ok(())
    }

    pub fn set_false(&mut self, pos: u32) -> Result<()> {
        let i = self.word(pos)?;
        self.data[i] &= !(1 << (pos % 64));
        Ok(())
    }
}

impl Serialize for BlockBitmap {
    fn serialize(&self) -> Vec<u8> {
        let mut v = Vec::<u8>::with_capacity(BITMAP_SIZE * 8);
        for i in 0..BITMAP_SIZE {
            v.extend_from_slice(&sedes::u64_to_u8arr(self.data[i]));
        }
        v
    }
}

impl Deserialize for BlockBitmap {
    fn deserialize(buf: &mut Vec<u8>) -> std::result::Result<Self, SedesError> {
        if buf.len() < BITMAP_SIZE * 8 {
            return Err(SedesError::DeserialBufferTooSmall)
        }
        let bytes = buf.as_slice();
        let mut me = Self { data: [0u64; BITMAP_SIZE] };
        for i in 0..BITMAP_SIZE {
            me.data[i] = sedes::u8arr_to_u64(&bytes[8*i..8*(i+1)]);
        }
        Ok(me)
    }
}

/// A bitmap spanning several consecutive disk blocks. Positions run
/// across the blocks in order, [BITS_PER_MAP] bits per block.
pub struct Bitmap {
    maps: Vec<BlockBitmap>,
}

impl Bitmap {
    fn get_pos(pos: u32) -> (u32, u32) {
        (pos / BITS_PER_MAP, pos % BITS_PER_MAP)
    }

    /// Serialized content of the `index`-th block of the bitmap,
    /// for writing that block back to disk after a change.
    pub fn get_serialized_map(&self, index: usize) -> Result<Vec<u8>> {
        match self.maps.get(index) {
            Some(m) => Ok(m.serialize()),
            None => Err(BitmapError::InvalidPos)
        }
    }

    pub fn check(&self, pos: u32) -> Result<bool> {
        let (map, pos) = Self::get_pos(pos);
        match self.maps.get(map as usize) {
            Some(b) => b.check(pos),
            None => Err(BitmapError::InvalidPos)
        }
    }

    pub fn next_usable(&self) -> Option<u32> {
        for (i, map) in self.maps.iter().enumerate() {
            if let Some(p) = map.next_usable() {
                return Some(i as u32 * BITS_PER_MAP + p);
            }
        }
        None
    }

    pub fn rest_usable(&self) -> u32 {
        self.maps.iter().map(|m| m.rest_usable()).sum()
    }

    pub fn set_true(&mut self, pos: u32) -> Result<()> {
        let (map, pos) = Self::get_pos(pos);
        match self.maps.get_mut(map as usize) {
            Some(b) => b.set_true(pos),
            None => Err(BitmapError::InvalidPos)
        }
    }

    pub fn set_false(&mut self, pos: u32) -> Result<()> {
        let (map, pos) = Self::get_pos(pos);
        match self.maps.get_mut(map as usize) {
            Some(b) => b.set_false(pos),
            None => Err(BitmapError::InvalidPos)
        }
    }
}

impl Deserialize for Bitmap {
    fn deserialize(buf: &mut Vec<u8>) -> result::Result<Self, SedesError> where Self: Sized {
        const BS: usize = BLOCK_SIZE as usize;
        if buf.len() % BS != 0 {
            buf.resize(buf.len() + BS - buf.len() % BS, 0);
        }
        let mut maps = Vec::<BlockBitmap>::new();
        for i in 0..(buf.len() / BS) {
            maps.push(BlockBitmap::deserialize(&mut buf[i * BS..(i+1) * BS].to_vec())?);
        }
        Ok(Self { maps })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty(blocks: usize) -> Bitmap {
        let mut buf = vec![0u8; blocks * BLOCK_SIZE as usize];
        Bitmap::deserialize(&mut buf).unwrap()
    }

    #[test]
    fn set_check_clear() {
        let mut b = empty(2);
        assert!(!b.check(100).unwrap());
        b.set_true(100).unwrap();
        assert!(b.check(100).unwrap());
        b.set_false(100).unwrap();
        assert!(!b.check(100).unwrap());
    }

    #[test]
    fn clearing_one_bit_keeps_the_rest() {
        let mut b = empty(1);
        for pos in [0, 1, 63, 64, 65] {
            b.set_true(pos).unwrap();
        }
        b.set_false(64).unwrap();
        assert!(b.check(0).unwrap());
        assert!(b.check(1).unwrap());
        assert!(b.check(63).unwrap());
        assert!(!b.check(64).unwrap());
        assert!(b.check(65).unwrap());
    }

    #[test]
    fn next_usable_skips_used_positions() {
        let mut b = empty(1);
        assert_eq!(b.next_usable(), Some(0));
        for pos in 0..70 {
            b.set_true(pos).unwrap();
        }
        assert_eq!(b.next_usable(), Some(70));
    }

    #[test]
    fn positions_span_multiple_blocks() {
        let mut b = empty(2);
        let pos = BITS_PER_MAP + 5;
        b.set_true(pos).unwrap();
        assert!(b.check(pos).unwrap());
        assert_eq!(b.rest_usable(), 2 * BITS_PER_MAP - 1);
    }

    #[test]
    fn out_of_range_position_is_an_error() {
        let mut b = empty(1);
        assert!(b.set_true(BITS_PER_MAP).is_err());
        assert!(b.check(BITS_PER_MAP).is_err());
    }
}
