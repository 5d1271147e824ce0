// ====== ERROR ======

use std::{error, fmt, result};
use crate::sedes::SedesError;
use super::disk::DiskError;
use super::data::DataError;

#[derive(Debug)]
pub enum InodeError {
    NoUsableBlock,
    InvalidAddr,
    DataTooBig,
    DiskErr(DiskError),
    SedesErr(SedesError),
}

impl error::Error for InodeError {}

impl fmt::Display for InodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InodeError: {:?}", self)
    }
}

impl From<DiskError> for InodeError {
    fn from(e: DiskError) -> Self { Self::DiskErr(e) }
}

impl From<SedesError> for InodeError {
    fn from(e: SedesError) -> Self { Self::SedesErr(e) }
}

impl From<DataError> for InodeError {
    fn from(e: DataError) -> Self {
        match e {
            DataError::InsufficientUsableBlocks => Self::NoUsableBlock,
            DataError::InvalidAddr => Self::InvalidAddr,
            DataError::DiskErr(e) => Self::DiskErr(e),
            DataError::SedesErr(e) => Self::SedesErr(e),
        }
    }
}

type Result<T> = result::Result<T, InodeError>;

// ====== INODE ======

use crate::sedes::{self, Serialize, Deserialize};
use super::access::{Perm, Rwx};
use chrono::prelude::*;

pub const BITMAP_OFFSET: u32 = 1;
pub const INODE_OFFSET: u32 = BITMAP_OFFSET + 1;
const INODE_SIZE: usize = 64;
pub const INODE_COUNT: u32 = 4096;
pub const INODE_PER_BLOCK: u32 = super::disk::BLOCK_SIZE / INODE_SIZE as u32;
const DIRECT_COUNT: usize = 8;
const PTRS_PER_BLOCK: usize = super::disk::BLOCK_SIZE as usize / 4;
pub const MAX_BLOCKS: u32 =
    (DIRECT_COUNT + PTRS_PER_BLOCK + PTRS_PER_BLOCK * PTRS_PER_BLOCK) as u32;
pub const MAX_SIZE: u32 = super::disk::BLOCK_SIZE * MAX_BLOCKS;

/// Inode address of the root directory, fixed by formatting order.
pub const ROOT_INODE: u32 = 0;

// mode layout: the low nine bits are the classic rwxrwxrwx triads in
// octal order, the tenth bit marks a directory
pub const DIR_FLAG: u16 = 1 << 9;
pub const OWNER_RWX_FLAG: (u16, u16, u16) = (1 << 8, 1 << 7, 1 << 6);
pub const GROUP_RWX_FLAG: (u16, u16, u16) = (1 << 5, 1 << 4, 1 << 3);
pub const OTHER_RWX_FLAG: (u16, u16, u16) = (1 << 2, 1 << 1, 1);
const PERM_MASK: u16 = 0o777;

#[derive(Debug, Default, Clone, Copy)]
pub struct Inode {
    pub uid: u8,                // 1
    pub gid: u8,                // 1
    pub mode: u16,              // 2
    pub size: u32,              // 4
    pub timestamp: u32,         // 4
    pub blocks: [u32; 8],       // 32
    pub indirect_block: u32,    // 4
    pub double_block: u32,      // 4
    // acquire 52 of 64
}

impl Inode {
    /// A fresh inode owned by `owner:group`. Directories start with
    /// mode 755, regular files with mode 644.
    pub fn new(owner: u8, group: u8, is_dir: bool) -> Self {
        let mut inode = Self::default();
        inode.uid = owner;
        inode.gid = group;
        if is_dir {
            inode.mode = DIR_FLAG
                + OWNER_RWX_FLAG.0 + OWNER_RWX_FLAG.1 + OWNER_RWX_FLAG.2
                + GROUP_RWX_FLAG.0 + GROUP_RWX_FLAG.2
                + OTHER_RWX_FLAG.0 + OTHER_RWX_FLAG.2;
        } else {
            inode.mode = OWNER_RWX_FLAG.0 + OWNER_RWX_FLAG.1
                + GROUP_RWX_FLAG.0
                + OTHER_RWX_FLAG.0;
        }
        inode.update_timestamp();
        inode
    }

    pub fn is_dir(&self) -> bool {
        self.mode & DIR_FLAG > 0
    }

    /// The permission record of this inode, ready for an access check.
    pub fn perm(&self) -> Perm {
        Perm {
            uid: self.uid,
            gid: self.gid,
            owner: Rwx::new(
                self.mode & OWNER_RWX_FLAG.0 > 0,
                self.mode & OWNER_RWX_FLAG.1 > 0,
                self.mode & OWNER_RWX_FLAG.2 > 0,
            ),
            group: Rwx::new(
                self.mode & GROUP_RWX_FLAG.0 > 0,
                self.mode & GROUP_RWX_FLAG.1 > 0,
                self.mode & GROUP_RWX_FLAG.2 > 0,
            ),
            other: Rwx::new(
                self.mode & OTHER_RWX_FLAG.0 > 0,
                self.mode & OTHER_RWX_FLAG.1 > 0,
                self.mode & OTHER_RWX_FLAG.2 > 0,
            ),
        }
    }

    /// Replace the permission triads. The directory flag and all
    /// other non-permission bits are kept.
    pub fn set_perm(&mut self, owner: Rwx, group: Rwx, other: Rwx) {
        let mut mode = self.mode & !PERM_MASK;
        for (triad, flags) in [
            (owner, OWNER_RWX_FLAG),
            (group, GROUP_RWX_FLAG),
            (other, OTHER_RWX_FLAG),
        ] {
            if triad.read { mode |= flags.0 }
            if triad.write { mode |= flags.1 }
            if triad.execute { mode |= flags.2 }
        }
        self.mode = mode;
    }

    /// Update to now
    pub fn update_timestamp(&mut self) {
        let dt = Local::now();
        self.timestamp = dt.timestamp() as u32;
    }
}

impl Serialize for Inode {
    fn serialize(&self) -> Vec<u8> {
        let mut v = Vec::<u8>::with_capacity(INODE_SIZE);
        v.push(self.uid);
        v.push(self.gid);
        v.extend_from_slice(&sedes::u16_to_u8arr(self.mode));
        v.extend_from_slice(&sedes::u32_to_u8arr(self.size));
        v.extend_from_slice(&sedes::u32_to_u8arr(self.timestamp));
        for i in 0..DIRECT_COUNT {
            v.extend_from_slice(&sedes::u32_to_u8arr(self.blocks[i]));
        }
        v.extend_from_slice(&sedes::u32_to_u8arr(self.indirect_block));
        v.extend_from_slice(&sedes::u32_to_u8arr(self.double_block));
        v.resize(INODE_SIZE, 0);
        v
    }
}

impl Deserialize for Inode {
    fn deserialize(buf: &mut Vec<u8>) -> std::result::Result<Self, SedesError> {
        if buf.len() < INODE_SIZE {
            return Err(SedesError::DeserialBufferTooSmall);
        }
        let bytes = &buf[..];
        let mut me = Self::default();
        me.uid = bytes[0];
        me.gid = bytes[1];
        me.mode = sedes::u8arr_to_u16(&bytes[2..4]);
        me.size = sedes::u8arr_to_u32(&bytes[4..8]);
        me.timestamp = sedes::u8arr_to_u32(&bytes[8..12]);
        for i in 0..DIRECT_COUNT {
            me.blocks[i] = sedes::u8arr_to_u32(&bytes[12+4*i..12+4*(i+1)]);
        }
        me.indirect_block = sedes::u8arr_to_u32(&bytes[44..48]);
        me.double_block = sedes::u8arr_to_u32(&bytes[48..52]);
        Ok(me)
    }
}

// ====== FN ======

use super::{data, disk};
use super::disk::Disk;
use super::bitmap::BlockBitmap;

type Bitmap = BlockBitmap;

fn get_bitmap(d: &mut Disk) -> Result<Bitmap> {
    let mut buf = d.read_blocks(&[BITMAP_OFFSET])?;
    Ok(Bitmap::deserialize(&mut buf)?)
}

fn save_bitmap(d: &mut Disk, bitmap: &Bitmap) -> Result<()> {
    Ok(d.write_blocks(&[(BITMAP_OFFSET, bitmap.serialize())])?)
}

/// Allocate an inode address and store a fresh [Inode] there.
///
/// ## Error
///
/// - `NoUsableBlock`: the inode table is full
/// - `DiskErr`
pub fn alloc_inode(d: &mut Disk, owner: u8, group: u8, is_dir: bool) -> Result<(u32, Inode)> {
    let mut bitmap = get_bitmap(d)?;
    let addr = match bitmap.next_usable() {
        Some(p) if p < INODE_COUNT => p,
        _ => return Err(InodeError::NoUsableBlock)
    };
    if bitmap.set_true(addr).is_err() {
        return Err(InodeError::InvalidAddr);
    }
    let inode = Inode::new(owner, group, is_dir);
    save_bitmap(d, &bitmap)?;
    save_inode(d, addr, &inode)?;
    Ok((addr, inode))
}

/// ## Error
///
/// - `InvalidAddr`
/// - `DiskErr`
pub fn free_inode(d: &mut Disk, addr: u32) -> Result<()> {
    let mut bitmap = get_bitmap(d)?;
    if addr >= INODE_COUNT || bitmap.set_false(addr).is_err() {
        return Err(InodeError::InvalidAddr);
    }
    save_bitmap(d, &bitmap)?;
    Ok(())
}

/// Count of unallocated inode slots.
pub fn free_count(d: &mut Disk) -> Result<u32> {
    let bitmap = get_bitmap(d)?;
    let spare = super::bitmap::BITS_PER_MAP - INODE_COUNT;
    Ok(bitmap.rest_usable() - spare)
}

/// ## Error
///
/// - `InvalidAddr`
/// - `DiskErr`
pub fn load_inode(d: &mut Disk, addr: u32) -> Result<Inode> {
    if addr >= INODE_COUNT {
        return Err(InodeError::InvalidAddr);
    }
    let block = INODE_OFFSET + addr / INODE_PER_BLOCK;
    let pos = addr % INODE_PER_BLOCK;
    let buf = d.read_blocks(&[block])?;
    Ok(Inode::deserialize(&mut buf[
        pos as usize * INODE_SIZE
        ..(pos + 1) as usize * INODE_SIZE
    ].to_vec())?)
}

/// ## Error
///
/// - `InvalidAddr`
/// - `DiskErr`
pub fn save_inode(d: &mut Disk, addr: u32, inode: &Inode) -> Result<()> {
    if addr >= INODE_COUNT {
        return Err(InodeError::InvalidAddr);
    }
    let block = INODE_OFFSET + addr / INODE_PER_BLOCK;
    let pos = addr % INODE_PER_BLOCK;
    let mut buf = d.read_blocks(&[block])?;
    buf.splice(
        pos as usize * INODE_SIZE..(pos + 1) as usize * INODE_SIZE,
        inode.serialize()
    );
    d.write_blocks(&[(block, buf)])?;
    Ok(())
}

/// All data block addresses of `inode`, in content order: direct
/// pointers first, then the single indirect block, then the double
/// indirect tree. Pointer lists are zero-terminated.
///
/// ## Error
///
/// - `DiskErr`
pub fn get_blocks(d: &mut Disk, inode: &Inode) -> Result<Vec<u32>> {
    let mut v = Vec::<u32>::new();
    for addr in inode.blocks {
        if addr == 0 {
            return Ok(v)
        }
        v.push(addr);
    }

    if inode.indirect_block == 0 {
        return Ok(v)
    }
    let ptrs = read_ptr_block(d, inode.indirect_block)?;
    let full = ptrs.len() == PTRS_PER_BLOCK;
    v.extend(&ptrs);
    if !full || inode.double_block == 0 {
        return Ok(v)
    }

    for sub in read_ptr_block(d, inode.double_block)? {
        let ptrs = read_ptr_block(d, sub)?;
        let full = ptrs.len() == PTRS_PER_BLOCK;
        v.extend(&ptrs);
        if !full {
            break
        }
    }
    Ok(v)
}

/// Point `inode` at exactly `blocks`, growing or shrinking the
/// pointer structure as needed. Freed carrier blocks go back to the
/// data allocator; the caller still owns freeing the data blocks
/// themselves. The inode is modified but not saved.
///
/// ## Error
///
/// - `DataTooBig`
/// - `NoUsableBlock`
/// - `DiskErr`
pub fn set_blocks(d: &mut Disk, inode: &mut Inode, blocks: &[u32]) -> Result<()> {
    if blocks.len() > MAX_BLOCKS as usize {
        return Err(InodeError::DataTooBig);
    }
    for i in 0..DIRECT_COUNT {
        inode.blocks[i] = blocks.get(i).copied().unwrap_or(0);
    }
    let rest = if blocks.len() > DIRECT_COUNT { &blocks[DIRECT_COUNT..] } else { &[][..] };
    let (ind, dbl) = if rest.len() > PTRS_PER_BLOCK {
        rest.split_at(PTRS_PER_BLOCK)
    } else {
        (rest, &[][..])
    };

    // single indirect block
    if ind.is_empty() {
        if inode.indirect_block != 0 {
            data::free_blocks(d, &[inode.indirect_block])?;
            inode.indirect_block = 0;
        }
    } else {
        if inode.indirect_block == 0 {
            inode.indirect_block = alloc_one(d)?;
        }
        write_ptr_block(d, inode.indirect_block, ind)?;
    }

    // double indirect tree
    if dbl.is_empty() {
        if inode.double_block != 0 {
            let mut to_free = read_ptr_block(d, inode.double_block)?;
            to_free.push(inode.double_block);
            data::free_blocks(d, &to_free)?;
            inode.double_block = 0;
        }
    } else {
        let mut subs = if inode.double_block == 0 {
            inode.double_block = alloc_one(d)?;
            Vec::new()
        } else {
            read_ptr_block(d, inode.double_block)?
        };
        let chunks: Vec<&[u32]> = dbl.chunks(PTRS_PER_BLOCK).collect();
        while subs.len() < chunks.len() {
            subs.push(alloc_one(d)?);
        }
        if subs.len() > chunks.len() {
            let extra = subs.split_off(chunks.len());
            data::free_blocks(d, &extra)?;
        }
        for (sub, chunk) in subs.iter().zip(&chunks) {
            write_ptr_block(d, *sub, chunk)?;
        }
        write_ptr_block(d, inode.double_block, &subs)?;
    }
    Ok(())
}

fn alloc_one(d: &mut Disk) -> Result<u32> {
    let v = data::alloc_blocks(d, 1)?;
    v.first().copied().ok_or(InodeError::NoUsableBlock)
}

fn read_ptr_block(d: &mut Disk, addr: u32) -> Result<Vec<u32>> {
    let buf = d.read_blocks(&[addr])?;
    let mut v = Vec::<u32>::with_capacity(PTRS_PER_BLOCK);
    for i in 0..PTRS_PER_BLOCK {
        let ptr = sedes::u8arr_to_u32(&buf[i*4..(i+1)*4]);
        if ptr == 0 {
            break
        }
        v.push(ptr);
    }
    Ok(v)
}

fn write_ptr_block(d: &mut Disk, addr: u32, ptrs: &[u32]) -> Result<()> {
    let mut buf = Vec::<u8>::with_capacity(disk::BLOCK_SIZE as usize);
    for ptr in ptrs {
        buf.extend_from_slice(&sedes::u32_to_u8arr(*ptr));
    }
    buf.resize(disk::BLOCK_SIZE as usize, 0);
    Ok(d.write_blocks(&[(addr, buf)])?)
}

// ====== TEST ======

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::access;

    #[test]
    fn fresh_file_gets_mode_644() {
        let inode = Inode::new(3, 7, false);
        assert!(!inode.is_dir());
        let p = inode.perm();
        assert_eq!(p.uid, 3);
        assert_eq!(p.gid, 7);
        assert_eq!(p.owner, Rwx::new(true, true, false));
        assert_eq!(p.group, access::READ);
        assert_eq!(p.other, access::READ);
    }

    #[test]
    fn fresh_dir_gets_mode_755() {
        let inode = Inode::new(0, 0, true);
        assert!(inode.is_dir());
        let p = inode.perm();
        assert_eq!(p.owner, Rwx::new(true, true, true));
        assert_eq!(p.group, Rwx::new(true, false, true));
        assert_eq!(p.other, Rwx::new(true, false, true));
    }

    #[test]
    fn set_perm_keeps_dir_flag() {
        let mut inode = Inode::new(0, 0, true);
        inode.set_perm(access::READ, Rwx::new(false, false, false), Rwx::new(false, false, false));
        assert!(inode.is_dir());
        assert_eq!(inode.mode & PERM_MASK, 0o400);
    }

    #[test]
    fn serialized_inode_is_one_slot() {
        let inode = Inode::new(9, 2, false);
        assert_eq!(inode.serialize().len(), INODE_SIZE);
    }

    #[test]
    fn serialize_roundtrip() {
        let mut inode = Inode::new(5, 6, false);
        inode.size = 1234;
        inode.blocks[0] = 300;
        inode.blocks[7] = 307;
        inode.indirect_block = 400;
        inode.double_block = 500;
        let back = Inode::deserialize(&mut inode.serialize()).unwrap();
        assert_eq!(back.uid, 5);
        assert_eq!(back.gid, 6);
        assert_eq!(back.mode, inode.mode);
        assert_eq!(back.size, 1234);
        assert_eq!(back.blocks, inode.blocks);
        assert_eq!(back.indirect_block, 400);
        assert_eq!(back.double_block, 500);
    }
}
