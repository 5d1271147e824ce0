// ====== ERROR ======

use std::{error, fmt, result};
use std::sync::mpsc::RecvError;
use super::FsError;

#[derive(Debug)]
pub enum FdError {
    /// The descriptor was opened without read access.
    NotReadable,
    /// The descriptor was opened without write access.
    NotWritable,
    SendErr,
    RecvErr(RecvError),
    FsErr(FsError),
}

impl error::Error for FdError {}

impl fmt::Display for FdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[FS] {:?}", &self)
    }
}

impl From<RecvError> for FdError {
    fn from(e: RecvError) -> Self { Self::RecvErr(e) }
}

impl From<FsError> for FdError {
    fn from(e: FsError) -> Self { Self::FsErr(e) }
}

type Result<T> = result::Result<T, FdError>;

// ====== FD ======

use super::access::AccessMode;
use super::metadata::Metadata;
use super::{FsReq, FdTable};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};

/// File descriptor, handed out by a successful open or create.
///
/// The descriptor is bound to the access mode granted at open time:
/// [Fd::read] and [Fd::write] fail on a descriptor whose mode does
/// not cover them, no matter what the inode's permission bits say by
/// the time of the call.
///
/// Dropping the descriptor releases its claim in the open-file table.
pub struct Fd {
    inode: u32,
    mode: AccessMode,
    meta: Metadata,
    tx: Sender<FsReq>,
    table: Arc<Mutex<FdTable>>,
}

impl Fd {
    pub(super) fn new(
        inode: u32,
        mode: AccessMode,
        meta: Metadata,
        tx: Sender<FsReq>,
        table: Arc<Mutex<FdTable>>,
    ) -> Self {
        Self { inode, mode, meta, tx, table }
    }

    /// The access mode this descriptor was granted.
    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    /// Return a [Metadata] wrapping the inode of the file.
    pub fn metadata(&mut self) -> &mut Metadata {
        &mut self.meta
    }

    /// Read the whole file content.
    ///
    /// ## Error
    ///
    /// - `NotReadable`: opened write-only
    pub fn read(&mut self) -> Result<Vec<u8>> {
        if !self.mode.readable() {
            return Err(FdError::NotReadable);
        }
        let (tx, rx) = mpsc::channel();
        self.tx.send(FsReq::ReadFile(tx, self.inode)).map_err(|_| FdError::SendErr)?;
        Ok(rx.recv()??)
    }

    /// Replace the whole file content with `data`.
    ///
    /// ## Error
    ///
    /// - `NotWritable`: opened read-only
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        if !self.mode.writable() {
            return Err(FdError::NotWritable);
        }
        let (tx, rx) = mpsc::channel();
        self.tx.send(FsReq::WriteFile(tx, self.inode, data.to_vec()))
            .map_err(|_| FdError::SendErr)?;
        Ok(rx.recv()??)
    }
}

impl Drop for Fd {
    fn drop(&mut self) {
        let mut lock = super::mutex_lock(self.table.lock());
        lock.try_drop(self.inode);
    }
}

// ====== FN ======

use super::disk::{Disk, BLOCK_SIZE};
use super::{data, inode};
use super::inode::Inode;

/// Content of `inode`, truncated to its recorded size.
pub(super) fn read_content(d: &mut Disk, ino: &Inode) -> result::Result<Vec<u8>, FsError> {
    let blocks = inode::get_blocks(d, ino)?;
    let mut buf = d.read_blocks(&blocks)?;
    buf.truncate(ino.size as usize);
    Ok(buf)
}

/// Replace the content of the inode at `addr` with `data`, allocating
/// or freeing data blocks to fit, and save the inode.
pub(super) fn write_content(
    d: &mut Disk,
    addr: u32,
    ino: &mut Inode,
    data: &[u8],
) -> result::Result<(), FsError> {
    if data.len() > inode::MAX_SIZE as usize {
        return Err(FsError::TooBig);
    }
    let mut blocks = inode::get_blocks(d, ino)?;
    let need = (data.len() + BLOCK_SIZE as usize - 1) / BLOCK_SIZE as usize;
    if need > blocks.len() {
        let grow = (need - blocks.len()) as u32;
        blocks.extend(data::alloc_blocks(d, grow)?);
    } else if need < blocks.len() {
        let extra = blocks.split_off(need);
        data::free_blocks(d, &extra)?;
    }

    let mut writes = Vec::<(u32, Vec<u8>)>::with_capacity(need);
    for (i, chunk) in data.chunks(BLOCK_SIZE as usize).enumerate() {
        writes.push((blocks[i], chunk.to_vec()));
    }
    d.write_blocks(&writes)?;

    inode::set_blocks(d, ino, &blocks)?;
    ino.size = data.len() as u32;
    ino.update_timestamp();
    inode::save_inode(d, addr, ino)?;
    Ok(())
}

/// Free every data block of `ino`, carrier blocks included. The inode
/// itself stays allocated; the caller decides its fate.
pub(super) fn free_content(d: &mut Disk, ino: &mut Inode) -> result::Result<(), FsError> {
    let blocks = inode::get_blocks(d, ino)?;
    data::free_blocks(d, &blocks)?;
    inode::set_blocks(d, ino, &[])?;
    ino.size = 0;
    Ok(())
}
