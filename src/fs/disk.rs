// ====== ERROR ======

use std::{error, fmt, result};

#[derive(Debug)]
pub enum DiskError {
    InvalidAddr,
    IoErr(io::Error),
}

impl error::Error for DiskError {}

impl fmt::Display for DiskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DiskError: {:?}", self)
    }
}

impl From<io::Error> for DiskError {
    fn from(e: io::Error) -> Self { Self::IoErr(e) }
}

type Result<T> = result::Result<T, DiskError>;

// ====== DISK ======

use crate::logger;

use std::fs::{self, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write, Read};

pub const DISK_SIZE: u32 = 128 * 1024 * 1024;
pub const BLOCK_SIZE: u32 = 1024;
pub const BLOCK_COUNT: u32 = DISK_SIZE / BLOCK_SIZE;

/// A block device simulated on one host file. All addresses are in
/// blocks of [BLOCK_SIZE] bytes, from 0 to [BLOCK_COUNT].
///
/// The struct owns the open file handle; nothing here is global, so
/// two instances on two paths are fully independent.
#[derive(Debug)]
pub struct Disk {
    file: fs::File,
}

impl Disk {
    /// Open the disk file at `path`, creating it as a sparse file of
    /// [DISK_SIZE] bytes when missing. A file that is too small to be
    /// a disk image is removed and recreated from scratch.
    ///
    /// Opening performs no formatting. The caller decides whether the
    /// content is a valid file system by inspecting the superblock.
    pub fn open(path: &str) -> Result<Self> {
        match fs::metadata(path) {
            Ok(meta) => {
                if meta.len() < DISK_SIZE as u64 {
                    logger::log("[FS] Insufficient disk file size. Remove original file.");
                    fs::remove_file(path)?;
                }
            },
            Err(e) => match e.kind() {
                io::ErrorKind::NotFound => logger::log("[FS] Disk file not found."),
                _ => return Err(DiskError::IoErr(e)),
            }
        }
        let file = OpenOptions::new()
            .read(true).write(true)
            .create(true).truncate(false)
            .open(path)?;
        file.set_len(DISK_SIZE as u64)?;
        Ok(Self { file })
    }

    /// Read whole blocks. Returns the concatenated content, exactly
    /// [BLOCK_SIZE] bytes per requested address, in request order.
    ///
    /// ## Error
    ///
    /// - `InvalidAddr`: some address is beyond [BLOCK_COUNT]
    /// - `IoErr`
    pub fn read_blocks(&mut self, addrs: &[u32]) -> Result<Vec<u8>> {
        let mut v = Vec::<u8>::with_capacity(addrs.len() * BLOCK_SIZE as usize);
        for addr in addrs {
            if *addr >= BLOCK_COUNT {
                return Err(DiskError::InvalidAddr);
            }
            let mut buf = [0u8; BLOCK_SIZE as usize];
            self.file.seek(SeekFrom::Start(*addr as u64 * BLOCK_SIZE as u64))?;
            self.file.read_exact(&mut buf)?;
            v.extend_from_slice(&buf);
        }
        Ok(v)
    }

    /// Write whole blocks, one `(address, content)` pair at a time.
    /// Content shorter than a block is zero-padded to [BLOCK_SIZE];
    /// longer content is truncated to the block.
    ///
    /// ## Error
    ///
    /// - `InvalidAddr`: some address is beyond [BLOCK_COUNT]
    /// - `IoErr`
    pub fn write_blocks(&mut self, data: &[(u32, Vec<u8>)]) -> Result<()> {
        for (addr, _) in data {
            if *addr >= BLOCK_COUNT {
                return Err(DiskError::InvalidAddr);
            }
        }
        for (addr, buf) in data {
            let mut block = [0u8; BLOCK_SIZE as usize];
            let len = buf.len().min(BLOCK_SIZE as usize);
            block[..len].copy_from_slice(&buf[..len]);
            self.file.seek(SeekFrom::Start(*addr as u64 * BLOCK_SIZE as u64))?;
            self.file.write_all(&block)?;
        }
        self.file.flush()?;
        Ok(())
    }
}
