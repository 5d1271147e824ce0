// ====== ERROR ======

use std::{error, fmt, result};
use std::sync::mpsc::RecvError;
use super::FsError;

#[derive(Debug)]
pub enum DdError {
    SendErr,
    RecvErr(RecvError),
    FsErr(FsError),
}

impl error::Error for DdError {}

impl fmt::Display for DdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[FS] {:?}", &self)
    }
}

impl From<RecvError> for DdError {
    fn from(e: RecvError) -> Self { Self::RecvErr(e) }
}

impl From<FsError> for DdError {
    fn from(e: FsError) -> Self { Self::FsErr(e) }
}

type Result<T> = result::Result<T, DdError>;

// ====== DD ======

use crate::sedes::{self, Serialize, Deserialize, SedesError};
use super::{FsReq, FdTable};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};

/// Longest allowed file name, in bytes.
pub const NAME_LEN: usize = 27;
const ENTRY_SIZE: usize = 32;

/// Entry in a directory: the entry name and the inode address it
/// points at. Every directory carries `.` and `..` entries, so path
/// components resolve by plain lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub inode: u32,
    pub name: String,
}

impl Serialize for Entry {
    fn serialize(&self) -> Vec<u8> {
        let mut v = Vec::<u8>::with_capacity(ENTRY_SIZE);
        v.extend_from_slice(&sedes::u32_to_u8arr(self.inode));
        let name = self.name.as_bytes();
        let len = name.len().min(NAME_LEN);
        v.extend_from_slice(&name[..len]);
        v.resize(ENTRY_SIZE, 0);
        v
    }
}

impl Deserialize for Entry {
    fn deserialize(buf: &mut Vec<u8>) -> result::Result<Self, SedesError> {
        if buf.len() < ENTRY_SIZE {
            return Err(SedesError::DeserialBufferTooSmall);
        }
        let inode = sedes::u8arr_to_u32(&buf[0..4]);
        let name_bytes: Vec<u8> = buf[4..ENTRY_SIZE]
            .iter().copied().take_while(|b| *b != 0).collect();
        let name = String::from_utf8_lossy(&name_bytes).to_string();
        Ok(Self { inode, name })
    }
}

/// Directory descriptor, handed out by a successful directory open.
/// Opening a directory requires read permission on it, so holding a
/// [Dd] is proof the listing may be seen.
///
/// Dropping the descriptor releases its claim in the open-file table.
pub struct Dd {
    inode: u32,
    tx: Sender<FsReq>,
    table: Arc<Mutex<FdTable>>,
}

impl Dd {
    pub(super) fn new(inode: u32, tx: Sender<FsReq>, table: Arc<Mutex<FdTable>>) -> Self {
        Self { inode, tx, table }
    }

    /// Read the entries of this directory, `.` and `..` included.
    pub fn read(&mut self) -> Result<Vec<Entry>> {
        let (tx, rx) = mpsc::channel();
        self.tx.send(FsReq::ReadDir(tx, self.inode)).map_err(|_| DdError::SendErr)?;
        Ok(rx.recv()??)
    }
}

impl Drop for Dd {
    fn drop(&mut self) {
        let mut lock = super::mutex_lock(self.table.lock());
        lock.try_drop(self.inode);
    }
}

// ====== FN ======

use super::file;
use super::disk::Disk;
use super::inode::{self, Inode};

/// Parse the entry list stored as the content of a directory inode.
pub(super) fn read_entries(d: &mut Disk, ino: &Inode) -> result::Result<Vec<Entry>, FsError> {
    let content = file::read_content(d, ino)?;
    let mut v = Vec::<Entry>::with_capacity(content.len() / ENTRY_SIZE);
    for chunk in content.chunks_exact(ENTRY_SIZE) {
        v.push(Entry::deserialize(&mut chunk.to_vec())?);
    }
    Ok(v)
}

fn write_entries(
    d: &mut Disk,
    addr: u32,
    ino: &mut Inode,
    entries: &[Entry],
) -> result::Result<(), FsError> {
    let mut buf = Vec::<u8>::with_capacity(entries.len() * ENTRY_SIZE);
    for e in entries {
        buf.extend(e.serialize());
    }
    file::write_content(d, addr, ino, &buf)
}

/// Inode address of the entry called `name`, or [None].
pub(super) fn find_entry(
    d: &mut Disk,
    ino: &Inode,
    name: &str,
) -> result::Result<Option<u32>, FsError> {
    for e in read_entries(d, ino)? {
        if e.name == name {
            return Ok(Some(e.inode));
        }
    }
    Ok(None)
}

/// Write the initial `.` and `..` entries of a fresh directory.
pub(super) fn init_dir(
    d: &mut Disk,
    addr: u32,
    ino: &mut Inode,
    parent: u32,
) -> result::Result<(), FsError> {
    let entries = [
        Entry { inode: addr, name: String::from(".") },
        Entry { inode: parent, name: String::from("..") },
    ];
    write_entries(d, addr, ino, &entries)
}

/// Append an entry to the directory at `dir_addr`.
pub(super) fn dir_add_entry(
    d: &mut Disk,
    dir_addr: u32,
    entry_addr: u32,
    name: &str,
) -> result::Result<(), FsError> {
    let mut ino = inode::load_inode(d, dir_addr)?;
    let mut entries = read_entries(d, &ino)?;
    entries.push(Entry { inode: entry_addr, name: String::from(name) });
    write_entries(d, dir_addr, &mut ino, &entries)
}

/// Drop the entry pointing at `entry_addr` from the directory at
/// `dir_addr`. Removing an entry that is not there is not an error.
pub(super) fn dir_remove_entry(
    d: &mut Disk,
    dir_addr: u32,
    entry_addr: u32,
) -> result::Result<(), FsError> {
    let mut ino = inode::load_inode(d, dir_addr)?;
    let mut entries = read_entries(d, &ino)?;
    entries.retain(|e| e.inode != entry_addr || e.name == "." || e.name == "..");
    write_entries(d, dir_addr, &mut ino, &entries)
}

/// A directory is empty when nothing but `.` and `..` remains.
pub(super) fn is_empty(d: &mut Disk, ino: &Inode) -> result::Result<bool, FsError> {
    Ok(read_entries(d, ino)?.iter().all(|e| e.name == "." || e.name == ".."))
}

// ====== TEST ======

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_roundtrip() {
        let e = Entry { inode: 42, name: String::from("notes.txt") };
        let mut buf = e.serialize();
        assert_eq!(buf.len(), ENTRY_SIZE);
        assert_eq!(Entry::deserialize(&mut buf).unwrap(), e);
    }

    #[test]
    fn overlong_name_is_truncated_to_limit() {
        let e = Entry { inode: 7, name: "x".repeat(NAME_LEN + 10) };
        let back = Entry::deserialize(&mut e.serialize()).unwrap();
        assert_eq!(back.name.len(), NAME_LEN);
    }
}
