pub mod access;
mod bitmap;
mod disk;

mod superblock;
mod inode;
mod data;

mod metadata;
mod file;
mod dir;

pub use access::{AccessMode, Decision, Denial, Perm, Principal, Rwx};
pub use dir::{Dd, DdError, Entry, NAME_LEN};
pub use file::{Fd, FdError};
pub use metadata::{Metadata, MetadataError};

// ====== ERROR ======

use std::{error, fmt, result};
use std::sync::mpsc::RecvError;

#[derive(Debug)]
pub enum FsError {
    /// Path is not absolute, or a component breaks the naming rules.
    InvalidPath,
    /// No entry under that name. Never produced by a permission
    /// failure; a denied request reports [FsError::PermissionDenied].
    NotFound,
    AlreadyExists,
    /// A directory was expected; a file was found.
    NotDirButFile,
    /// A file was expected; a directory was found.
    NotFileButDir,
    NotEmpty,
    /// The principal lacks a required permission bit.
    PermissionDenied,
    /// The inode is held by an open descriptor.
    Busy,
    DiskFull,
    TooBig,
    SendErr,
    RecvErr(RecvError),
    DiskErr(disk::DiskError),
    SedesErr(crate::sedes::SedesError),
}

impl error::Error for FsError {}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[FS] {:?}", &self)
    }
}

impl From<RecvError> for FsError {
    fn from(e: RecvError) -> Self {
        Self::RecvErr(e)
    }
}

impl From<disk::DiskError> for FsError {
    fn from(e: disk::DiskError) -> Self {
        Self::DiskErr(e)
    }
}

impl From<crate::sedes::SedesError> for FsError {
    fn from(e: crate::sedes::SedesError) -> Self {
        Self::SedesErr(e)
    }
}

impl From<inode::InodeError> for FsError {
    fn from(e: inode::InodeError) -> Self {
        match e {
            // a dangling block pointer behaves like a missing file
            inode::InodeError::InvalidAddr => Self::NotFound,
            inode::InodeError::NoUsableBlock => Self::DiskFull,
            inode::InodeError::DataTooBig => Self::TooBig,
            inode::InodeError::DiskErr(e) => Self::DiskErr(e),
            inode::InodeError::SedesErr(e) => Self::SedesErr(e),
        }
    }
}

impl From<data::DataError> for FsError {
    fn from(e: data::DataError) -> Self {
        match e {
            data::DataError::InsufficientUsableBlocks => Self::DiskFull,
            data::DataError::InvalidAddr => Self::DiskErr(disk::DiskError::InvalidAddr),
            data::DataError::DiskErr(e) => Self::DiskErr(e),
            data::DataError::SedesErr(e) => Self::SedesErr(e),
        }
    }
}

type Result<T> = result::Result<T, FsError>;

// ====== REQ & RES ======

/// Requests served by the file system thread. Every variant carries
/// a reply channel; requests that act on behalf of a user carry the
/// [Principal] the check runs against.
pub enum FsReq {
    // fs request

    /// `tx`: send back result
    ///
    /// `path`: file path
    ///
    /// `who`: requesting principal
    ///
    /// `mode`: requested access
    OpenFile(Sender<Result<file::Fd>>, String, Principal, AccessMode),

    /// `tx`: send back result
    ///
    /// `path`: file path
    ///
    /// `who`: creator (also owner) identity
    CreateFile(Sender<Result<file::Fd>>, String, Principal),

    /// `tx`: send back result
    ///
    /// `path`: file path
    ///
    /// `who`: requesting principal
    RemoveFile(Sender<Result<()>>, String, Principal),

    /// `tx`: send back result
    ///
    /// `path`: directory path
    ///
    /// `who`: requesting principal
    OpenDir(Sender<Result<dir::Dd>>, String, Principal),

    /// `tx`: send back result
    ///
    /// `path`: directory path
    ///
    /// `who`: creator (also owner) identity
    CreateDir(Sender<Result<dir::Dd>>, String, Principal),

    /// `tx`: send back result
    ///
    /// `path`: directory path
    ///
    /// `who`: requesting principal
    RemoveDir(Sender<Result<()>>, String, Principal),

    /// `tx`: send back result
    ///
    /// `path`: file or directory path
    Metadata(Sender<Result<Metadata>>, String),

    /// `tx`: send back result
    Statfs(Sender<Result<FsStat>>),

    // Fd and Dd request

    /// `tx`: send back result
    ///
    /// `file_inode`: inode virtual address of the file to read
    ReadFile(Sender<Result<Vec<u8>>>, u32),

    /// `tx`: send back result
    ///
    /// `file_inode`: inode virtual address of the file to write
    ///
    /// `data`: write content as u8 vector
    WriteFile(Sender<Result<()>>, u32, Vec<u8>),

    /// `tx`: send back result
    ///
    /// `dir_inode`: inode virtual address of the directory to read
    ReadDir(Sender<Result<Vec<dir::Entry>>>, u32),

    // Metadata request

    /// `tx`: send back result
    ///
    /// `inode`: inode virtual address
    ///
    /// `who`: requesting principal, must be the owner
    ///
    /// `triads`: new (owner, group, other) permission triads
    SetPermission(Sender<Result<()>>, u32, Principal, (Rwx, Rwx, Rwx)),

    /// `tx`: send back result
    ///
    /// `inode`: inode virtual address
    ///
    /// `who`: requesting principal, must own or hold write
    TouchInode(Sender<Result<()>>, u32, Principal),

    // lifecycle request

    /// `tx`: send back result
    ///
    /// Stop serving after the reply. The loop holds its own sender
    /// for minting descriptors, so the channel never disconnects on
    /// its own; this is the way to stop it. Requests sent afterwards
    /// fail with [FsError::SendErr].
    Unmount(Sender<Result<()>>),
}

/// Snapshot of disk usage, served by [statfs].
#[derive(Debug, Clone, Copy)]
pub struct FsStat {
    pub block_size: u32,
    pub block_count: u32,
    pub inode_count: u32,
    pub free_inodes: u32,
    pub data_blocks: u32,
    pub free_data_blocks: u32,
    pub max_file_size: u32,
}

// ====== FD TABLE ======

use std::collections::HashMap;

/// Reference counts of inodes held by live descriptors. Shared
/// between the fs thread (open, busy checks) and descriptor drops.
#[derive(Debug, Default)]
pub struct FdTable {
    opened: HashMap<u32, u32>,
}

impl FdTable {
    fn new() -> Self {
        Self::default()
    }

    fn open(&mut self, addr: u32) {
        *self.opened.entry(addr).or_insert(0) += 1;
    }

    fn is_open(&self, addr: u32) -> bool {
        self.opened.contains_key(&addr)
    }

    fn try_drop(&mut self, addr: u32) {
        if let Some(n) = self.opened.get_mut(&addr) {
            *n -= 1;
            if *n == 0 {
                self.opened.remove(&addr);
            }
        }
    }
}

// ====== FN ======

use crate::logger;
use std::sync::mpsc::{self, Sender, Receiver};
use std::sync::{Arc, Mutex, MutexGuard, LockResult};

fn mutex_lock<T>(result: LockResult<MutexGuard<'_, T>>) -> MutexGuard<'_, T>
    where T: fmt::Debug
{
    match result {
        Ok(l) => l,
        Err(poisoned) => {
            let l = poisoned.into_inner();
            logger::log(&format!("Recovered from poisoned: {l:?}"));
            l
        }
    }
}

/// Run the file system on the disk file at `disk_path` until every
/// [Sender] of `rx` is dropped. A disk holding no valid file system
/// is formatted first. One message on `started` reports whether
/// mounting worked; requests are served only after `Ok`.
///
/// `self_tx`: a sender to this same loop, cloned into descriptors.
pub fn start_fs(
    disk_path: &str,
    started: Sender<result::Result<(), String>>,
    self_tx: Sender<FsReq>,
    rx: Receiver<FsReq>,
) {
    let mut fs = match Fs::mount(disk_path, self_tx) {
        Ok(fs) => fs,
        Err(e) => {
            if started.send(Err(format!("{e}"))).is_err() {
                logger::elog("[ERR in FS] Failed to send start:err.");
            }
            return
        }
    };
    if started.send(Ok(())).is_err() {
        logger::elog("[ERR in FS] Failed to send start:ok.");
        return
    }

    for received in rx {
        match received {
            FsReq::OpenFile(tx, path, who, mode) => {
                reply(tx, fs.handle_open_file(&path, &who, mode));
            },
            FsReq::CreateFile(tx, path, who) => {
                reply(tx, fs.handle_create_file(&path, &who));
            },
            FsReq::RemoveFile(tx, path, who) => {
                reply(tx, fs.handle_remove_file(&path, &who));
            },
            FsReq::OpenDir(tx, path, who) => {
                reply(tx, fs.handle_open_dir(&path, &who));
            },
            FsReq::CreateDir(tx, path, who) => {
                reply(tx, fs.handle_create_dir(&path, &who));
            },
            FsReq::RemoveDir(tx, path, who) => {
                reply(tx, fs.handle_remove_dir(&path, &who));
            },
            FsReq::Metadata(tx, path) => {
                reply(tx, fs.handle_metadata(&path));
            },
            FsReq::Statfs(tx) => {
                reply(tx, fs.handle_statfs());
            },
            FsReq::ReadFile(tx, inode) => {
                reply(tx, fs.handle_read_file(inode));
            },
            FsReq::WriteFile(tx, inode, data) => {
                reply(tx, fs.handle_write_file(inode, &data));
            },
            FsReq::ReadDir(tx, inode) => {
                reply(tx, fs.handle_read_dir(inode));
            },
            FsReq::SetPermission(tx, inode, who, triads) => {
                reply(tx, fs.handle_set_permission(inode, &who, triads));
            },
            FsReq::TouchInode(tx, inode, who) => {
                reply(tx, fs.handle_touch_inode(inode, &who));
            },
            FsReq::Unmount(tx) => {
                reply(tx, Ok(()));
                break;
            },
        }
    }
    logger::log("[FS] Stopped.");
}

fn reply<T>(tx: Sender<Result<T>>, res: Result<T>) {
    if tx.send(res).is_err() {
        logger::elog("[ERR in FS] Failed to send back result.");
    }
}

/// Open a file as `who`. Return a file descriptor [file::Fd] bound to
/// the granted mode.
///
/// `fs_tx`: sender for sending request
pub fn open_file(fs_tx: &Sender<FsReq>, path: &str, who: &Principal, mode: AccessMode) -> Result<file::Fd> {
    let (tx, rx) = mpsc::channel();
    fs_tx.send(FsReq::OpenFile(tx, String::from(path), who.clone(), mode))
        .map_err(|_| FsError::SendErr)?;
    rx.recv()?
}

/// Create a file owned by `who`. Return a read-write descriptor for
/// the fresh file.
///
/// `fs_tx`: sender for sending request
pub fn create_file(fs_tx: &Sender<FsReq>, path: &str, who: &Principal) -> Result<file::Fd> {
    let (tx, rx) = mpsc::channel();
    fs_tx.send(FsReq::CreateFile(tx, String::from(path), who.clone()))
        .map_err(|_| FsError::SendErr)?;
    rx.recv()?
}

/// Remove a file as `who`.
///
/// `fs_tx`: sender for sending request
pub fn remove_file(fs_tx: &Sender<FsReq>, path: &str, who: &Principal) -> Result<()> {
    let (tx, rx) = mpsc::channel();
    fs_tx.send(FsReq::RemoveFile(tx, String::from(path), who.clone()))
        .map_err(|_| FsError::SendErr)?;
    rx.recv()?
}

/// Open a directory as `who`. Return a directory descriptor [dir::Dd].
///
/// `fs_tx`: sender for sending request
pub fn open_dir(fs_tx: &Sender<FsReq>, path: &str, who: &Principal) -> Result<dir::Dd> {
    let (tx, rx) = mpsc::channel();
    fs_tx.send(FsReq::OpenDir(tx, String::from(path), who.clone()))
        .map_err(|_| FsError::SendErr)?;
    rx.recv()?
}

/// Create a directory owned by `who`. Return a descriptor for it.
///
/// `fs_tx`: sender for sending request
pub fn create_dir(fs_tx: &Sender<FsReq>, path: &str, who: &Principal) -> Result<dir::Dd> {
    let (tx, rx) = mpsc::channel();
    fs_tx.send(FsReq::CreateDir(tx, String::from(path), who.clone()))
        .map_err(|_| FsError::SendErr)?;
    rx.recv()?
}

/// Remove an empty directory as `who`.
///
/// `fs_tx`: sender for sending request
pub fn remove_dir(fs_tx: &Sender<FsReq>, path: &str, who: &Principal) -> Result<()> {
    let (tx, rx) = mpsc::channel();
    fs_tx.send(FsReq::RemoveDir(tx, String::from(path), who.clone()))
        .map_err(|_| FsError::SendErr)?;
    rx.recv()?
}

/// Look up the [Metadata] of the file or directory at `path`.
/// Reading metadata needs no permission on the inode itself.
///
/// `fs_tx`: sender for sending request
pub fn metadata(fs_tx: &Sender<FsReq>, path: &str) -> Result<Metadata> {
    let (tx, rx) = mpsc::channel();
    fs_tx.send(FsReq::Metadata(tx, String::from(path)))
        .map_err(|_| FsError::SendErr)?;
    rx.recv()?
}

/// Disk usage counters.
///
/// `fs_tx`: sender for sending request
pub fn statfs(fs_tx: &Sender<FsReq>) -> Result<FsStat> {
    let (tx, rx) = mpsc::channel();
    fs_tx.send(FsReq::Statfs(tx)).map_err(|_| FsError::SendErr)?;
    rx.recv()?
}

/// Stop the fs loop once every queued request has been served.
///
/// `fs_tx`: sender for sending request
pub fn unmount(fs_tx: &Sender<FsReq>) -> Result<()> {
    let (tx, rx) = mpsc::channel();
    fs_tx.send(FsReq::Unmount(tx)).map_err(|_| FsError::SendErr)?;
    rx.recv()?
}

// ====== HANDLERS ======

use crate::sedes::{Serialize, Deserialize};

/// The mounted file system. Owned by the loop in [start_fs]; all
/// request handling is sequential, so no operation ever observes a
/// half-applied change.
struct Fs {
    disk: disk::Disk,
    tx: Sender<FsReq>,
    table: Arc<Mutex<FdTable>>,
}

impl Fs {
    fn mount(disk_path: &str, tx: Sender<FsReq>) -> Result<Self> {
        let mut me = Self {
            disk: disk::Disk::open(disk_path)?,
            tx,
            table: Arc::new(Mutex::new(FdTable::new())),
        };
        let mut buf = me.disk.read_blocks(&[0])?;
        let valid = match superblock::Superblock::deserialize(&mut buf) {
            Ok(sb) => sb.magic == superblock::MAGIC,
            Err(_) => false,
        };
        if !valid {
            logger::log("[FS] No file system on the disk file. Formatting.");
            me.format()?;
        }
        logger::log("[FS] Mounted disk.");
        Ok(me)
    }

    fn format(&mut self) -> Result<()> {
        let sb = superblock::Superblock::new();
        self.disk.write_blocks(&[(0, sb.serialize())])?;

        // zero both bitmaps
        let zeros = vec![0u8; disk::BLOCK_SIZE as usize];
        let mut writes = vec![(inode::BITMAP_OFFSET, zeros.clone())];
        for addr in data::BITMAP_OFFSET..data::DATA_OFFSET {
            writes.push((addr, zeros.clone()));
        }
        self.disk.write_blocks(&writes)?;

        // create dir: /
        let (root_addr, mut root) = inode::alloc_inode(&mut self.disk, 0, 0, true)?;
        dir::init_dir(&mut self.disk, root_addr, &mut root, root_addr)?;

        // create dir: /home, writable by everyone so each user can
        // claim a home directory under it
        let all = Rwx::new(true, true, true);
        let (home_addr, mut home) = inode::alloc_inode(&mut self.disk, 0, 0, true)?;
        home.set_perm(all, all, all);
        dir::init_dir(&mut self.disk, home_addr, &mut home, root_addr)?;
        dir::dir_add_entry(&mut self.disk, root_addr, home_addr, "home")?;

        logger::log(&format!("[FS] Formatted disk. Superblock: {sb:?}"));
        Ok(())
    }

    /// Resolve an absolute path to an inode address by walking the
    /// directory tree entry by entry.
    fn path_to_inode(&mut self, path: &str) -> Result<u32> {
        let parts = parse_path(path)?;
        let mut addr = inode::ROOT_INODE;
        for name in parts {
            let ino = inode::load_inode(&mut self.disk, addr)?;
            if !ino.is_dir() {
                return Err(FsError::NotDirButFile);
            }
            match dir::find_entry(&mut self.disk, &ino, name)? {
                Some(a) => addr = a,
                None => return Err(FsError::NotFound)
            }
        }
        Ok(addr)
    }

    fn load_dir(&mut self, path: &str) -> Result<(u32, inode::Inode)> {
        let addr = self.path_to_inode(path)?;
        let ino = inode::load_inode(&mut self.disk, addr)?;
        if !ino.is_dir() {
            return Err(FsError::NotDirButFile);
        }
        Ok((addr, ino))
    }

    fn handle_open_file(&mut self, path: &str, who: &Principal, mode: AccessMode) -> Result<file::Fd> {
        let addr = self.path_to_inode(path)?;
        let ino = inode::load_inode(&mut self.disk, addr)?;
        if ino.is_dir() {
            return Err(FsError::NotFileButDir);
        }
        match access::decide(&ino.perm(), who, mode) {
            Decision::Allow(granted) => {
                mutex_lock(self.table.lock()).open(addr);
                logger::log(&format!("[FS] user{} opened \"{path}\" ({granted:?})", who.uid));
                Ok(file::Fd::new(
                    addr,
                    granted,
                    Metadata::new(addr, ino, self.tx.clone()),
                    self.tx.clone(),
                    self.table.clone(),
                ))
            },
            Decision::Deny(_) => {
                logger::log(&format!("[FS] Denied user{} opening \"{path}\" ({mode:?})", who.uid));
                Err(FsError::PermissionDenied)
            }
        }
    }

    fn handle_create_file(&mut self, path: &str, who: &Principal) -> Result<file::Fd> {
        let (parent, name) = split_path(path)?;
        let (parent_addr, parent_ino) = self.load_dir(parent)?;
        if dir::find_entry(&mut self.disk, &parent_ino, name)?.is_some() {
            return Err(FsError::AlreadyExists);
        }
        if !access::permits(&parent_ino.perm(), who, access::WRITE) {
            logger::log(&format!("[FS] Denied user{} creating \"{path}\"", who.uid));
            return Err(FsError::PermissionDenied);
        }
        let (addr, ino) = inode::alloc_inode(&mut self.disk, who.uid, who.gid, false)?;
        dir::dir_add_entry(&mut self.disk, parent_addr, addr, name)?;
        mutex_lock(self.table.lock()).open(addr);
        logger::log(&format!("[FS] user{} created file \"{path}\"", who.uid));
        Ok(file::Fd::new(
            addr,
            AccessMode::ReadWrite,
            Metadata::new(addr, ino, self.tx.clone()),
            self.tx.clone(),
            self.table.clone(),
        ))
    }

    fn handle_remove_file(&mut self, path: &str, who: &Principal) -> Result<()> {
        let (parent, name) = split_path(path)?;
        let (parent_addr, parent_ino) = self.load_dir(parent)?;
        let addr = match dir::find_entry(&mut self.disk, &parent_ino, name)? {
            Some(a) => a,
            None => return Err(FsError::NotFound)
        };
        let mut ino = inode::load_inode(&mut self.disk, addr)?;
        if ino.is_dir() {
            return Err(FsError::NotFileButDir);
        }
        // unlinking changes the parent, not the file
        if !access::permits(&parent_ino.perm(), who, access::WRITE) {
            logger::log(&format!("[FS] Denied user{} removing \"{path}\"", who.uid));
            return Err(FsError::PermissionDenied);
        }
        if mutex_lock(self.table.lock()).is_open(addr) {
            return Err(FsError::Busy);
        }
        dir::dir_remove_entry(&mut self.disk, parent_addr, addr)?;
        file::free_content(&mut self.disk, &mut ino)?;
        inode::free_inode(&mut self.disk, addr)?;
        logger::log(&format!("[FS] user{} removed file \"{path}\"", who.uid));
        Ok(())
    }

    fn handle_open_dir(&mut self, path: &str, who: &Principal) -> Result<dir::Dd> {
        let (addr, ino) = self.load_dir(path)?;
        if !access::permits(&ino.perm(), who, access::READ) {
            logger::log(&format!("[FS] Denied user{} listing \"{path}\"", who.uid));
            return Err(FsError::PermissionDenied);
        }
        mutex_lock(self.table.lock()).open(addr);
        Ok(dir::Dd::new(addr, self.tx.clone(), self.table.clone()))
    }

    fn handle_create_dir(&mut self, path: &str, who: &Principal) -> Result<dir::Dd> {
        let (parent, name) = split_path(path)?;
        let (parent_addr, parent_ino) = self.load_dir(parent)?;
        if dir::find_entry(&mut self.disk, &parent_ino, name)?.is_some() {
            return Err(FsError::AlreadyExists);
        }
        if !access::permits(&parent_ino.perm(), who, access::WRITE) {
            logger::log(&format!("[FS] Denied user{} creating \"{path}\"", who.uid));
            return Err(FsError::PermissionDenied);
        }
        let (addr, mut ino) = inode::alloc_inode(&mut self.disk, who.uid, who.gid, true)?;
        dir::init_dir(&mut self.disk, addr, &mut ino, parent_addr)?;
        dir::dir_add_entry(&mut self.disk, parent_addr, addr, name)?;
        mutex_lock(self.table.lock()).open(addr);
        logger::log(&format!("[FS] user{} created dir \"{path}\"", who.uid));
        Ok(dir::Dd::new(addr, self.tx.clone(), self.table.clone()))
    }

    fn handle_remove_dir(&mut self, path: &str, who: &Principal) -> Result<()> {
        let (parent, name) = split_path(path)?;
        let (parent_addr, parent_ino) = self.load_dir(parent)?;
        let addr = match dir::find_entry(&mut self.disk, &parent_ino, name)? {
            Some(a) => a,
            None => return Err(FsError::NotFound)
        };
        let mut ino = inode::load_inode(&mut self.disk, addr)?;
        if !ino.is_dir() {
            return Err(FsError::NotDirButFile);
        }
        if !access::permits(&parent_ino.perm(), who, access::WRITE) {
            logger::log(&format!("[FS] Denied user{} removing \"{path}\"", who.uid));
            return Err(FsError::PermissionDenied);
        }
        if !dir::is_empty(&mut self.disk, &ino)? {
            return Err(FsError::NotEmpty);
        }
        if mutex_lock(self.table.lock()).is_open(addr) {
            return Err(FsError::Busy);
        }
        dir::dir_remove_entry(&mut self.disk, parent_addr, addr)?;
        file::free_content(&mut self.disk, &mut ino)?;
        inode::free_inode(&mut self.disk, addr)?;
        logger::log(&format!("[FS] user{} removed dir \"{path}\"", who.uid));
        Ok(())
    }

    fn handle_metadata(&mut self, path: &str) -> Result<Metadata> {
        let addr = self.path_to_inode(path)?;
        let ino = inode::load_inode(&mut self.disk, addr)?;
        logger::log(&format!("Get metadata of \"{path}\""));
        Ok(Metadata::new(addr, ino, self.tx.clone()))
    }

    fn handle_statfs(&mut self) -> Result<FsStat> {
        Ok(FsStat {
            block_size: disk::BLOCK_SIZE,
            block_count: disk::BLOCK_COUNT,
            inode_count: inode::INODE_COUNT,
            free_inodes: inode::free_count(&mut self.disk)?,
            data_blocks: disk::BLOCK_COUNT - data::DATA_OFFSET,
            free_data_blocks: data::free_count(&mut self.disk)?,
            max_file_size: inode::MAX_SIZE,
        })
    }

    fn handle_read_file(&mut self, addr: u32) -> Result<Vec<u8>> {
        let ino = inode::load_inode(&mut self.disk, addr)?;
        file::read_content(&mut self.disk, &ino)
    }

    fn handle_write_file(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        let mut ino = inode::load_inode(&mut self.disk, addr)?;
        file::write_content(&mut self.disk, addr, &mut ino, data)
    }

    fn handle_read_dir(&mut self, addr: u32) -> Result<Vec<dir::Entry>> {
        let ino = inode::load_inode(&mut self.disk, addr)?;
        dir::read_entries(&mut self.disk, &ino)
    }

    fn handle_set_permission(&mut self, addr: u32, who: &Principal, triads: (Rwx, Rwx, Rwx)) -> Result<()> {
        let mut ino = inode::load_inode(&mut self.disk, addr)?;
        if who.uid != ino.uid {
            logger::log(&format!("[FS] Denied user{} changing permission of inode {addr}", who.uid));
            return Err(FsError::PermissionDenied);
        }
        ino.set_perm(triads.0, triads.1, triads.2);
        inode::save_inode(&mut self.disk, addr, &ino)?;
        Ok(())
    }

    fn handle_touch_inode(&mut self, addr: u32, who: &Principal) -> Result<()> {
        let mut ino = inode::load_inode(&mut self.disk, addr)?;
        if who.uid != ino.uid && !access::permits(&ino.perm(), who, access::WRITE) {
            logger::log(&format!("[FS] Denied user{} touching inode {addr}", who.uid));
            return Err(FsError::PermissionDenied);
        }
        ino.update_timestamp();
        inode::save_inode(&mut self.disk, addr, &ino)?;
        Ok(())
    }
}

// ====== PATH ======

/// Break an absolute path into components. Empty components from
/// doubled or trailing slashes are skipped; `.` and `..` stay, since
/// every directory holds them as real entries.
fn parse_path(path: &str) -> Result<Vec<&str>> {
    if !path.starts_with('/') {
        return Err(FsError::InvalidPath);
    }
    let mut parts = Vec::new();
    for part in path.split('/') {
        if part.is_empty() {
            continue
        }
        if part.len() > dir::NAME_LEN {
            return Err(FsError::InvalidPath);
        }
        parts.push(part);
    }
    Ok(parts)
}

/// Split an absolute path into parent path and entry name, for
/// operations that change the parent directory. The root and the
/// dot entries cannot be created or removed, so they are rejected.
fn split_path(path: &str) -> Result<(&str, &str)> {
    if !path.starts_with('/') {
        return Err(FsError::InvalidPath);
    }
    let (parent, name) = match path.rfind('/') {
        Some(0) => ("/", &path[1..]),
        Some(i) => (&path[..i], &path[i + 1..]),
        None => return Err(FsError::InvalidPath)
    };
    if name.is_empty() || name.len() > dir::NAME_LEN || name == "." || name == ".." {
        return Err(FsError::InvalidPath);
    }
    Ok((parent, name))
}

// ====== TEST ======

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_path_splits_components() {
        assert_eq!(parse_path("/home/1/notes.txt").unwrap(), vec!["home", "1", "notes.txt"]);
        assert_eq!(parse_path("/").unwrap(), Vec::<&str>::new());
        assert_eq!(parse_path("//home//1/").unwrap(), vec!["home", "1"]);
    }

    #[test]
    fn parse_path_rejects_relative_and_overlong() {
        assert!(matches!(parse_path("home/1"), Err(FsError::InvalidPath)));
        let long = format!("/{}", "x".repeat(dir::NAME_LEN + 1));
        assert!(matches!(parse_path(&long), Err(FsError::InvalidPath)));
    }

    #[test]
    fn split_path_gives_parent_and_name() {
        assert_eq!(split_path("/a").unwrap(), ("/", "a"));
        assert_eq!(split_path("/home/1/f.txt").unwrap(), ("/home/1", "f.txt"));
    }

    #[test]
    fn split_path_rejects_root_and_dots() {
        assert!(split_path("/").is_err());
        assert!(split_path("/home/.").is_err());
        assert!(split_path("/home/..").is_err());
        assert!(split_path("relative").is_err());
    }
}
