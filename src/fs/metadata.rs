// ====== ERROR =======

use std::{error, fmt, sync::mpsc};
use super::FsError;

#[derive(Debug)]
pub enum MetadataError {
    SendErr,
    RecvErr(mpsc::RecvError),
    FsErr(FsError),
}

impl error::Error for MetadataError {}

impl fmt::Display for MetadataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MetadataError: {:?}", self)
    }
}

impl From<mpsc::RecvError> for MetadataError {
    fn from(e: mpsc::RecvError) -> Self { Self::RecvErr(e) }
}

impl From<FsError> for MetadataError {
    fn from(e: FsError) -> Self { Self::FsErr(e) }
}

type Result<T> = std::result::Result<T, MetadataError>;

// ====== METADATA ======

use crate::logger;
use super::FsReq;
use super::access::{Perm, Principal, Rwx};
use super::inode;
use std::sync::mpsc::Sender;
use chrono::prelude::*;

/// A snapshot of one inode, plus enough plumbing to push changes
/// back. Reading the fields costs nothing; [Metadata::set_permission]
/// and [Metadata::update_timestamp] go through the file system and
/// are subject to its checks.
pub struct Metadata {
    addr: u32,
    inode: inode::Inode,
    tx: Sender<FsReq>,
}

impl Metadata {
    pub(super) fn new(addr: u32, inode: inode::Inode, tx: Sender<FsReq>) -> Self {
        Self { addr, inode, tx }
    }

    /// Return `true` if being a directory; `false` for being file.
    pub fn is_dir(&self) -> bool {
        self.inode.is_dir()
    }

    /// Return uid ([u8]) of file/directory owner.
    pub fn owner(&self) -> u8 {
        self.inode.uid
    }

    /// Return gid ([u8]) of the owning group.
    pub fn group(&self) -> u8 {
        self.inode.gid
    }

    /// Return file/directory size in bytes.
    pub fn size(&self) -> u32 {
        self.inode.size
    }

    /// The full permission record: owner and group ids plus the
    /// three permission triads.
    pub fn permission(&self) -> Perm {
        self.inode.perm()
    }

    /// Replace the permission triads, as `who`. Only the owner may do
    /// this; everyone else gets `PermissionDenied` no matter what the
    /// current triads grant.
    pub fn set_permission(
        &mut self,
        who: &Principal,
        owner: Rwx,
        group: Rwx,
        other: Rwx,
    ) -> Result<()> {
        let (tx, rx) = mpsc::channel();
        self.tx.send(FsReq::SetPermission(tx, self.addr, who.clone(), (owner, group, other)))
            .map_err(|_| MetadataError::SendErr)?;
        rx.recv()??;
        self.inode.set_perm(owner, group, other);
        logger::log(&format!("Update permission for inode {}.", self.addr));
        Ok(())
    }

    /// Return unit (month, date, hour, minute).
    ///
    /// Note: month starts from 0
    pub fn timestamp(&self) -> (u32, u32, u32, u32) {
        match DateTime::from_timestamp(self.inode.timestamp as i64, 0) {
            Some(dt) => (dt.month0(), dt.day(), dt.hour(), dt.minute()),
            None => (0, 0, 0, 0)
        }
    }

    /// Update to now, as `who`. Allowed for the owner and for anyone
    /// holding write permission on the inode.
    pub fn update_timestamp(&mut self, who: &Principal) -> Result<()> {
        let (tx, rx) = mpsc::channel();
        self.tx.send(FsReq::TouchInode(tx, self.addr, who.clone()))
            .map_err(|_| MetadataError::SendErr)?;
        rx.recv()??;
        self.inode.update_timestamp();
        logger::log(&format!("Update timestamp for inode {}.", self.addr));
        Ok(())
    }
}
