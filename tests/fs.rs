use simfs::fs::{self, AccessMode, FdError, FsError, Principal, Rwx};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};
use tempfile::TempDir;

// spawn a file system thread on a fresh disk file under `dir`
fn boot(dir: &TempDir) -> (Sender<fs::FsReq>, JoinHandle<()>) {
    let disk_path = String::from(dir.path().join("the_disk").to_str().unwrap());
    let (fs_tx, fs_rx) = mpsc::channel();
    let (started_tx, started_rx) = mpsc::channel();
    let tx_c = fs_tx.clone();
    let handle = thread::spawn(move || fs::start_fs(&disk_path, started_tx, tx_c, fs_rx));
    started_rx.recv().unwrap().unwrap();
    (fs_tx, handle)
}

fn read_only() -> (Rwx, Rwx, Rwx) {
    let r = Rwx::new(true, false, false);
    (r, r, r)
}

#[test]
fn readonly_file_allows_only_reading() {
    let dir = TempDir::new().unwrap();
    let (tx, _fs) = boot(&dir);
    let owner = Principal::new(1);

    let mut fd = fs::create_file(&tx, "/home/notes.txt", &owner).unwrap();
    fd.write(b"readonly content").unwrap();
    let (o, g, t) = read_only();
    fd.metadata().set_permission(&owner, o, g, t).unwrap();
    drop(fd);

    let mut fd = fs::open_file(&tx, "/home/notes.txt", &owner, AccessMode::ReadOnly).unwrap();
    assert_eq!(fd.read().unwrap(), b"readonly content");
    drop(fd);

    assert!(matches!(
        fs::open_file(&tx, "/home/notes.txt", &owner, AccessMode::WriteOnly),
        Err(FsError::PermissionDenied)
    ));
    assert!(matches!(
        fs::open_file(&tx, "/home/notes.txt", &owner, AccessMode::ReadWrite),
        Err(FsError::PermissionDenied)
    ));
}

#[test]
fn owner_is_held_to_the_owner_triad() {
    let dir = TempDir::new().unwrap();
    let (tx, _fs) = boot(&dir);
    // owner r--, group rw-: the owner cannot use the group's write bit
    let owner = Principal { uid: 1, gid: 10, groups: Vec::new() };

    let mut fd = fs::create_file(&tx, "/home/shadow.txt", &owner).unwrap();
    fd.metadata().set_permission(
        &owner,
        Rwx::new(true, false, false),
        Rwx::new(true, true, false),
        Rwx::new(false, false, false),
    ).unwrap();
    drop(fd);

    assert!(fs::open_file(&tx, "/home/shadow.txt", &owner, AccessMode::ReadOnly).is_ok());
    assert!(matches!(
        fs::open_file(&tx, "/home/shadow.txt", &owner, AccessMode::WriteOnly),
        Err(FsError::PermissionDenied)
    ));
}

#[test]
fn group_member_follows_the_group_triad() {
    let dir = TempDir::new().unwrap();
    let (tx, _fs) = boot(&dir);
    let owner = Principal { uid: 1, gid: 10, groups: Vec::new() };
    let member = Principal { uid: 2, gid: 10, groups: Vec::new() };

    let mut fd = fs::create_file(&tx, "/home/shared.txt", &owner).unwrap();
    fd.write(b"for the group").unwrap();
    fd.metadata().set_permission(
        &owner,
        Rwx::new(true, true, false),
        Rwx::new(true, false, false),
        Rwx::new(false, false, false),
    ).unwrap();
    drop(fd);

    // rw- r-- ---: a member may read but not write
    let mut fd = fs::open_file(&tx, "/home/shared.txt", &member, AccessMode::ReadOnly).unwrap();
    assert_eq!(fd.read().unwrap(), b"for the group");
    drop(fd);
    assert!(matches!(
        fs::open_file(&tx, "/home/shared.txt", &member, AccessMode::WriteOnly),
        Err(FsError::PermissionDenied)
    ));

    // supplementary membership counts the same
    let tagalong = Principal { uid: 3, gid: 30, groups: vec![10] };
    assert!(fs::open_file(&tx, "/home/shared.txt", &tagalong, AccessMode::ReadOnly).is_ok());
}

#[test]
fn stranger_follows_the_other_triad() {
    let dir = TempDir::new().unwrap();
    let (tx, _fs) = boot(&dir);
    let owner = Principal { uid: 1, gid: 10, groups: Vec::new() };
    let stranger = Principal { uid: 9, gid: 99, groups: Vec::new() };

    let mut fd = fs::create_file(&tx, "/home/private.txt", &owner).unwrap();
    fd.metadata().set_permission(
        &owner,
        Rwx::new(true, true, false),
        Rwx::new(true, false, false),
        Rwx::new(false, false, false),
    ).unwrap();
    drop(fd);

    // lookup succeeds and open does not: a denial is not "not found"
    assert!(fs::metadata(&tx, "/home/private.txt").is_ok());
    assert!(matches!(
        fs::open_file(&tx, "/home/private.txt", &stranger, AccessMode::ReadOnly),
        Err(FsError::PermissionDenied)
    ));
}

#[test]
fn missing_file_is_not_found() {
    let dir = TempDir::new().unwrap();
    let (tx, _fs) = boot(&dir);
    let user = Principal::new(1);

    assert!(matches!(
        fs::open_file(&tx, "/home/ghost.txt", &user, AccessMode::ReadOnly),
        Err(FsError::NotFound)
    ));
    assert!(matches!(
        fs::metadata(&tx, "/home/ghost.txt"),
        Err(FsError::NotFound)
    ));
}

#[test]
fn zero_mode_denies_everyone_until_chmod() {
    let dir = TempDir::new().unwrap();
    let (tx, _fs) = boot(&dir);
    let owner = Principal::new(1);
    let none = Rwx::new(false, false, false);

    let mut fd = fs::create_file(&tx, "/home/locked.txt", &owner).unwrap();
    fd.metadata().set_permission(&owner, none, none, none).unwrap();
    drop(fd);

    assert!(matches!(
        fs::open_file(&tx, "/home/locked.txt", &owner, AccessMode::ReadOnly),
        Err(FsError::PermissionDenied)
    ));

    // ownership is not a permission bit, so the owner may still chmod
    let mut m = fs::metadata(&tx, "/home/locked.txt").unwrap();
    m.set_permission(
        &owner,
        Rwx::new(true, true, false),
        Rwx::new(true, false, false),
        Rwx::new(true, false, false),
    ).unwrap();
    assert!(fs::open_file(&tx, "/home/locked.txt", &owner, AccessMode::ReadWrite).is_ok());
}

#[test]
fn descriptor_mode_gates_read_and_write() {
    let dir = TempDir::new().unwrap();
    let (tx, _fs) = boot(&dir);
    let owner = Principal::new(1);

    let mut fd = fs::create_file(&tx, "/home/gated.txt", &owner).unwrap();
    fd.write(b"gated").unwrap();
    drop(fd);

    let mut fd = fs::open_file(&tx, "/home/gated.txt", &owner, AccessMode::ReadOnly).unwrap();
    assert!(matches!(fd.write(b"nope"), Err(FdError::NotWritable)));
    assert_eq!(fd.read().unwrap(), b"gated");
    drop(fd);

    let mut fd = fs::open_file(&tx, "/home/gated.txt", &owner, AccessMode::WriteOnly).unwrap();
    assert!(matches!(fd.read(), Err(FdError::NotReadable)));
    fd.write(b"rewritten").unwrap();
    drop(fd);

    let mut fd = fs::open_file(&tx, "/home/gated.txt", &owner, AccessMode::ReadWrite).unwrap();
    assert_eq!(fd.read().unwrap(), b"rewritten");
}

#[test]
fn files_and_directories_do_not_mix() {
    let dir = TempDir::new().unwrap();
    let (tx, _fs) = boot(&dir);
    let user = Principal::new(1);

    fs::create_file(&tx, "/home/plain.txt", &user).unwrap();
    assert!(matches!(
        fs::open_file(&tx, "/home", &user, AccessMode::ReadOnly),
        Err(FsError::NotFileButDir)
    ));
    assert!(matches!(
        fs::open_dir(&tx, "/home/plain.txt", &user),
        Err(FsError::NotDirButFile)
    ));
}

#[test]
fn open_descriptor_blocks_unlink() {
    let dir = TempDir::new().unwrap();
    let (tx, _fs) = boot(&dir);
    let user = Principal::new(1);

    let fd = fs::create_file(&tx, "/home/busy.txt", &user).unwrap();
    assert!(matches!(
        fs::remove_file(&tx, "/home/busy.txt", &user),
        Err(FsError::Busy)
    ));
    drop(fd);
    fs::remove_file(&tx, "/home/busy.txt", &user).unwrap();
    assert!(matches!(
        fs::open_file(&tx, "/home/busy.txt", &user, AccessMode::ReadOnly),
        Err(FsError::NotFound)
    ));
}

#[test]
fn rmdir_wants_an_empty_directory() {
    let dir = TempDir::new().unwrap();
    let (tx, _fs) = boot(&dir);
    let user = Principal::new(1);

    fs::create_dir(&tx, "/home/d", &user).unwrap();
    fs::create_file(&tx, "/home/d/inner.txt", &user).unwrap();

    assert!(matches!(
        fs::remove_dir(&tx, "/home/d", &user),
        Err(FsError::NotEmpty)
    ));
    fs::remove_file(&tx, "/home/d/inner.txt", &user).unwrap();
    fs::remove_dir(&tx, "/home/d", &user).unwrap();
    assert!(matches!(fs::metadata(&tx, "/home/d"), Err(FsError::NotFound)));
}

#[test]
fn parent_write_bit_controls_create_and_remove() {
    let dir = TempDir::new().unwrap();
    let (tx, _fs) = boot(&dir);
    let owner = Principal::new(1);
    let other = Principal::new(2);

    fs::create_dir(&tx, "/home/1", &owner).unwrap();
    fs::create_file(&tx, "/home/1/mine.txt", &owner).unwrap();

    // /home/1 is 0755, so user2 cannot change it
    assert!(matches!(
        fs::create_file(&tx, "/home/1/theirs.txt", &other),
        Err(FsError::PermissionDenied)
    ));
    assert!(matches!(
        fs::remove_file(&tx, "/home/1/mine.txt", &other),
        Err(FsError::PermissionDenied)
    ));

    fs::create_file(&tx, "/home/1/more.txt", &owner).unwrap();
    fs::remove_file(&tx, "/home/1/more.txt", &owner).unwrap();
}

#[test]
fn directory_read_bit_gates_listing() {
    let dir = TempDir::new().unwrap();
    let (tx, _fs) = boot(&dir);
    let owner = Principal::new(1);
    let other = Principal::new(2);

    fs::create_dir(&tx, "/home/1", &owner).unwrap();
    fs::create_file(&tx, "/home/1/a.txt", &owner).unwrap();

    // 0755 lets anyone list
    let mut dd = fs::open_dir(&tx, "/home/1", &other).unwrap();
    let names: Vec<String> = dd.read().unwrap().into_iter().map(|e| e.name).collect();
    assert!(names.contains(&String::from(".")));
    assert!(names.contains(&String::from("..")));
    assert!(names.contains(&String::from("a.txt")));
    drop(dd);

    // drop group and other read, keep execute
    let mut m = fs::metadata(&tx, "/home/1").unwrap();
    m.set_permission(
        &owner,
        Rwx::new(true, true, true),
        Rwx::new(false, false, true),
        Rwx::new(false, false, true),
    ).unwrap();
    assert!(matches!(
        fs::open_dir(&tx, "/home/1", &other),
        Err(FsError::PermissionDenied)
    ));
    assert!(fs::open_dir(&tx, "/home/1", &owner).is_ok());
}

#[test]
fn large_content_spills_into_indirect_blocks() {
    let dir = TempDir::new().unwrap();
    let (tx, _fs) = boot(&dir);
    let user = Principal::new(1);

    // 300KB takes the single indirect and double indirect pointers
    let content: Vec<u8> = (0..300 * 1024).map(|i| (i % 251) as u8).collect();
    let mut fd = fs::create_file(&tx, "/home/big.bin", &user).unwrap();
    fd.write(&content).unwrap();
    drop(fd);

    let mut fd = fs::open_file(&tx, "/home/big.bin", &user, AccessMode::ReadOnly).unwrap();
    assert_eq!(fd.read().unwrap(), content);
    drop(fd);

    // shrink back and check the size follows
    let mut fd = fs::open_file(&tx, "/home/big.bin", &user, AccessMode::ReadWrite).unwrap();
    fd.write(b"small again").unwrap();
    drop(fd);
    assert_eq!(fs::metadata(&tx, "/home/big.bin").unwrap().size(), 11);
}

#[test]
fn contents_survive_remount() {
    let dir = TempDir::new().unwrap();
    let owner = Principal::new(1);
    {
        let (tx, fs_thread) = boot(&dir);
        let mut fd = fs::create_file(&tx, "/home/keep.txt", &owner).unwrap();
        fd.write(b"kept across mounts").unwrap();
        let (o, g, t) = read_only();
        fd.metadata().set_permission(&owner, o, g, t).unwrap();
        drop(fd);
        fs::unmount(&tx).unwrap();
        fs_thread.join().unwrap();
    }

    let (tx, _fs) = boot(&dir);
    let mut fd = fs::open_file(&tx, "/home/keep.txt", &owner, AccessMode::ReadOnly).unwrap();
    assert_eq!(fd.read().unwrap(), b"kept across mounts");
    drop(fd);
    assert!(matches!(
        fs::open_file(&tx, "/home/keep.txt", &owner, AccessMode::ReadWrite),
        Err(FsError::PermissionDenied)
    ));
}

#[test]
fn removing_a_file_restores_the_counters() {
    let dir = TempDir::new().unwrap();
    let (tx, _fs) = boot(&dir);
    let user = Principal::new(1);

    let before = fs::statfs(&tx).unwrap();
    let mut fd = fs::create_file(&tx, "/home/tmp.bin", &user).unwrap();
    fd.write(&vec![7u8; 10 * 1024]).unwrap();
    drop(fd);

    let during = fs::statfs(&tx).unwrap();
    assert!(during.free_inodes < before.free_inodes);
    assert!(during.free_data_blocks < before.free_data_blocks);

    fs::remove_file(&tx, "/home/tmp.bin", &user).unwrap();
    let after = fs::statfs(&tx).unwrap();
    assert_eq!(after.free_inodes, before.free_inodes);
    assert_eq!(after.free_data_blocks, before.free_data_blocks);
}
