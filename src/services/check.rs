 /*
 * walk the tree from "/" skipping "." and ".."
 * count directories, files and bytes on the way
 * compare with the allocation counters from statfs
 */
use super::{Context, utils};
use crate::fs::{metadata, open_dir, statfs};
use crate::fs::FsError;

#[derive(Default)]
struct Report {
    dirs: u32,
    files: u32,
    bytes: u64,
    skipped: u32,
    broken: u32,
}

fn walk(ctx: &Context, dir_path: &str, report: &mut Report) {
    let mut dd = match open_dir(&ctx.tx, dir_path, &ctx.user) {
        Ok(dd) => dd,
        Err(FsError::PermissionDenied) => {
            report.skipped += 1;
            return;
        },
        Err(_) => {
            report.broken += 1;
            return;
        }
    };
    let entries = match dd.read() {
        Ok(v) => v,
        Err(_) => {
            report.broken += 1;
            return;
        }
    };
    drop(dd);

    for entry in entries {
        if entry.name == "." || entry.name == ".." {
            continue;
        }
        let sub_path = utils::convert_path_to_abs(dir_path, &entry.name);
        match metadata(&ctx.tx, &sub_path) {
            Ok(m) => {
                if m.is_dir() {
                    report.dirs += 1;
                    walk(ctx, &sub_path, report);
                } else {
                    report.files += 1;
                    report.bytes += m.size() as u64;
                }
            },
            Err(_) => report.broken += 1,
        }
    }
}

pub fn check(ctx: Context, _: Vec<&str>) -> (Context, String) {
    let stat = match statfs(&ctx.tx) {
        Ok(s) => s,
        Err(e) => return (ctx, format!("check: cannot read file system info: {e}\n")),
    };

    let mut report = Report::default();
    report.dirs = 1; // "/"
    walk(&ctx, "/", &mut report);

    let used_inodes = stat.inode_count - stat.free_inodes;
    let reachable = report.dirs + report.files;

    let mut return_str = format!(
        "inodes in use: {}\n\
        reachable from /: {} ({} directories, {} files, {} bytes)\n\
        free inodes: {}\n\
        free data blocks: {} of {}\n",
        used_inodes, reachable, report.dirs, report.files, report.bytes,
        stat.free_inodes, stat.free_data_blocks, stat.data_blocks,
    );
    if report.skipped > 0 {
        return_str += &format!("skipped {} unreadable directories, counts may be low\n", report.skipped);
    }
    if report.broken > 0 {
        return_str += &format!("found {} broken entries\n", report.broken);
    } else if report.skipped == 0 && used_inodes != reachable {
        return_str += &format!(
            "warning: inode count mismatch: {} in use, {} reachable\n",
            used_inodes, reachable
        );
    }
    (ctx, return_str)
}
