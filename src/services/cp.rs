 /*
 * open SOURCE read-only and read it
 * if DEST is a directory
 *     DEST = DEST/<base name of SOURCE>
 * if DEST exists
 *     open write-only and overwrite
 * else
 *     create and write
 */
use getopts::Options;
use super::{Context, utils};
use crate::fs::{open_file, create_file, metadata, AccessMode};
use crate::fs::FsError;

const USAGE: &str = "Usage: cp [-v] <source> <dest>";

pub fn cp(ctx: Context, args: Vec<&str>) -> (Context, String) {
    if args.len() < 1 {
        return (ctx, String::from(USAGE));
    }

    let mut opts = Options::new();
    opts.optflag("v", "", "Enable verbose output");

    let matches = match opts.parse(&args) {
        Ok(m) => m,
        Err(f) => {
            return (ctx, f.to_string());
        }
    };

    if matches.free.len() != 2 {
        return (ctx, String::from(USAGE));
    }

    let verbose = matches.opt_present("v");

    let source = utils::convert_path_to_abs(&ctx.wd, &matches.free[0]);
    let mut dest = utils::convert_path_to_abs(&ctx.wd, &matches.free[1]);

    // read the source
    let mut src_fd = match open_file(&ctx.tx, &source, &ctx.user, AccessMode::ReadOnly) {
        Ok(fd) => fd,
        Err(e) => {
            let msg = match e {
                FsError::NotFileButDir => format!("cp: omitting directory '{}'\n", matches.free[0]),
                FsError::PermissionDenied => {
                    format!("cp: cannot open '{}' for reading: Permission denied\n", matches.free[0])
                },
                _ => format!("cp: cannot stat '{}': No such file or directory\n", matches.free[0]),
            };
            return (ctx, msg);
        }
    };
    let content = match src_fd.read() {
        Ok(v) => v,
        Err(_) => return (ctx, format!("cp: cannot read '{}'\n", matches.free[0])),
    };

    // copying into a directory keeps the source name
    if let Ok(m) = metadata(&ctx.tx, &dest) {
        if m.is_dir() {
            let name = String::from(utils::base_name(&source));
            dest = utils::convert_path_to_abs(&dest, &name);
        }
    }

    // overwrite or create the dest
    let mut dst_fd = match open_file(&ctx.tx, &dest, &ctx.user, AccessMode::WriteOnly) {
        Ok(fd) => fd,
        Err(FsError::NotFound) => {
            match create_file(&ctx.tx, &dest, &ctx.user) {
                Ok(fd) => fd,
                Err(FsError::PermissionDenied) => {
                    return (ctx, format!("cp: cannot create '{}': Permission denied\n", matches.free[1]))
                },
                Err(_) => return (ctx, format!("cp: cannot create '{}'\n", matches.free[1])),
            }
        },
        Err(FsError::PermissionDenied) => {
            return (ctx, format!("cp: cannot open '{}' for writing: Permission denied\n", matches.free[1]))
        },
        Err(_) => return (ctx, format!("cp: cannot write to '{}'\n", matches.free[1])),
    };
    if let Err(_) = dst_fd.write(&content) {
        return (ctx, format!("cp: cannot write to '{}'\n", matches.free[1]));
    }

    if verbose {
        return (ctx, format!("'{}' -> '{}'\n", matches.free[0], matches.free[1]));
    }
    (ctx, String::new())
}
