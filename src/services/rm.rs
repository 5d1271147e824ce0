 /*
 * iterate path in paths:
 *     if path doesn't exist
 *         return_str += err message
 *         continue
 *     if path is a file
 *         remove_file(path)
 *     else
 *         if -r is not specified
 *             return_str += err message
 *             continue
 *         remove_dir_recursively(path)
 *
 * ---fn remove_dir_recursively(dir_path) ->
 *     iterate sub_entry in path Dd
 *         if sub_entry is ".." or "."
 *             continue
 *         if sub_path is a file
 *             remove_file(sub_path)
 *         else
 *             remove_dir_recursively(sub_path)
 *     remove_dir(dir_path)
 */
use getopts::Options;
use super::{Context, utils};
use crate::fs::{metadata, open_dir, remove_dir, remove_file};
use crate::fs::FsError;

const USAGE: &str = "Usage: rm [-r] <name1> <name2> ...";

fn remove_file_message(e: FsError, path: &str) -> String {
    match e {
        FsError::PermissionDenied => format!("rm: cannot remove '{}': Permission denied\n", path),
        FsError::Busy => format!("rm: cannot remove '{}': Busy\n", path),
        _ => format!("Cannot remove file '{}'\n", path),
    }
}

fn remove_dir_recursively(ctx: &Context, dir_path: &str) -> String {
    let mut return_str = String::new();

    let mut dir_dd = match open_dir(&ctx.tx, dir_path, &ctx.user) {
        Ok(dd) => dd,
        Err(FsError::PermissionDenied) => {
            return format!("rm: cannot remove '{}': Permission denied\n", dir_path)
        },
        Err(_) => return format!("Cannot find directory '{}'\n", dir_path),
    };
    let vec = match dir_dd.read() {
        Ok(v) => v,
        Err(_) => return format!("Cannot read directory '{}'\n", dir_path),
    };
    // release the descriptor, an open directory counts as busy
    drop(dir_dd);

    for sub_entry in vec {
        if sub_entry.name == ".." || sub_entry.name == "." {
            continue;
        }

        let sub_path = utils::convert_path_to_abs(dir_path, &sub_entry.name);

        let sub_meta = match metadata(&ctx.tx, &sub_path) {
            Ok(m) => m,
            Err(_) => {
                return_str += &format!("Cannot find '{}'\n", sub_entry.name);
                continue;
            }
        };

        if sub_meta.is_dir() {
            return_str += &remove_dir_recursively(ctx, &sub_path);
        } else {
            if let Err(e) = remove_file(&ctx.tx, &sub_path, &ctx.user) {
                return_str += &remove_file_message(e, &sub_path);
            }
        }
    }

    if let Err(e) = remove_dir(&ctx.tx, dir_path, &ctx.user) {
        return_str += &match e {
            FsError::PermissionDenied => format!("rm: cannot remove '{}': Permission denied\n", dir_path),
            FsError::NotEmpty => format!("rm: cannot remove '{}': Directory not empty\n", dir_path),
            FsError::Busy => format!("rm: cannot remove '{}': Busy\n", dir_path),
            _ => format!("Cannot remove directory '{}'\n", dir_path),
        };
    }

    return_str
}

pub fn rm(ctx: Context, args: Vec<&str>) -> (Context, String) {
    if args.len() < 1 {
        return (ctx, String::from(USAGE));
    }

    let mut opts = Options::new();
    opts.optflag("r", "", "Remove directories and their contents recursively");

    let matches = match opts.parse(&args) {
        Ok(m) => m,
        Err(f) => {
            return (ctx, f.to_string());
        }
    };

    if matches.free.is_empty() {
        return (ctx, String::from(USAGE));
    }

    let remove_dirs = matches.opt_present("r");

    let mut return_str = String::new();

    for path in &matches.free {
        let new_path = utils::convert_path_to_abs(&ctx.wd, path);

        let meta = match metadata(&ctx.tx, &new_path) {
            Ok(m) => m,
            Err(_) => {
                return_str += &format!("rm: cannot remove '{}': No such file or directory\n", path);
                continue;
            },
        };

        if meta.is_dir() {
            if !remove_dirs {
                return_str += &format!("rm: cannot remove '{}': Is a directory\n", path);
                continue;
            }
            return_str += &remove_dir_recursively(&ctx, &new_path);
        } else {
            if let Err(e) = remove_file(&ctx.tx, &new_path, &ctx.user) {
                return_str += &remove_file_message(e, path);
            }
        }
    }
    (ctx, return_str)
}
