 /*
 * iterate path in paths:
 *     if path exists
 *         update timestamp as the caller
 *     else
 *         create_file(path), the fs checks the parent
 */
use getopts::Options;
use super::{Context, utils};
use crate::fs::{metadata, create_file};
use crate::fs::FsError;

const USAGE: &str = "Usage: touch <name1> <name2> ...";

pub fn touch(ctx: Context, args: Vec<&str>) -> (Context, String) {
    if args.len() < 1 {
        return (ctx, String::from(USAGE));
    }

    // define params: none
    let opts = Options::new();

    // parse args
    let matches = match opts.parse(&args) {
        Ok(m) => m,
        Err(f) => {
            return (ctx, f.to_string());
        }
    };

    if matches.free.is_empty() {
        return (ctx, String::from(USAGE));
    }

    let mut return_str = String::new();

    // iterate path in paths
    for path in &matches.free {
        let new_path = utils::convert_path_to_abs(&ctx.wd, path);

        // update timestamp
        if let Ok(mut m) = metadata(&ctx.tx, &new_path) {
            if let Err(_) = m.update_timestamp(&ctx.user) {
                return_str += &format!("touch: cannot touch '{}': Permission denied\n", path);
            }
            continue;
        }

        // create file
        match create_file(&ctx.tx, &new_path, &ctx.user) {
            Ok(_) => (),
            Err(FsError::PermissionDenied) => {
                return_str += &format!("touch: cannot touch '{}': Permission denied\n", path);
            },
            Err(_) => {
                return_str += &format!("touch: cannot touch '{}': No such file or directory\n", path);
            }
        }
    }

    (ctx, return_str)
}
