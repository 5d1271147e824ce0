use getopts::Options;
use crate::fs::{access, metadata, Rwx};
use super::{Context, utils};

const USAGE: &str = "Usage: cd <directory>";
const PERMISSION: Rwx = Rwx::new(false, false, true);

pub fn cd(mut ctx: Context, args: Vec<&str>) -> (Context, String) {
    if args.len() < 1 {
        return (ctx, String::from(USAGE));
    }

    let opts = Options::new();

    let matches = match opts.parse(&args) {
        Ok(m) => m,
        Err(f) => {
            return (ctx, f.to_string());
        }
    };

    if matches.free.is_empty() {
        return (ctx, String::from(USAGE));
    }
    if matches.free.len() > 1 {
        return (ctx, String::from("Too many arguments\n"));
    }

    let path = &matches.free[0];
    let dir_path = utils::convert_path_to_abs(&ctx.wd, path);
    let meta = match metadata(&ctx.tx, &dir_path) {
        Ok(m) => m,
        Err(_) => return (ctx, format!("Cannot find '{}'\n", path)),
    };

    // entering a directory takes the execute bit
    let rwx = access::permits(&meta.permission(), &ctx.user, PERMISSION);
    if !rwx {
        return (ctx, String::from("Permission denied\n"));
    }

    if meta.is_dir() {
        ctx.wd = dir_path;
        (ctx, String::new())
    } else {
        (ctx, format!("'{}' is not a directory\n", path))
    }
}
