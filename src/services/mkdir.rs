 /*
 * iterate path in paths:
 *     if path exists
 *         -p: silent, else err
 *     else if -p is specified
 *         create every missing component
 *     else
 *         create_dir(path), the fs checks the parent
 */
use getopts::Options;
use super::{Context, utils};
use crate::fs::{metadata, create_dir};
use crate::fs::FsError;

const USAGE: &str = "Usage: mkdir [-p] [-v] <directory1> <directory2> ...";

fn create_nested_directories(ctx: &Context, path: &str, verbose: bool) -> String {
    let mut return_str = String::new();

    let mut current_path = String::new();
    for dir in path.split('/') {
        if dir.is_empty() {
            continue;
        }
        current_path.push('/');
        current_path.push_str(dir);

        if metadata(&ctx.tx, &current_path).is_ok() {
            continue;
        }
        match create_dir(&ctx.tx, &current_path, &ctx.user) {
            Ok(_) => {
                if verbose {
                    return_str += &format!("mkdir: created directory '{}'\n", current_path);
                }
            },
            Err(FsError::PermissionDenied) => {
                return_str += &format!("mkdir: cannot create directory '{}': Permission denied\n", current_path);
                break;
            },
            Err(_) => {
                return_str += &format!("Cannot create directory: '{}'\n", current_path);
                break;
            }
        }
    }
    return_str
}

pub fn mkdir(ctx: Context, args: Vec<&str>) -> (Context, String) {
    if args.len() < 1 {
        return (ctx, String::from(USAGE));
    }

    let mut opts = Options::new();
    opts.optflag("p", "", "Create parent directories as needed");
    opts.optflag("v", "", "Print a message for each created directory");

    let matches = match opts.parse(&args) {
        Ok(m) => m,
        Err(f) => {
            return (ctx, f.to_string());
        }
    };

    if matches.free.is_empty() {
        return (ctx, String::from(USAGE));
    }

    let recursive = matches.opt_present("p");
    let verbose = matches.opt_present("v");

    let mut return_str = String::new();

    for path in &matches.free {
        let dir_path = utils::convert_path_to_abs(&ctx.wd, path);

        if metadata(&ctx.tx, &dir_path).is_ok() {
            if !recursive {
                return_str += &format!("mkdir: cannot create directory '{}': File exists\n", path);
            }
            continue;
        }

        if recursive {
            return_str += &create_nested_directories(&ctx, &dir_path, verbose);
            continue;
        }

        match create_dir(&ctx.tx, &dir_path, &ctx.user) {
            Ok(_) => {
                if verbose {
                    return_str += &format!("mkdir: created directory '{}'\n", path);
                }
            },
            Err(e) => {
                return_str += &match e {
                    FsError::PermissionDenied => {
                        format!("mkdir: cannot create directory '{}': Permission denied\n", path)
                    },
                    FsError::NotFound => {
                        format!("mkdir: cannot create directory '{}': No such file or directory\n", path)
                    },
                    _ => format!("Cannot create directory: '{}'\n", path),
                };
            }
        }
    }
    (ctx, return_str)
}
