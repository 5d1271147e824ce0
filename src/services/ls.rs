 /*
 * iterate path in paths:
 *     if path doesn't exist
 *         return err
 *     if path is a dir
 *         iterate entry in dir.read()
 *             if entry starts with '.' and -a is not specified
 *                 continue
 *             if entry is a dir
 *                 append '/' to its name
 *             -l: one line per entry, else names on one line
 *     else
 *         print the file itself the same way
 */
use getopts::Options;
use super::{Context, utils};
use crate::fs::{Metadata, Rwx};
use crate::fs::{metadata, open_dir};
use crate::fs::FsError;

// get one triad and convert to string
fn get_rwx(rwx: &Rwx) -> String {
    let mut return_str = String::new();
    return_str.push(match rwx.read {
        true => 'r',
        false => '-',
    });
    return_str.push(match rwx.write {
        true => 'w',
        false => '-',
    });
    return_str.push(match rwx.execute {
        true => 'x',
        false => '-',
    });
    return_str
}

// one line of the long listing format
fn long_line(meta: &Metadata, name: &str) -> String {
    let mut mode_str = String::new();
    mode_str.push(match meta.is_dir() {
        true => 'd',
        false => '-',
    });
    let perm = meta.permission();
    mode_str += &get_rwx(&perm.owner)[..];
    mode_str += &get_rwx(&perm.group)[..];
    mode_str += &get_rwx(&perm.other)[..];

    let (month, day, hour, minute) = meta.timestamp();
    format!(
        "{} {:>4} {:>4} {:>8} {:0>2}-{:0>2} {:0>2}:{:0>2} {}\n",
        mode_str, meta.owner(), meta.group(), meta.size(),
        month + 1, day, hour, minute, name
    )
}

pub fn ls(ctx: Context, args: Vec<&str>) -> (Context, String) {
    // define params
    let mut opts = Options::new();
    opts.optflag("a", "", "Do not ignore entries starting with .");
    opts.optflag("l", "", "Use a long listing format");

    // parse args
    let mut matches = match opts.parse(&args) {
        Ok(m) => m,
        Err(f) => {
            return (ctx, f.to_string());
        }
    };

    // convert parameters to bool variables
    let all = matches.opt_present("a");
    let list_format = matches.opt_present("l");

    if matches.free.is_empty() {
        matches.free.push(String::from(&ctx.wd[..]));
    }

    let mut return_str = String::new();

    // iterate path in paths
    for path in &matches.free {
        let new_path = utils::convert_path_to_abs(&ctx.wd, path);

        let meta = match metadata(&ctx.tx, &new_path) {
            Ok(m) => m,
            Err(_) => {
                return_str += &format!("Cannot find '{}'\n", path);
                continue;
            }
        };

        if matches.free.len() > 1 {
            return_str += &format!("{}:\n", path);
        }

        // if path is a dir
        if meta.is_dir() {
            // listing takes the read bit, enforced on open
            let mut new_dd = match open_dir(&ctx.tx, &new_path, &ctx.user) {
                Ok(dd) => dd,
                Err(FsError::PermissionDenied) => {
                    return_str += &format!("Permission denied\n");
                    continue;
                },
                Err(_) => {
                    return_str += &format!("Cannot open directory: '{}'\n", path);
                    continue;
                }
            };
            let new_vec = match new_dd.read() {
                Ok(v) => v,
                Err(_) => {
                    return_str += &format!("Cannot read directory: '{}'\n", path);
                    continue;
                }
            };

            // iterate entry in sub entrys
            for sub_entry in new_vec {
                // "." and ".." are real entries, so -a rules apply
                if sub_entry.name.starts_with('.') && !all {
                    continue;
                }

                let sub_path = utils::convert_path_to_abs(&new_path, &sub_entry.name);
                let sub_meta = match metadata(&ctx.tx, &sub_path) {
                    Ok(m) => m,
                    Err(_) => {
                        return_str += &format!("Cannot find '{}'\n", sub_entry.name);
                        continue;
                    }
                };

                let mut name = sub_entry.name.clone();
                if sub_meta.is_dir() {
                    name.push('/');
                }

                if list_format {
                    return_str += &long_line(&sub_meta, &name);
                } else {
                    return_str += &format!("{} ", name);
                }
            }
            if !list_format {
                return_str += &String::from("\n");
            }
        }
        else {
            let mut name = String::from(utils::base_name(&new_path));
            if name.starts_with('.') && !all {
                continue;
            }

            if list_format {
                return_str += &long_line(&meta, &name);
            } else {
                name.push('\n');
                return_str += &name;
            }
        }
    }
    (ctx, return_str)
}
