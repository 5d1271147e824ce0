use getopts::Options;
use super::{Context, utils};
use crate::fs::{open_file, AccessMode};
use crate::fs::FsError;

const USAGE: &str = "Usage: cat [-nb] <file1> <file2> ...";

pub fn cat(ctx: Context, args: Vec<&str>) -> (Context, String) {
    if args.len() < 1 {
        return (ctx, String::from(USAGE));
    }

    let mut opts = Options::new();
    opts.optflag("n", "", "Number all output lines");
    opts.optflag("b", "", "Number non-empty output lines");

    let matches = match opts.parse(&args) {
        Ok(m) => m,
        Err(f) => {
            return (ctx, f.to_string());
        }
    };

    if matches.free.is_empty() {
        return (ctx, String::from(USAGE));
    }

    let number_lines = matches.opt_present("n");
    let number_non_empty_lines = matches.opt_present("b");

    let mut return_str = String::new();

    for path in &matches.free {
        let file_path = utils::convert_path_to_abs(&ctx.wd, path);

        // a read-only open is enough for cat
        let mut fd = match open_file(&ctx.tx, &file_path, &ctx.user, AccessMode::ReadOnly) {
            Ok(fd) => fd,
            Err(e) => {
                return_str += &match e {
                    FsError::PermissionDenied => format!("cat: {}: Permission denied\n", path),
                    FsError::NotFileButDir => format!("cat: {}: Is a directory\n", path),
                    _ => format!("cat: {}: No such file or directory\n", path),
                };
                continue;
            }
        };
        let content = match fd.read() {
            Ok(v) => v,
            Err(_) => {
                return_str += &format!("cat: {}: Cannot read\n", path);
                continue;
            }
        };

        let text = String::from_utf8_lossy(&content);
        if number_lines || number_non_empty_lines {
            let mut line_num = 1;
            for line in text.lines() {
                // -b leaves empty lines unnumbered
                if number_non_empty_lines && line.is_empty() {
                    return_str.push('\n');
                    continue;
                }
                return_str += &format!("{:>6}\t{}\n", line_num, line);
                line_num += 1;
            }
        } else {
            return_str += &text;
            if !text.is_empty() && !text.ends_with('\n') {
                return_str.push('\n');
            }
        }
    }
    (ctx, return_str)
}
