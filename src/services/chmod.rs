use getopts::Options;
use super::{Context, utils};
use crate::fs::{metadata, Rwx};

const USAGE: &str = "Usage: chmod <octal-mode> <name1> <name2> ...";

// one triad from its three permission bits
fn triad(bits: u16) -> Rwx {
    Rwx::new(bits & 0o4 > 0, bits & 0o2 > 0, bits & 0o1 > 0)
}

fn parse_mode(s: &str) -> Option<(Rwx, Rwx, Rwx)> {
    let mode = match u16::from_str_radix(s, 8) {
        Ok(m) => m,
        Err(_) => return None,
    };
    if mode > 0o777 {
        return None;
    }
    Some((triad(mode >> 6), triad(mode >> 3), triad(mode)))
}

pub fn chmod(ctx: Context, args: Vec<&str>) -> (Context, String) {
    if args.len() < 2 {
        return (ctx, String::from(USAGE));
    }

    let opts = Options::new();

    let matches = match opts.parse(&args) {
        Ok(m) => m,
        Err(f) => {
            return (ctx, f.to_string());
        }
    };

    if matches.free.len() < 2 {
        return (ctx, String::from(USAGE));
    }

    let (owner, group, other) = match parse_mode(&matches.free[0]) {
        Some(t) => t,
        None => return (ctx, format!("chmod: invalid mode: '{}'\n", matches.free[0])),
    };

    let mut return_str = String::new();

    for path in &matches.free[1..] {
        let new_path = utils::convert_path_to_abs(&ctx.wd, path);

        let mut meta = match metadata(&ctx.tx, &new_path) {
            Ok(m) => m,
            Err(_) => {
                return_str += &format!("chmod: cannot access '{}': No such file or directory\n", path);
                continue;
            }
        };

        // only the owner may change the triads
        if let Err(_) = meta.set_permission(&ctx.user, owner, group, other) {
            return_str += &format!("chmod: changing permissions of '{}': Operation not permitted\n", path);
        }
    }
    (ctx, return_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_mode_reads_octal() {
        let (owner, group, other) = parse_mode("644").unwrap();
        assert_eq!(owner, Rwx::new(true, true, false));
        assert_eq!(group, Rwx::new(true, false, false));
        assert_eq!(other, Rwx::new(true, false, false));
    }

    #[test]
    fn parse_mode_accepts_zero() {
        let (owner, group, other) = parse_mode("0").unwrap();
        assert_eq!(owner, Rwx::new(false, false, false));
        assert_eq!(group, Rwx::new(false, false, false));
        assert_eq!(other, Rwx::new(false, false, false));
    }

    #[test]
    fn parse_mode_rejects_junk() {
        assert!(parse_mode("rwx").is_none());
        assert!(parse_mode("1777").is_none());
        assert!(parse_mode("8").is_none());
        assert!(parse_mode("").is_none());
    }
}
