use super::{Context, utils};
use crate::fs::{open_file, create_file, AccessMode};
use crate::fs::FsError;

pub fn output(ctx: Context, s: String, redirects: &Vec<String>) -> String {
    if redirects.len() == 0 {
        return s;
    }

    let mut rtn_str = String::new();
    // output s to files in redirects
    for path in redirects {
        let abs_path = utils::convert_path_to_abs(&ctx.wd, path);

        // open file, or create one if missing; the fs checks both
        let mut fd = match open_file(&ctx.tx, &abs_path, &ctx.user, AccessMode::WriteOnly) {
            Ok(f) => f,
            Err(FsError::NotFound) => {
                match create_file(&ctx.tx, &abs_path, &ctx.user) {
                    Ok(f) => f,
                    Err(FsError::NotFound) => {
                        rtn_str += &format!("shell: Cannot write to '{path}': No such file or directory.\n");
                        continue;
                    },
                    Err(FsError::PermissionDenied) => {
                        rtn_str += &format!("shell: Permission denied: '{path}'\n");
                        continue;
                    },
                    Err(_) => {
                        rtn_str += &format!("shell: Cannot write to '{path}': Error when creating file.\n");
                        continue;
                    }
                }
            },
            Err(FsError::NotFileButDir) => {
                rtn_str += &format!("shell: Cannot write to '{path}': Is a directory.\n");
                continue;
            },
            Err(FsError::PermissionDenied) => {
                rtn_str += &format!("shell: Permission denied: '{path}'\n");
                continue;
            },
            Err(_) => {
                rtn_str += &format!("shell: Cannot write to '{path}': Inner Error.\n");
                continue;
            }
        };

        if let Err(_) = fd.write(s.as_bytes()) {
            rtn_str += &format!("shell: Cannot write to '{path}': Inner Error.\n");
        }
    }

    rtn_str
}
