use super::Context;
use crate::fs::{open_dir, create_dir, metadata, remove_file};
use crate::fs::FsError;

pub fn login(mut ctx: Context, _: Vec<&str>) -> (Context, String) {
    // found or create home_path
    let home_path = "/home";
    match open_dir(&ctx.tx, home_path, &ctx.user) {
        Ok(_) => (),
        Err(e) => {
            match e {
                FsError::NotFound => {
                    if let Err(_) = create_dir(&ctx.tx, home_path, &ctx.user) {
                        return (ctx, String::from("Cannot login! Failed to found home!\n"))
                    }
                },
                FsError::NotDirButFile => {
                    if let Err(_) = remove_file(&ctx.tx, home_path, &ctx.user) {
                        return (ctx, String::from("Cannot login! Failed to found home!\n"))
                    }
                    if let Err(_) = create_dir(&ctx.tx, home_path, &ctx.user) {
                        return (ctx, String::from("Cannot login! Failed to found home!\n"))
                    }
                },
                _ => return (ctx, String::from("Cannot login! Failed to found home!\n"))
            }
        }
    };

    // found or create "/home/<uid>"
    let path = format!("{home_path}/{}", ctx.user.uid);
    match metadata(&ctx.tx, &path) {
        Ok(m) => {
            if !m.is_dir() {
                // a file squats on the home name
                if let Err(_) = remove_file(&ctx.tx, &path, &ctx.user) {
                    return (ctx, String::from("Cannot login! Failed to found home!\n"))
                }
                if let Err(_) = create_dir(&ctx.tx, &path, &ctx.user) {
                    return (ctx, String::from("Cannot login! Failed to found home!\n"))
                }
            } else if m.owner() != ctx.user.uid {
                return (ctx, String::from("Cannot login! Home is owned by another user!\n"))
            }
        },
        Err(e) => {
            match e {
                FsError::NotFound => {
                    if let Err(_) = create_dir(&ctx.tx, &path, &ctx.user) {
                        return (ctx, String::from("Cannot login! Failed to found home!\n"))
                    }
                },
                _ => return (ctx, String::from("Cannot login! Failed to found home!\n"))
            }
        }
    }

    ctx.wd = path;
    return (ctx, String::new())
}
