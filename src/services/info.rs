use super::Context;
use crate::fs::statfs;

pub fn info(ctx: Context, _: Vec<&str>) -> (Context, String) {
    // get file system info
    let stat = match statfs(&ctx.tx) {
        Ok(s) => s,
        Err(e) => return (ctx, format!("Cannot read file system info: {e}\n")),
    };

    let return_str = format!(
        "Disk Structure\n\
        block size: {}B\n\
        block count: {}\n\
        inode count: {} ({} free)\n\
        data blocks: {} ({} free)\n\
        max file size: {}KB\n",
        stat.block_size,
        stat.block_count,
        stat.inode_count,
        stat.free_inodes,
        stat.data_blocks,
        stat.free_data_blocks,
        stat.max_file_size / 1024,
    );

    (ctx, return_str)
}
