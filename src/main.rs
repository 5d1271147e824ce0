/** Disk Structure
 * size: 128MB
 * block size: 1KB
 * block count: 128 * 1024
 * superblock: 1 block
 * inode bitmap: 1 block
 * inode size: 64B
 * inode count: 4096
 * inode: 256 blocks
 * data bitmap: 16 blocks
 */

use getopts::Options;
use simfs::{fs, server, logger};
use std::sync::mpsc;
use std::thread;

const DEFAULT_DISK: &str = "./the_disk";
const DEFAULT_THREADS: usize = 8;

fn main() {
    // define params
    let args: Vec<String> = std::env::args().collect();
    let mut opts = Options::new();
    opts.optopt("d", "disk", "Path of the disk file", "PATH");
    opts.optopt("p", "port", "Port to listen on", "PORT");
    opts.optopt("t", "threads", "Worker threads for the server", "N");
    opts.optflag("h", "help", "Show this help");

    // parse args
    let matches = match opts.parse(&args[1..]) {
        Ok(m) => m,
        Err(f) => {
            logger::elog(&f.to_string());
            return
        }
    };

    if matches.opt_present("h") {
        print!("{}", opts.usage("Usage: simfs [-d PATH] [-p PORT] [-t N]"));
        return
    }

    let disk_path = matches.opt_str("d").unwrap_or(String::from(DEFAULT_DISK));
    let port = match matches.opt_str("p") {
        Some(s) => match s.parse::<u16>() {
            Ok(p) => p,
            Err(_) => {
                logger::elog(&format!("Not a port: {s}"));
                return
            }
        },
        None => server::PORT
    };
    let threads = match matches.opt_str("t") {
        Some(s) => match s.parse::<usize>() {
            Ok(n) if n > 0 => n,
            _ => {
                logger::elog(&format!("Not a thread count: {s}"));
                return
            }
        },
        None => DEFAULT_THREADS
    };

    // boot the fs thread first, serve only after it mounted
    let (fs_tx, fs_rx) = mpsc::channel();
    let (started_tx, started_rx) = mpsc::channel();
    let fs_tx_c = fs_tx.clone();
    thread::spawn(move || fs::start_fs(&disk_path, started_tx, fs_tx_c, fs_rx));
    match started_rx.recv() {
        Ok(Ok(())) => (),
        Ok(Err(e)) => {
            logger::elog(&format!("Cannot mount the disk: {e}"));
            return
        },
        Err(_) => {
            logger::elog("The fs thread died before reporting.");
            return
        }
    }

    logger::log(&format!("Simfs started on 127.0.0.1:{port}."));
    server::start_server(fs_tx, port, threads);
}
