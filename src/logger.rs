use chrono::prelude::*;

/// Add a timestamp like `[hh:mm:ss] ` before the message to print.
///
/// ## Usage
///
/// ```rust
/// use simfs::logger;
///
/// logger::log("String literal");
/// logger::log(&format!("to format: {}", 10));
/// ```
pub fn log(msg: &str) {
    let now = Local::now();
    println!("[{:0>2}:{:0>2}:{:0>2}] {msg}", now.hour(), now.minute(), now.second());
}

/// Same timestamp format as [log], but printed to stderr.
pub fn elog(msg: &str) {
    let now = Local::now();
    eprintln!("[{:0>2}:{:0>2}:{:0>2}] {msg}", now.hour(), now.minute(), now.second());
}
