use simfs::{PORT, SdReq, SdRes};
use std::io::{self, BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpStream};
use serde_json;

#[derive(Debug)]
struct Context {
    user: u8,
    gid: u8,
    groups: Vec<u8>,
    wd: String
}

impl Context {
    pub fn new(user: u8, gid: u8, groups: Vec<u8>) -> Self {
        Self {
            user,
            gid,
            groups,
            wd: String::from("/")
        }
    }

    pub fn move_to(&mut self, path: &str) {
        self.wd = String::from(path);
    }
}

fn main() {
    connect();
    let mut buf = String::new();
    let uid = loop {
        print("login (id in 0~255): ");
        read(&mut buf);
        match buf.parse::<i64>() {
            Ok(id) => if id >= 0 && id < 256 {
                break id as u8;
            }
            else {
                print("Your id is less than 0 or greater than 255!\n");
            }
            Err(_) => print("Not a number!\n")
        }
    };
    let gid = loop {
        print(&format!("primary group (default {uid}): "));
        read(&mut buf);
        if buf.is_empty() {
            break uid;
        }
        match buf.parse::<i64>() {
            Ok(id) => if id >= 0 && id < 256 {
                break id as u8;
            }
            else {
                print("Your group is less than 0 or greater than 255!\n");
            }
            Err(_) => print("Not a number!\n")
        }
    };
    let groups = loop {
        print("other groups (comma separated, empty for none): ");
        read(&mut buf);
        match parse_groups(&buf) {
            Some(g) => break g,
            None => print("Not a group list!\n")
        }
    };
    let mut ctx = Context::new(uid, gid, groups);

    loop {
        print(&format!("user{}:{} $ ", ctx.user, ctx.wd));
        read(&mut buf);
        let input = parse(&buf);
        let cmd = match input.get(0) {
            Some(c) => *c,
            None => continue
        };
        if cmd.to_ascii_lowercase() == "exit" {
            break;
        }

        // send request to simfs: ctx + args
        // and receive response
        // output the result
        print(&send(&mut ctx, cmd, &input[1..]));
    }
}

fn print(s: &str) {
    let mut stdout = io::stdout().lock();
    stdout.write_all(s.as_bytes()).unwrap();
    stdout.flush().unwrap();
}

fn connect() -> TcpStream {
    // connect to simfs
    let addr = SocketAddr::from(([127,0,0,1],PORT));
    match TcpStream::connect_timeout(&addr, std::time::Duration::from_secs(30)) {
        Ok(s) => s,
        Err(_) => {
            print("Cannot connect to simfs!");
            std::process::exit(1);
        }
    }
}

fn read(buf: &mut String) {
    buf.clear();
    let mut stdin = io::stdin().lock();
    stdin.read_line(buf).unwrap();
    if buf.ends_with('\n') {
        buf.pop();
        if buf.ends_with('\r') {
            buf.pop();
        }
    }
}

fn parse(input: &str) -> Vec<&str> {
    input.split_ascii_whitespace().collect()
}

fn parse_groups(input: &str) -> Option<Vec<u8>> {
    let mut groups = Vec::new();
    for part in input.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        match part.parse::<u8>() {
            Ok(g) => groups.push(g),
            Err(_) => return None
        }
    }
    Some(groups)
}

fn send(
    ctx: &mut Context,
    cmd: &str,
    args: &[&str]
) -> String {
    let mut conn = connect();

    // arguments after ">" name redirect targets
    let mut v_args = Vec::<String>::new();
    let mut redirect = Vec::<String>::new();
    let mut redirecting = false;
    for arg in args {
        if *arg == ">" {
            redirecting = true;
            continue;
        }
        if redirecting {
            redirect.push(String::from(*arg));
        } else {
            v_args.push(String::from(*arg));
        }
    }

    let msg = SdReq {
        uid: ctx.user,
        gid: ctx.gid,
        groups: ctx.groups.clone(),
        wd: ctx.wd.clone(),
        cmd: String::from(cmd),
        args: v_args,
        redirect
    };
    let mut s_msg = match serde_json::to_string(&msg) {
        Ok(s) => s,
        Err(e) => return format!("{e}\n")
    };
    s_msg = s_msg + "\n";

    // send request
    if let Err(e) = conn.write_all(s_msg.as_bytes()) {
        return format!("{e}\n");
    }
    if let Err(e) = conn.flush() {
        return format!("{e}\n");
    }

    // read response
    let mut res = String::new();
    let mut reader = BufReader::new(&conn);
    if let Err(e) = reader.read_line(&mut res) {
        return format!("{e}\n");
    }
    let res: SdRes = match serde_json::from_str(&res) {
        Ok(obj) => obj,
        Err(e) => return format!("{e}\n")
    };

    // working directory may change
    if ctx.wd != res.wd {
        ctx.move_to(&res.wd);
    }

    res.result
}
