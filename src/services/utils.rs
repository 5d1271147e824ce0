/// Turn a possibly relative `path` into a normalized absolute path,
/// resolving it against the working directory `wd`. `.` and `..` are
/// folded away; `..` at the root stays at the root, as usual.
pub fn convert_path_to_abs(wd: &str, path: &str) -> String {
    let mut stack: Vec<&str> = Vec::new();
    if !path.starts_with('/') {
        for part in wd.split('/') {
            if !part.is_empty() {
                stack.push(part);
            }
        }
    }
    for part in path.split('/') {
        match part {
            "" | "." => (),
            ".." => { stack.pop(); },
            p => stack.push(p),
        }
    }
    if stack.is_empty() {
        return String::from("/");
    }
    format!("/{}", stack.join("/"))
}

/// Last component of a normalized absolute path; `/` maps to itself.
pub fn base_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(i) if i + 1 < path.len() => &path[i + 1..],
        _ => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_path_passes_through() {
        assert_eq!(convert_path_to_abs("/home/1", "/etc/motd"), "/etc/motd");
    }

    #[test]
    fn relative_path_joins_working_dir() {
        assert_eq!(convert_path_to_abs("/home/1", "notes.txt"), "/home/1/notes.txt");
        assert_eq!(convert_path_to_abs("/", "notes.txt"), "/notes.txt");
    }

    #[test]
    fn dots_are_folded() {
        assert_eq!(convert_path_to_abs("/home/1", "./a/../b"), "/home/1/b");
        assert_eq!(convert_path_to_abs("/home/1", ".."), "/home");
        assert_eq!(convert_path_to_abs("/home/1", "."), "/home/1");
    }

    #[test]
    fn parent_of_root_is_root() {
        assert_eq!(convert_path_to_abs("/", ".."), "/");
        assert_eq!(convert_path_to_abs("/", "/../.."), "/");
    }

    #[test]
    fn trailing_slashes_are_dropped() {
        assert_eq!(convert_path_to_abs("/", "a/b/"), "/a/b");
        assert_eq!(convert_path_to_abs("/home", ""), "/home");
    }

    #[test]
    fn base_name_of_paths() {
        assert_eq!(base_name("/home/1/notes.txt"), "notes.txt");
        assert_eq!(base_name("/home"), "home");
        assert_eq!(base_name("/"), "/");
    }
}
