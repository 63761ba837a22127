//! Path resolution for the virtual namespace.
//!
//! Paths are plain `/`-separated strings rather than `std::path::PathBuf`:
//! the namespace is always Unix-shaped, whatever the host is.

/// Home directory of the simulated user.
pub const HOME: &str = "/home/user";

/// Resolve a raw path argument against the current directory.
///
/// Rules, checked in order:
/// 1. `/...` is already absolute.
/// 2. `~` is the home directory.
/// 3. `~/rest` is `rest` under the home directory.
/// 4. In `/`, `raw` becomes `/raw`.
/// 5. Otherwise `cwd/raw`.
///
/// The result is then normalized: `.` segments and empty segments are
/// dropped, `..` removes the previous segment (and stays put at `/`).
///
/// ```rust
/// use simsh::path::resolve;
///
/// assert_eq!(resolve("/home/user", "notes.txt"), "/home/user/notes.txt");
/// assert_eq!(resolve("/home/user", "/etc/hosts"), "/etc/hosts");
/// assert_eq!(resolve("/home/user", "~"), "/home/user");
/// assert_eq!(resolve("/home/user/proj", ".."), "/home/user");
/// ```
pub fn resolve(cwd: &str, raw: &str) -> String {
    let joined = if raw.starts_with('/') {
        raw.to_string()
    } else if raw == "~" {
        HOME.to_string()
    } else if let Some(rest) = raw.strip_prefix("~/") {
        format!("{}/{}", HOME, rest)
    } else if cwd == "/" {
        format!("/{}", raw)
    } else {
        format!("{}/{}", cwd, raw)
    };
    normalize(&joined)
}

/// Normalize an absolute path.
pub fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            name => parts.push(name),
        }
    }
    format!("/{}", parts.join("/"))
}

/// Derived parent of a normalized path; `None` for `/`.
pub fn parent(path: &str) -> Option<&str> {
    if path == "/" {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some("/"),
        Some(idx) => Some(&path[..idx]),
        None => None,
    }
}

/// Final segment of a normalized path (`/` for the root).
pub fn file_name(path: &str) -> &str {
    if path == "/" {
        return "/";
    }
    path.rsplit('/').next().unwrap_or(path)
}

/// Join a directory and a single name.
pub fn join(dir: &str, name: &str) -> String {
    if dir == "/" {
        format!("/{}", name)
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Whether `path` lies strictly below `ancestor`.
pub fn is_descendant(path: &str, ancestor: &str) -> bool {
    if ancestor == "/" {
        return path != "/";
    }
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path.as_bytes()[ancestor.len()] == b'/'
}

/// Rewrite `path` from under `from` to under `to`.
///
/// `path` must be `from` itself or one of its descendants.
pub fn rebase(path: &str, from: &str, to: &str) -> String {
    if path == from {
        return to.to_string();
    }
    let rest = if from == "/" {
        &path[1..]
    } else {
        &path[from.len() + 1..]
    };
    join(to, rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_absolute() {
        assert_eq!(resolve("/home/user", "/tmp/file.txt"), "/tmp/file.txt");
    }

    #[test]
    fn test_resolve_relative() {
        assert_eq!(
            resolve("/home/user", "downloads/file.txt"),
            "/home/user/downloads/file.txt"
        );
    }

    #[test]
    fn test_resolve_from_root() {
        assert_eq!(resolve("/", "etc"), "/etc");
    }

    #[test]
    fn test_resolve_home() {
        assert_eq!(resolve("/tmp", "~"), "/home/user");
        assert_eq!(resolve("/tmp", "~/Documents"), "/home/user/Documents");
    }

    #[test]
    fn test_resolve_tilde_not_prefix() {
        // Only a leading "~" or "~/" is special
        assert_eq!(resolve("/tmp", "~other"), "/tmp/~other");
    }

    #[test]
    fn test_resolve_dot_and_dotdot() {
        assert_eq!(resolve("/home/user", "."), "/home/user");
        assert_eq!(resolve("/home/user", ".."), "/home");
        assert_eq!(resolve("/", ".."), "/");
        assert_eq!(
            resolve("/home/user", "./a/../b/./c.txt"),
            "/home/user/b/c.txt"
        );
    }

    #[test]
    fn test_normalize_slashes() {
        assert_eq!(normalize("//home///user/"), "/home/user");
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize("/.."), "/");
    }

    #[test]
    fn test_parent() {
        assert_eq!(parent("/"), None);
        assert_eq!(parent("/home"), Some("/"));
        assert_eq!(parent("/home/user/.bashrc"), Some("/home/user"));
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("/home/user/.bashrc"), ".bashrc");
        assert_eq!(file_name("/home"), "home");
        assert_eq!(file_name("/"), "/");
    }

    #[test]
    fn test_is_descendant() {
        assert!(is_descendant("/home/user", "/home"));
        assert!(is_descendant("/home", "/"));
        assert!(!is_descendant("/homework", "/home"));
        assert!(!is_descendant("/home", "/home"));
        assert!(!is_descendant("/", "/"));
    }

    #[test]
    fn test_rebase() {
        assert_eq!(rebase("/a/b/c", "/a/b", "/x"), "/x/c");
        assert_eq!(rebase("/a/b", "/a/b", "/x/y"), "/x/y");
    }
}
