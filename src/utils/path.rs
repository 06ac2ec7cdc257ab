use std::env;
use std::ffi::OsString;
use std::fs::{self, read_dir};
use std::io::ErrorKind;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use log::{error, trace};

/// 把命令名解析为磁盘上的可执行文件。
pub trait PathLookup {
    fn lookup(&self, name: &str) -> Option<PathBuf>;
}

/// 按顺序搜索 `PATH` 格式的目录列表。
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    pub fn new(path: impl Into<OsString>) -> Self {
        let path = path.into();
        Self {
            dirs: env::split_paths(&path).collect(),
        }
    }

    /// 读取当前进程的 `PATH`。
    pub fn from_env() -> Self {
        match env::var_os("PATH") {
            Some(path) => Self::new(path),
            None => {
                error!("PATH 环境变量不存在");
                Self { dirs: Vec::new() }
            }
        }
    }
}

impl PathLookup for SearchPath {
    fn lookup(&self, name: &str) -> Option<PathBuf> {
        self.dirs.iter().find_map(|dir| find_in_dir(dir, name))
    }
}

fn find_in_dir(dir: &Path, filename: &str) -> Option<PathBuf> {
    let list = match read_dir(dir) {
        Ok(list) => list,
        Err(e) => {
            if e.kind() != ErrorKind::NotFound {
                error!("read_dir 失败: {}: {}", dir.display(), e);
            }
            return None;
        }
    };

    for entry in list.flatten() {
        if entry.file_name().to_str() != Some(filename) {
            continue;
        }
        let path = entry.path();
        if is_executable(&path) {
            trace!("在 {} 中找到 {}", dir.display(), filename);
            return Some(path);
        }
    }
    None
}

/// 普通文件（跟随符号链接）且至少有一个可执行位。
pub fn is_executable(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[allow(clippy::unwrap_used)]
    fn touch(path: &Path, mode: u32) {
        File::create(path).unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_lookup_honours_path_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        touch(&first.path().join("tool"), 0o755);
        touch(&second.path().join("tool"), 0o755);

        let path = env::join_paths([first.path(), second.path()]).unwrap();
        let lookup = SearchPath::new(path);
        assert_eq!(lookup.lookup("tool"), Some(first.path().join("tool")));
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_lookup_skips_non_executables_and_directories() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        touch(&first.path().join("tool"), 0o644);
        fs::create_dir(first.path().join("other")).unwrap();
        touch(&second.path().join("tool"), 0o700);

        let path = env::join_paths([first.path(), second.path()]).unwrap();
        let lookup = SearchPath::new(path);
        assert_eq!(lookup.lookup("tool"), Some(second.path().join("tool")));
        assert_eq!(lookup.lookup("other"), None);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_lookup_missing_name() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone");
        let path = env::join_paths([dir.path(), missing.as_path()]).unwrap();
        assert_eq!(SearchPath::new(path).lookup("nothing-here"), None);
    }
}
