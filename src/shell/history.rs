use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use log::debug;

/// 内存中的命令历史，记录增量追加的位置。
#[derive(Debug, Default, Clone)]
pub struct History {
    entries: Vec<String>,
    appended: usize,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn push(&mut self, line: impl Into<String>) {
        let line = line.into();
        if !line.trim().is_empty() {
            self.entries.push(line);
        }
    }

    /// 启动时加载历史文件，这些条目视为已经写入过。
    pub fn load(path: &Path) -> io::Result<Self> {
        let mut history = Self::new();
        match history.read_from(path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("历史文件不存在: {}", path.display());
            }
            Err(e) => return Err(e),
        }
        history.appended = history.entries.len();
        Ok(history)
    }

    /// `history -r`：追加文件中的每个非空行。
    pub fn read_from(&mut self, path: &Path) -> io::Result<()> {
        let reader = BufReader::new(File::open(path)?);
        for line in reader.lines() {
            self.push(line?);
        }
        Ok(())
    }

    /// `history -w`：用完整历史覆盖文件。
    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        let mut file = File::create(path)?;
        write_entries(&mut file, &self.entries)
    }

    /// `history -a`：只追加之前 `-a` 尚未写入的条目。
    pub fn append_to(&mut self, path: &Path) -> io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        write_entries(&mut file, &self.entries[self.appended..])?;
        self.appended = self.entries.len();
        Ok(())
    }

    /// 列出最后 `limit` 条（`None` 为全部），编号从 1 开始。
    pub fn render(&self, limit: Option<usize>) -> String {
        let start = limit.map_or(0, |n| self.entries.len().saturating_sub(n));
        self.entries
            .iter()
            .enumerate()
            .skip(start)
            .map(|(i, entry)| format!("{:>5}  {}\n", i + 1, entry))
            .collect()
    }

    /// 退出时保存到配置的文件，必要时创建目录。
    pub fn save(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        self.write_to(path)
    }
}

fn write_entries(out: &mut impl Write, entries: &[String]) -> io::Result<()> {
    for entry in entries {
        writeln!(out, "{}", entry)?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> History {
        let mut history = History::new();
        history.push("echo one");
        history.push("   ");
        history.push("ls | wc");
        history.push("history");
        history
    }

    #[test]
    fn test_blank_lines_are_not_recorded() {
        assert_eq!(sample().entries(), &["echo one", "ls | wc", "history"]);
    }

    #[test]
    fn test_render_all_and_limited() {
        let history = sample();
        assert_eq!(
            history.render(None),
            "    1  echo one\n    2  ls | wc\n    3  history\n"
        );
        assert_eq!(history.render(Some(2)), "    2  ls | wc\n    3  history\n");
        assert_eq!(history.render(Some(0)), "");
        assert_eq!(history.render(Some(10)), history.render(None));
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hist");
        sample().write_to(&path).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "echo one\nls | wc\nhistory\n"
        );

        let mut other = History::new();
        other.push("first");
        other.read_from(&path).unwrap();
        assert_eq!(other.entries(), &["first", "echo one", "ls | wc", "history"]);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_entries_keep_line_as_typed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hist");
        let line = r#"echo 'a  b' "c\"d" | cat > out.txt"#;

        let mut history = History::new();
        history.push(line);
        history.write_to(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), format!("{}\n", line));

        let mut restored = History::new();
        restored.read_from(&path).unwrap();
        assert_eq!(restored.entries(), &[line]);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_append_only_writes_new_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hist");
        let mut history = sample();

        history.append_to(&path).unwrap();
        history.push("pwd");
        history.append_to(&path).unwrap();
        history.append_to(&path).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "echo one\nls | wc\nhistory\npwd\n"
        );
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let history = History::load(&dir.path().join("nope")).unwrap();
        assert!(history.entries().is_empty());
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_loaded_entries_are_not_appended_again() {
        let dir = tempfile::tempdir().unwrap();
        let startup = dir.path().join("startup");
        fs::write(&startup, "old one\n\nold two\n").unwrap();

        let mut history = History::load(&startup).unwrap();
        assert_eq!(history.entries(), &["old one", "old two"]);

        history.push("new");
        let out = dir.path().join("out");
        history.append_to(&out).unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), "new\n");
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_save_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/dir/hist");
        sample().save(&path).unwrap();
        assert!(path.exists());
    }
}
