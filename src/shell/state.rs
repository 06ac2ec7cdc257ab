use std::env;
use std::path::PathBuf;

use crate::shell::history::History;

/// 命令可以修改的全部状态，贯穿整个会话。
/// 只在管道之间被访问，所以用 `&mut` 传递而不是共享。
#[derive(Debug)]
pub struct ShellState {
    pub cwd: PathBuf,
    pub home: Option<PathBuf>,
    pub history: History,
    pub exit_requested: bool,
}

impl ShellState {
    pub fn new(cwd: PathBuf, home: Option<PathBuf>, history: History) -> Self {
        Self {
            cwd,
            home,
            history,
            exit_requested: false,
        }
    }

    /// 以进程当前目录作为初始工作目录。
    pub fn from_process(home: Option<PathBuf>, history: History) -> Self {
        let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        Self::new(cwd, home, history)
    }
}
