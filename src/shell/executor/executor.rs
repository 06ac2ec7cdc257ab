use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{self, Stdio};
use std::thread::{self, JoinHandle};

use log::{debug, error, warn};
use nix::fcntl::OFlag;
use nix::unistd;

use super::builtin::Builtin;
use crate::shell::error::{ShellError, ShellResult};
use crate::shell::parser::{Command as ShellCommand, Pipeline, RedirectKind};
use crate::shell::state::ShellState;
use crate::utils::path::{is_executable, PathLookup};

/// shell 自己的 stdout/stderr，内建命令写到这里。
/// 继承终端的子进程直接拿到真实描述符，所以启动子进程前先刷新。
pub struct Terminal {
    out: Box<dyn Write>,
    err: Box<dyn Write>,
}

impl Terminal {
    pub fn new(out: Box<dyn Write>, err: Box<dyn Write>) -> Self {
        Self { out, err }
    }

    pub fn stdio() -> Self {
        Self::new(Box::new(io::stdout()), Box::new(io::stderr()))
    }

    fn flush(&mut self) {
        if let Err(e) = self.out.flush().and_then(|_| self.err.flush()) {
            warn!("刷新终端输出失败: {}", e);
        }
    }
}

/// 每个阶段在创建描述符之前解析一次。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Builtin(Builtin),
    External(PathBuf),
    NotFound,
}

enum Input {
    Terminal,
    Pipe(File),
}

impl From<Input> for Stdio {
    fn from(input: Input) -> Self {
        match input {
            Input::Terminal => Stdio::inherit(),
            Input::Pipe(file) => Stdio::from(file),
        }
    }
}

enum Output {
    Terminal,
    File(File),
    Pipe(File),
}

impl Output {
    fn try_clone(&self) -> io::Result<Output> {
        Ok(match self {
            Output::Terminal => Output::Terminal,
            Output::File(file) => Output::File(file.try_clone()?),
            Output::Pipe(file) => Output::Pipe(file.try_clone()?),
        })
    }
}

impl From<Output> for Stdio {
    fn from(output: Output) -> Self {
        match output {
            Output::Terminal => Stdio::inherit(),
            Output::File(file) | Output::Pipe(file) => Stdio::from(file),
        }
    }
}

#[derive(Clone, Copy)]
enum Stream {
    Out,
    Err,
}

pub struct Executor<L: PathLookup> {
    lookup: L,
    terminal: Terminal,
}

impl<L: PathLookup> Executor<L> {
    pub fn new(lookup: L, terminal: Terminal) -> Self {
        Self { lookup, terminal }
    }

    /// 从左到右执行所有阶段，全部结束后才返回。
    /// 只有重定向或管道创建失败会中止整行。
    pub fn execute(&mut self, pipeline: &Pipeline, state: &mut ShellState) -> ShellResult<()> {
        let commands = pipeline.commands();
        let resolved: Vec<Resolved> = commands
            .iter()
            .map(|command| self.resolve(&command.name, state))
            .collect();

        let last = commands.len() - 1;
        for command in &commands[..last] {
            if command.redirect != RedirectKind::None {
                warn!(
                    "忽略非末尾阶段的重定向: {} {:?}",
                    command.name, command.target
                );
            }
        }

        // 先打开重定向文件，失败时还没有创建任何管道或子进程
        let redirect = open_redirect(&commands[last], state)?;

        let mut tasks = Vec::new();
        let result = self.run_stages(commands, resolved, redirect, state, &mut tasks);

        for task in tasks {
            if task.join().is_err() {
                error!("管道后台任务异常退出");
            }
        }
        self.terminal.flush();
        result
    }

    fn resolve(&self, name: &str, state: &ShellState) -> Resolved {
        if let Some(builtin) = Builtin::from_name(name) {
            return Resolved::Builtin(builtin);
        }
        if name.contains('/') {
            let path = state.cwd.join(name);
            return if is_executable(&path) {
                Resolved::External(path)
            } else {
                Resolved::NotFound
            };
        }
        self.lookup
            .lookup(name)
            .map_or(Resolved::NotFound, Resolved::External)
    }

    fn run_stages(
        &mut self,
        commands: &[ShellCommand],
        resolved: Vec<Resolved>,
        mut redirect: Option<File>,
        state: &mut ShellState,
        tasks: &mut Vec<JoinHandle<()>>,
    ) -> ShellResult<()> {
        let last = commands.len() - 1;
        let mut input = Input::Terminal;

        for (i, (command, resolved)) in commands.iter().zip(resolved).enumerate() {
            let is_last = i == last;
            debug!("阶段 {}: {} -> {:?}", i, command.name, resolved);

            let (stdout, stderr, next_input) = if is_last {
                match redirect.take() {
                    Some(file) if command.redirect.is_stderr() => {
                        (Output::Terminal, Output::File(file), None)
                    }
                    Some(file) => (Output::File(file), Output::Terminal, None),
                    None => (Output::Terminal, Output::Terminal, None),
                }
            } else {
                // O_CLOEXEC: 后续子进程不能继承别的阶段的管道端
                let (read_end, write_end) =
                    unistd::pipe2(OFlag::O_CLOEXEC).map_err(io::Error::from)?;
                (
                    Output::Pipe(File::from(write_end)),
                    Output::Terminal,
                    Some(Input::Pipe(File::from(read_end))),
                )
            };
            let stage_input = std::mem::replace(&mut input, Input::Terminal);

            match resolved {
                Resolved::Builtin(builtin) => {
                    // 内建命令不读取输入
                    drop(stage_input);
                    let result = builtin.run(&command.args, state, &self.lookup);
                    self.emit(stdout, Stream::Out, result.output, tasks);
                    if let Some(message) = result.error {
                        self.emit(stderr, Stream::Err, message, tasks);
                    }
                }
                Resolved::External(path) => {
                    self.spawn(command, path, stage_input, stdout, stderr, is_last, state, tasks);
                }
                Resolved::NotFound => {
                    drop(stage_input);
                    warn!("命令不存在: {}", command.name);
                    let message = format!("{}: command not found\n", command.name);
                    self.emit(stdout, Stream::Out, message, tasks);
                }
            }

            if let Some(next) = next_input {
                input = next;
            }
        }

        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn spawn(
        &mut self,
        command: &ShellCommand,
        path: PathBuf,
        stdin: Input,
        stdout: Output,
        stderr: Output,
        is_last: bool,
        state: &ShellState,
        tasks: &mut Vec<JoinHandle<()>>,
    ) {
        debug!("执行外部命令: {} {:?}", path.display(), command.args);
        let fallback = stdout.try_clone().and_then(|out| Ok((out, stderr.try_clone()?)));

        self.terminal.flush();
        let mut child_command = process::Command::new(&path);
        child_command
            .arg0(&command.name)
            .args(&command.args)
            .current_dir(&state.cwd)
            .stdin(stdin)
            .stdout(stdout)
            .stderr(stderr);

        let spawned = child_command.spawn();
        // 释放父进程持有的管道端，下游才能读到 EOF
        drop(child_command);

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                error!("启动外部命令失败: {}: {}", path.display(), e);
                let Ok((fallback_out, fallback_err)) = fallback else {
                    return;
                };
                if e.kind() == io::ErrorKind::NotFound {
                    let message = format!("{}: command not found\n", command.name);
                    self.emit(fallback_out, Stream::Out, message, tasks);
                } else {
                    let message = format!("{}: {}\n", command.name, e);
                    self.emit(fallback_err, Stream::Err, message, tasks);
                }
                return;
            }
        };
        drop(fallback);

        if is_last {
            if let Err(e) = child.wait() {
                error!("等待外部命令失败: {}: {}", command.name, e);
            }
        } else {
            let name = command.name.clone();
            tasks.push(thread::spawn(move || {
                if let Err(e) = child.wait() {
                    error!("等待外部命令失败: {}: {}", name, e);
                }
            }));
        }
    }

    /// 把内建命令的完整输出写入目标。写管道放在单独线程里，
    /// 因为读端的进程可能还没有启动。
    fn emit(
        &mut self,
        sink: Output,
        stream: Stream,
        text: String,
        tasks: &mut Vec<JoinHandle<()>>,
    ) {
        let result = match sink {
            Output::Terminal => {
                let terminal = match stream {
                    Stream::Out => &mut self.terminal.out,
                    Stream::Err => &mut self.terminal.err,
                };
                terminal
                    .write_all(text.as_bytes())
                    .and_then(|_| terminal.flush())
            }
            Output::File(mut file) => file.write_all(text.as_bytes()),
            Output::Pipe(mut file) => {
                if !text.is_empty() {
                    tasks.push(thread::spawn(move || {
                        if let Err(e) = file.write_all(text.as_bytes()) {
                            if e.kind() != io::ErrorKind::BrokenPipe {
                                warn!("写入管道失败: {}", e);
                            }
                        }
                    }));
                }
                Ok(())
            }
        };

        if let Err(e) = result {
            warn!("写入输出失败: {}", e);
        }
    }
}

fn open_redirect(command: &ShellCommand, state: &ShellState) -> ShellResult<Option<File>> {
    if command.redirect == RedirectKind::None {
        return Ok(None);
    }
    let Some(target) = command.target.as_ref() else {
        let op = command.operator.clone().unwrap_or_default();
        return Err(ShellError::MissingRedirectTarget(op));
    };

    let mut options = OpenOptions::new();
    options.write(true).create(true).mode(0o644);
    if command.redirect.is_append() {
        options.append(true);
    } else {
        options.truncate(true);
    }

    let path = state.cwd.join(target);
    debug!("打开重定向文件: {} ({:?})", path.display(), command.redirect);
    options
        .open(&path)
        .map(Some)
        .map_err(|source| ShellError::Redirection {
            path: target.clone(),
            source,
        })
}
