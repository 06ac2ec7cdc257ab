use std::fs;
use std::path::PathBuf;

use log::debug;

use crate::shell::state::ShellState;
use crate::utils::path::PathLookup;

/// 在 shell 进程内执行的命令。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Exit,
    Echo,
    Type,
    Pwd,
    Cd,
    History,
}

/// 内建命令的结果，两个字符串都是完整的行（或为空）。
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BuiltinOutput {
    pub output: String,
    pub error: Option<String>,
}

impl BuiltinOutput {
    fn output(output: String) -> Self {
        Self {
            output,
            error: None,
        }
    }

    fn error(error: String) -> Self {
        Self {
            output: String::new(),
            error: Some(error),
        }
    }
}

impl Builtin {
    pub const ALL: [Builtin; 6] = [
        Builtin::Exit,
        Builtin::Echo,
        Builtin::Type,
        Builtin::Pwd,
        Builtin::Cd,
        Builtin::History,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Exit => "exit",
            Builtin::Echo => "echo",
            Builtin::Type => "type",
            Builtin::Pwd => "pwd",
            Builtin::Cd => "cd",
            Builtin::History => "history",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|builtin| builtin.name() == name)
    }

    pub fn run(
        self,
        args: &[String],
        state: &mut ShellState,
        lookup: &dyn PathLookup,
    ) -> BuiltinOutput {
        debug!("执行内建命令: {} {:?}", self.name(), args);
        match self {
            Builtin::Exit => {
                // 退出由 REPL 在保存历史记录后完成
                state.exit_requested = true;
                BuiltinOutput::default()
            }
            Builtin::Echo => BuiltinOutput::output(format!("{}\n", args.join(" "))),
            Builtin::Type => BuiltinOutput::output(builtin_type(args, lookup)),
            Builtin::Pwd => builtin_pwd(state),
            Builtin::Cd => builtin_cd(args, state),
            Builtin::History => builtin_history(args, state),
        }
    }
}

fn builtin_type(args: &[String], lookup: &dyn PathLookup) -> String {
    args.iter()
        .map(|name| {
            if Builtin::from_name(name).is_some() {
                format!("{} is a shell builtin\n", name)
            } else if let Some(path) = lookup.lookup(name) {
                format!("{} is {}\n", name, path.display())
            } else {
                format!("{}: not found\n", name)
            }
        })
        .collect()
}

fn builtin_pwd(state: &ShellState) -> BuiltinOutput {
    match fs::metadata(&state.cwd) {
        Ok(_) => BuiltinOutput::output(format!("{}\n", state.cwd.display())),
        Err(e) => BuiltinOutput::error(format!(
            "pwd: error retrieving current directory: {}\n",
            e
        )),
    }
}

fn builtin_cd(args: &[String], state: &mut ShellState) -> BuiltinOutput {
    let raw = args.first().map(String::as_str).unwrap_or("~");
    let home = state.home.as_ref().and_then(|home| home.to_str());
    let expanded = shellexpand::tilde_with_context(raw, || home);
    let target = state.cwd.join(PathBuf::from(expanded.as_ref()));

    match fs::canonicalize(&target) {
        Ok(dir) if dir.is_dir() => {
            debug!("切换工作目录: {}", dir.display());
            state.cwd = dir;
            BuiltinOutput::default()
        }
        _ => BuiltinOutput::error(format!("cd: {}: No such file or directory\n", raw)),
    }
}

fn builtin_history(args: &[String], state: &mut ShellState) -> BuiltinOutput {
    let Some(first) = args.first() else {
        return BuiltinOutput::output(state.history.render(None));
    };

    match first.as_str() {
        flag @ ("-r" | "-w" | "-a") => {
            let Some(file) = args.get(1) else {
                return BuiltinOutput::error(format!(
                    "history: {}: option requires an argument\n",
                    flag
                ));
            };
            let path = state.cwd.join(file);
            let result = match flag {
                "-r" => state.history.read_from(&path),
                "-w" => state.history.write_to(&path),
                _ => state.history.append_to(&path),
            };
            match result {
                Ok(()) => BuiltinOutput::default(),
                Err(e) => BuiltinOutput::error(format!("history: {}: {}\n", file, e)),
            }
        }
        limit => match limit.parse::<usize>() {
            Ok(n) => BuiltinOutput::output(state.history.render(Some(n))),
            Err(_) => BuiltinOutput::error(format!(
                "history: {}: numeric argument required\n",
                limit
            )),
        },
    }
}
