/// 管道最后一个阶段的输出重定向方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RedirectKind {
    #[default]
    None,
    StdoutTruncate,
    StdoutAppend,
    StderrTruncate,
    StderrAppend,
}

impl RedirectKind {
    pub fn from_operator(op: &str) -> Option<Self> {
        match op {
            ">" | "1>" => Some(RedirectKind::StdoutTruncate),
            ">>" | "1>>" => Some(RedirectKind::StdoutAppend),
            "2>" => Some(RedirectKind::StderrTruncate),
            "2>>" => Some(RedirectKind::StderrAppend),
            _ => None,
        }
    }

    pub fn is_append(self) -> bool {
        matches!(self, RedirectKind::StdoutAppend | RedirectKind::StderrAppend)
    }

    pub fn is_stderr(self) -> bool {
        matches!(self, RedirectKind::StderrTruncate | RedirectKind::StderrAppend)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub args: Vec<String>,
    pub redirect: RedirectKind,
    /// 用户输入的原始操作符，用于错误信息。
    pub operator: Option<String>,
    pub target: Option<String>,
}

/// 按执行顺序排列的阶段，至少有一个。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    commands: Vec<Command>,
}

impl Pipeline {
    pub fn new(commands: Vec<Command>) -> Option<Self> {
        if commands.is_empty() {
            None
        } else {
            Some(Self { commands })
        }
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }
}
