use super::ast::{Command, Pipeline, RedirectKind};
use super::lexer;
use crate::shell::error::{ShellError, ShellResult};

const PIPE: &str = "|";

/// 解析一行输入，`Ok(None)` 表示没有可执行的命令。
pub fn parse(line: &str) -> ShellResult<Option<Pipeline>> {
    let tokens = lexer::tokenize(line)?;
    let commands = split_stages(tokens)
        .into_iter()
        .map(build_command)
        .collect::<ShellResult<Vec<_>>>()?;

    if let Some(last) = commands.last() {
        if last.redirect != RedirectKind::None && last.target.is_none() {
            let op = last.operator.clone().unwrap_or_default();
            return Err(ShellError::MissingRedirectTarget(op));
        }
    }

    Ok(Pipeline::new(commands))
}

/// 按 `|` 切分阶段，丢弃空阶段。
pub fn split_stages(tokens: Vec<String>) -> Vec<Vec<String>> {
    let mut stages = Vec::new();
    let mut current = Vec::new();

    for token in tokens {
        if token == PIPE {
            if !current.is_empty() {
                stages.push(std::mem::take(&mut current));
            }
        } else {
            current.push(token);
        }
    }
    if !current.is_empty() {
        stages.push(current);
    }

    stages
}

/// 从非空阶段构建命令。以第一个重定向操作符为准，
/// 其后的单词是目标文件，再往后的单词仍作为参数。
pub fn build_command(stage: Vec<String>) -> ShellResult<Command> {
    let position = stage
        .iter()
        .position(|token| RedirectKind::from_operator(token).is_some());

    let Some(position) = position else {
        let mut words = stage.into_iter();
        return Ok(Command {
            name: words.next().unwrap_or_default(),
            args: words.collect(),
            ..Command::default()
        });
    };

    if position == 0 {
        return Err(ShellError::MissingCommand(stage[0].clone()));
    }

    let mut words = stage.into_iter();
    let name = words.next().unwrap_or_default();
    let mut args: Vec<String> = words.by_ref().take(position - 1).collect();
    let operator = words.next().unwrap_or_default();
    let target = words.next();
    args.extend(words);

    Ok(Command {
        name,
        args,
        redirect: RedirectKind::from_operator(&operator).unwrap_or_default(),
        operator: Some(operator),
        target,
    })
}
