use log::{debug, error, info, warn};
use std::error::Error;
use std::io::Write;

use crate::shell::executor::{Executor, Terminal};
use crate::shell::history::History;
use crate::shell::parser;
use crate::shell::readline::{ReadlineError, ReadlineManager};
use crate::shell::state::ShellState;
use crate::utils::config::Config;
use crate::utils::path::SearchPath;
use crate::utils::theme::Theme;

pub struct Shell<'a> {
    config: &'a Config,
    theme: Theme,
    readline: ReadlineManager,
    executor: Executor<SearchPath>,
    state: ShellState,
}

impl<'a> Shell<'a> {
    pub fn new(config: &'a Config) -> Result<Self, Box<dyn Error>> {
        let history = match History::load(&config.history_file) {
            Ok(history) => {
                debug!("历史记录加载成功: {} 条", history.entries().len());
                history
            }
            Err(e) => {
                warn!(
                    "无法加载历史记录: {} {}",
                    config.history_file.display(),
                    e
                );
                History::new()
            }
        };

        let mut readline = ReadlineManager::new(config)?;
        readline.seed(&history);

        Ok(Self {
            config,
            theme: Theme::load_theme(&config.theme),
            readline,
            executor: Executor::new(SearchPath::from_env(), Terminal::stdio()),
            state: ShellState::from_process(config.home.clone(), history),
        })
    }

    pub fn run(&mut self) -> Result<(), Box<dyn Error>> {
        debug!("初始化 {}...", self.config.name);
        self.run_loop()?;
        self.save_history();
        debug!("退出 {}...", self.config.name);
        Ok(())
    }

    fn run_loop(&mut self) -> Result<(), Box<dyn Error>> {
        while !self.state.exit_requested {
            std::io::stdout().flush()?;

            match self.readline.readline(&self.theme.prompt) {
                Ok(line) => self.handle_input(&line),
                Err(ReadlineError::Eof) => {
                    info!("接收到 EOF 信号，退出...");
                    break;
                }
                Err(ReadlineError::Interrupted) => {
                    debug!("接收到中断信号，放弃当前输入");
                }
                Err(err) => {
                    error!("读取输入失败: {}", err);
                    return Err(err.into());
                }
            }
        }
        Ok(())
    }

    fn handle_input(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        self.state.history.push(line);
        self.readline.add_history(line);
        debug!("执行命令: {}", line);

        let result = match parser::parse(line) {
            Ok(Some(pipeline)) => self.executor.execute(&pipeline, &mut self.state),
            Ok(None) => Ok(()),
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            warn!("命令失败: {}: {}", line, e);
            eprintln!(
                "{}: {}",
                (self.theme.error_style)(self.config.name.clone()),
                e
            );
        }
    }

    fn save_history(&self) {
        match self.state.history.save(&self.config.history_file) {
            Ok(()) => debug!("历史记录保存成功"),
            Err(e) => {
                error!("保存历史记录失败: {}", e);
                eprintln!(
                    "{}",
                    (self.theme.warning_style)(format!(
                        "{}: cannot save history to {}: {}",
                        self.config.name,
                        self.config.history_file.display(),
                        e
                    ))
                );
            }
        }
    }
}
