use crate::shell::history::History;
use crate::utils::config::Config;
use log::{debug, warn};
pub use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use rustyline::Config as RLConfig;

/// 只负责行编辑。历史记录以 [`History`] 为准，
/// 同步到编辑器里只是为了上下键回溯。
pub struct ReadlineManager {
    editor: Editor<(), DefaultHistory>,
}

impl ReadlineManager {
    pub fn new(config: &Config) -> Result<Self, ReadlineError> {
        let rl_config = RLConfig::builder()
            .auto_add_history(false)
            .edit_mode(config.get_edit_mode())
            .build();

        let editor = Editor::with_config(rl_config)?;
        Ok(Self { editor })
    }

    pub fn seed(&mut self, history: &History) {
        for entry in history.entries() {
            self.add_history(entry);
        }
        debug!("已载入 {} 条历史记录到编辑器", history.entries().len());
    }

    pub fn readline(&mut self, prompt: &str) -> Result<String, ReadlineError> {
        self.editor.readline(prompt)
    }

    pub fn add_history(&mut self, line: &str) {
        if let Err(e) = self.editor.add_history_entry(line) {
            warn!("无法添加历史记录: {}", e);
        }
    }
}
