use crate::utils::config::Config;
use chrono::Local;
use env_logger::{Builder, Target};
use log::LevelFilter;
use std::fs::{self, File};
use std::io::Write;
use std::process;

pub fn parse_level(level: &str) -> LevelFilter {
    match level {
        level if level.eq_ignore_ascii_case("error") => LevelFilter::Error,
        level if level.eq_ignore_ascii_case("warn") => LevelFilter::Warn,
        level if level.eq_ignore_ascii_case("info") => LevelFilter::Info,
        level if level.eq_ignore_ascii_case("debug") => LevelFilter::Debug,
        level if level.eq_ignore_ascii_case("trace") => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// 日志只写入文件，stdout 属于管道数据通道。
/// 日志文件无法创建时退回到 stderr，且只输出 warn 以上级别。
pub fn init_logger(config: &Config) {
    let mut level = parse_level(&config.logger_level);

    let target = match open_log_file(config) {
        Ok(file) => Target::Pipe(Box::new(file)),
        Err(e) => {
            eprintln!(
                "{}: cannot open log file in {}: {}",
                config.name,
                config.logger_dir.display(),
                e
            );
            level = level.min(LevelFilter::Warn);
            Target::Stderr
        }
    };

    let initialized = Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "[PID:{}][{}] {} - {}",
                process::id(),
                record.level(),
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.args()
            )
        })
        .target(target)
        .filter(Some(&config.name), level)
        .filter(None, LevelFilter::Warn)
        .try_init();

    if initialized.is_ok() {
        log::debug!("日志级别设置为: {}", level);
    }
}

fn open_log_file(config: &Config) -> std::io::Result<File> {
    fs::create_dir_all(&config.logger_dir)?;
    let date = Local::now().format("%Y-%m-%d");
    let log_file = config.logger_dir.join(format!("{}_{}.log", config.name, date));
    File::options().create(true).append(true).open(log_file)
}
