//! # 运行日志
//!
//! 每次运行创建一个 `RunLog`，写入输出目录下的 `metal_id.log`，
//! 同时以 `utils/output.rs` 的样式回显到终端。各阶段通过引用接收它，
//! 不使用全局 logger。
//!
//! ## 依赖关系
//! - 被所有流程阶段使用
//! - 使用 `utils/output.rs`

use crate::error::{MetalIdError, Result};
use crate::utils::output;

use std::cell::RefCell;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    /// 写入日志文件时的行前缀
    fn prefix(self) -> &'static str {
        match self {
            Level::Info => "",
            Level::Warn => "WARNING: ",
            Level::Error => "ERROR: ",
        }
    }
}

/// 运行日志上下文
pub struct RunLog {
    /// 日志文件（无文件时只回显）
    file: RefCell<Option<BufWriter<File>>>,
    /// 是否回显到终端
    echo: bool,
    /// 内存中的日志记录
    #[cfg(test)]
    entries: RefCell<Vec<(Level, String)>>,
}

impl RunLog {
    /// 创建写入 `path` 的运行日志，并回显到终端
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|e| MetalIdError::FileWriteError {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(Self {
            file: RefCell::new(Some(BufWriter::new(file))),
            echo: true,
            #[cfg(test)]
            entries: RefCell::new(Vec::new()),
        })
    }

    /// 只保留内存记录的静默日志
    #[cfg(test)]
    pub fn silent() -> Self {
        Self {
            file: RefCell::new(None),
            echo: false,
            entries: RefCell::new(Vec::new()),
        }
    }

    pub fn info(&self, msg: &str) {
        if self.echo {
            output::print_info(msg);
        }
        self.record(Level::Info, msg);
    }

    pub fn warn(&self, msg: &str) {
        if self.echo {
            output::print_warning(msg);
        }
        self.record(Level::Warn, msg);
    }

    pub fn error(&self, msg: &str) {
        if self.echo {
            output::print_error(msg);
        }
        self.record(Level::Error, msg);
    }

    pub fn success(&self, msg: &str) {
        if self.echo {
            output::print_success(msg);
        }
        self.record(Level::Info, msg);
    }

    /// 外部程序命令行（含 heredoc 脚本）
    pub fn command(&self, text: &str) {
        if self.echo {
            output::print_command(text);
        }
        self.record(Level::Info, &format!("Running command:\n{}", text));
    }

    /// 阶段标题
    pub fn header(&self, title: &str) {
        if self.echo {
            output::print_header(title);
        }
        self.record(Level::Info, &format!("\n### {} ###\n", title));
    }

    /// 指定级别的全部记录
    #[cfg(test)]
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    fn record(&self, level: Level, msg: &str) {
        if let Some(writer) = self.file.borrow_mut().as_mut() {
            // 日志写入失败不应中断流程
            writeln!(writer, "{}{}", level.prefix(), msg).ok();
        }
        #[cfg(test)]
        self.entries.borrow_mut().push((level, msg.to_string()));
    }

    /// 刷新日志文件
    pub fn flush(&self) {
        if let Some(writer) = self.file.borrow_mut().as_mut() {
            writer.flush().ok();
        }
    }
}

impl Drop for RunLog {
    fn drop(&mut self) {
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_log_records_levels() {
        let log = RunLog::silent();
        log.info("starting");
        log.warn("duplicate column");
        log.error("missing column");

        assert_eq!(log.messages(Level::Info), vec!["starting".to_string()]);
        assert_eq!(log.messages(Level::Warn).len(), 1);
        assert_eq!(log.messages(Level::Error)[0], "missing column");
    }

    #[test]
    fn test_log_file_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metal_id.log");
        {
            let log = RunLog::create(&path).unwrap();
            log.info("Outputting to: somewhere");
            log.warn("Peak list truncated");
        }
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "Outputting to: somewhere\nWARNING: Peak list truncated\n"
        );
    }
}
