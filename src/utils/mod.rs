//! # 工具函数模块
//!
//! 提供美化输出、运行日志、进度指示和路径处理等工具。
//!
//! ## 依赖关系
//! - 被 `commands/`, `scaling/`, `diffmap/`, `tools/` 模块使用
//! - 子模块: output, log, progress, paths

pub mod log;
pub mod output;
pub mod paths;
pub mod progress;

pub use log::RunLog;
