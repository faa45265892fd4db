//! # 统一错误处理模块
//!
//! 定义 metal-id 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// metal-id 统一错误类型
#[derive(Error, Debug)]
pub enum MetalIdError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse {format} file: {path}\nReason: {reason}")]
    ParseError {
        format: String,
        path: String,
        reason: String,
    },

    // ─────────────────────────────────────────────────────────────
    // 外部命令错误
    // ─────────────────────────────────────────────────────────────
    #[error("External command '{command}' not found in PATH")]
    CommandNotFound { command: String },

    #[error("External command failed: {command}\n{stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("{tool} did not produce the expected output: {path}")]
    MissingToolOutput { tool: String, path: String },

    // ─────────────────────────────────────────────────────────────
    // 晶体学兼容性错误
    // ─────────────────────────────────────────────────────────────
    #[error("mtz files have incompatible symmetry (see {log})")]
    IncompatibleSymmetry { log: String },

    #[error("PDB files are not similar enough: {first} vs {second}")]
    ModelsNotSimilar { first: String, second: String },

    #[error("Could not find {column_type} data column in {file}")]
    MissingColumn { column_type: String, file: String },

    #[error("Could not find {label} data in {file}")]
    MissingSigmaColumn { label: String, file: String },

    #[error("Could not find AnoDe map {role}, expected at: {path}")]
    MissingAnomalousMap { role: String, path: String },

    // ─────────────────────────────────────────────────────────────
    // 渲染错误
    // ─────────────────────────────────────────────────────────────
    #[error("Protein mass center not found in output of '{command}'")]
    CentroidNotFound { command: String },

    #[error("Cannot orient view: peak at {position:?} coincides with the look-at point")]
    DegenerateView { position: [f64; 3] },

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ─────────────────────────────────────────────────────────────
    // CSV 错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, MetalIdError>;
