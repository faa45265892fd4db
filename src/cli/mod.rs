//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数。metal-id 只有一个入口，没有子命令。
//!
//! ```text
//! metal-id <MTZ_ABOVE> <MTZ_BELOW> <PDB>... [-o DIR] [--peak-threshold N] [--max-peaks N]
//! ```
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 参数传递给 `commands/mod.rs`
//! - 子模块: tools

pub mod tools;

use clap::Parser;
use std::fmt;
use std::path::PathBuf;

/// 模型输入：本地 PDB 文件或四字符 PDB 代码
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdbSource {
    File(PathBuf),
    Code(String),
}

impl fmt::Display for PdbSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PdbSource::File(path) => write!(f, "{}", path.display()),
            PdbSource::Code(code) => write!(f, "{}", code),
        }
    }
}

/// 解析模型输入，已存在的文件优先于代码
pub fn parse_pdb_source(value: &str) -> Result<PdbSource, String> {
    let path = PathBuf::from(value);
    if path.is_file() {
        Ok(PdbSource::File(path))
    } else if value.len() == 4 && value.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(PdbSource::Code(value.to_string()))
    } else {
        Err(format!(
            "Invalid pdb input: '{}', must be a valid four-character pdb code or an existing file path",
            value
        ))
    }
}

/// 反射文件必须存在
pub fn mtz_exists(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if path.is_file() {
        Ok(path)
    } else {
        Err(format!("File not found: '{}'", value))
    }
}

/// metal-id - 从吸收边上下的反常数据定位金属位点
#[derive(Parser, Debug)]
#[command(name = "metal-id")]
#[command(version)]
#[command(
    about = "Locate a given element from data collected above and below the element's absorption edge",
    long_about = None
)]
pub struct Cli {
    /// MTZ file containing data collected above the absorption edge
    #[arg(value_parser = mtz_exists)]
    pub mtz_above: PathBuf,

    /// MTZ file containing data collected below the absorption edge
    #[arg(value_parser = mtz_exists)]
    pub mtz_below: PathBuf,

    /// PDB file(s) and/or 4 character PDB codes
    #[arg(required = true, num_args = 1.., value_parser = parse_pdb_source)]
    pub pdb: Vec<PdbSource>,

    /// Output directory; a numerical suffix is added if it already exists
    #[arg(short, long, default_value = "metal_id")]
    pub output: PathBuf,

    /// Peak height threshold (rmsd) that peaks must exceed to be detected
    #[arg(long, default_value_t = 5.0)]
    pub peak_threshold: f64,

    /// Maximum number of peaks to keep
    #[arg(long, default_value_t = 10)]
    pub max_peaks: usize,

    #[command(flatten)]
    pub tools: tools::ToolArgs,
}
