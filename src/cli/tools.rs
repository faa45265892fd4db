//! # 外部程序路径参数
//!
//! 每个外部程序都可以通过 `--<tool>-bin` 或环境变量 `METAL_ID_<TOOL>` 替换。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 转换为 `tools::ToolSet`

use crate::tools::ToolSet;

use clap::Args;

/// 外部程序参数
#[derive(Args, Debug, Clone)]
#[command(next_help_heading = "External programs")]
pub struct ToolArgs {
    /// POINTLESS executable
    #[arg(long, env = "METAL_ID_POINTLESS", default_value = "pointless")]
    pub pointless_bin: String,

    /// TRUNCATE executable
    #[arg(long, env = "METAL_ID_TRUNCATE", default_value = "truncate")]
    pub truncate_bin: String,

    /// CAD executable
    #[arg(long, env = "METAL_ID_CAD", default_value = "cad")]
    pub cad_bin: String,

    /// SCALEIT executable
    #[arg(long, env = "METAL_ID_SCALEIT", default_value = "scaleit")]
    pub scaleit_bin: String,

    /// MTZUTILS executable
    #[arg(long, env = "METAL_ID_MTZUTILS", default_value = "mtzutils")]
    pub mtzutils_bin: String,

    /// dimple executable
    #[arg(long, env = "METAL_ID_DIMPLE", default_value = "dimple")]
    pub dimple_bin: String,

    /// Coot executable
    #[arg(long, env = "METAL_ID_COOT", default_value = "coot")]
    pub coot_bin: String,

    /// find-blobs executable
    #[arg(long, env = "METAL_ID_FIND_BLOBS", default_value = "find-blobs")]
    pub find_blobs_bin: String,

    /// Raster3D render executable
    #[arg(long, env = "METAL_ID_RENDER", default_value = "render")]
    pub render_bin: String,
}

impl From<ToolArgs> for ToolSet {
    fn from(args: ToolArgs) -> Self {
        ToolSet {
            pointless: args.pointless_bin,
            truncate: args.truncate_bin,
            cad: args.cad_bin,
            scaleit: args.scaleit_bin,
            mtzutils: args.mtzutils_bin,
            dimple: args.dimple_bin,
            coot: args.coot_bin,
            find_blobs: args.find_blobs_bin,
            render: args.render_bin,
        }
    }
}
