//! # dimple 精修阶段
//!
//! 对一组反射数据运行 dimple，得到精修模型 `final.pdb` 和反常差值图 `anode.pha`。
//!
//! ## 依赖关系
//! - 被 `commands/mod.rs` 使用
//! - 使用 `tools/`

use crate::error::Result;
use crate::tools::{self, ToolCommand, ToolContext};

use std::path::{Path, PathBuf};

/// dimple 的固定输出
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimpleOutput {
    pub final_pdb: PathBuf,
    pub anode_pha: PathBuf,
}

impl DimpleOutput {
    fn in_dir(dir: &Path) -> Self {
        DimpleOutput {
            final_pdb: dir.join("final.pdb"),
            anode_pha: dir.join("anode.pha"),
        }
    }
}

/// 运行 `dimple <mtz> <models...> <dir> --anode -fpng`
///
/// `models` 可以是文件路径或 PDB 代码。输出记录到 `<dir>.log`。
pub fn run_dimple(
    mtz: &Path,
    models: &[String],
    dimple_dir: &Path,
    ctx: &ToolContext,
) -> Result<DimpleOutput> {
    let mut command = ToolCommand::new(&ctx.tools.dimple).path_arg(mtz);
    for model in models {
        command = command.arg(model.as_str());
    }
    let command = command.path_arg(dimple_dir).arg("--anode").arg("-fpng");

    let log_path = dimple_dir.with_extension("log");
    let text = ctx.run_and_capture(&command, &log_path)?;
    ctx.log.info(&format!("Captured output from dimple:\n{}", text.trim_end()));

    let output = DimpleOutput::in_dir(dimple_dir);
    tools::require_output("dimple", &output.final_pdb)?;
    Ok(output)
}
