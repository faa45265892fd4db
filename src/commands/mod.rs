//! # 命令执行模块
//!
//! 串联完整的 metal-id 流程：
//! 缩放 -> dimple (above) -> dimple (below) -> 双差值图与峰渲染。
//!
//! ## 输出目录结构
//! ```text
//! <output>/
//!   ├── metal_id.log
//!   ├── scaling/
//!   ├── dimple_above/   dimple_above.log
//!   ├── dimple_below/   dimple_below.log
//!   ├── diff.map  found_peaks.dat  found_peaks.csv
//!   └── peak_<n>.png
//! ```
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `scaling/`, `diffmap/`, `tools/`, `utils/`
//! - 子模块: dimple

pub mod dimple;

use crate::cli::{Cli, PdbSource};
use crate::diffmap::{calc_double_diff_maps, PeakSearch};
use crate::error::{MetalIdError, Result};
use crate::scaling::scale_data;
use crate::tools::{SystemRunner, ToolContext, ToolSet};
use crate::utils::{paths, RunLog};

use std::fs;
use std::path::{Path, PathBuf};

/// 一次运行的输入
#[derive(Debug, Clone)]
pub struct RunInputs {
    pub mtz_above: PathBuf,
    pub mtz_below: PathBuf,
    pub pdb: Vec<PdbSource>,
    pub search: PeakSearch,
}

/// 执行命令
pub fn run(cli: Cli) -> Result<()> {
    let output_dir = paths::create_unique_directory(&cli.output)?;
    let output_dir = fs::canonicalize(&output_dir).map_err(|e| MetalIdError::FileReadError {
        path: output_dir.display().to_string(),
        source: e,
    })?;

    let log = RunLog::create(&output_dir.join("metal_id.log"))?;
    log.info(&format!(
        "Running command: {}",
        std::env::args().collect::<Vec<_>>().join(" ")
    ));

    let inputs = RunInputs {
        mtz_above: absolute(&cli.mtz_above)?,
        mtz_below: absolute(&cli.mtz_below)?,
        pdb: cli.pdb,
        search: PeakSearch {
            threshold: cli.peak_threshold,
            max_peaks: cli.max_peaks,
        },
    };
    let tools = ToolSet::from(cli.tools);
    let runner = SystemRunner;
    let ctx = ToolContext::new(&runner, &tools, &log);

    let result = run_pipeline(&inputs, &output_dir, &ctx);
    if let Err(e) = &result {
        log.error(&e.to_string());
    }
    log.flush();
    result
}

/// 在已创建的输出目录中执行全部阶段
pub fn run_pipeline(inputs: &RunInputs, output_dir: &Path, ctx: &ToolContext) -> Result<()> {
    ctx.log.info(&format!("mtz_above = {}", inputs.mtz_above.display()));
    ctx.log.info(&format!("mtz_below = {}", inputs.mtz_below.display()));
    let pdb_list: Vec<String> = inputs.pdb.iter().map(ToString::to_string).collect();
    ctx.log.info(&format!("pdb = {}", pdb_list.join(", ")));
    ctx.log.info(&format!("Outputting to: {}", output_dir.display()));

    ctx.log.header("Scaling above data relative to the below data");
    let scaled = scale_data(&inputs.mtz_above, &inputs.mtz_below, output_dir, ctx)?;

    let models = stage_models(&inputs.pdb, output_dir)?;

    ctx.log.header("Running dimple on the 'above' data");
    let above = dimple::run_dimple(&scaled.above, &models, &output_dir.join("dimple_above"), ctx)?;

    ctx.log.header("Running dimple on the 'below' data");
    let below = dimple::run_dimple(
        &scaled.below,
        &[above.final_pdb.display().to_string()],
        &output_dir.join("dimple_below"),
        ctx,
    )?;

    ctx.log.header("Calculating map of element location");
    let peaks = calc_double_diff_maps(
        &above.final_pdb,
        &below.final_pdb,
        &above.anode_pha,
        &below.anode_pha,
        output_dir,
        &inputs.search,
        ctx,
    )?;

    ctx.log.success(&format!(
        "Found {} peak(s), results in {}",
        peaks.len(),
        output_dir.display()
    ));
    Ok(())
}

/// 本地模型文件复制到输出目录，PDB 代码原样传给 dimple
fn stage_models(sources: &[PdbSource], output_dir: &Path) -> Result<Vec<String>> {
    sources
        .iter()
        .map(|source| match source {
            PdbSource::File(path) => {
                let name = path.file_name().ok_or_else(|| {
                    MetalIdError::InvalidArgument(format!("Not a file: {}", path.display()))
                })?;
                let staged = output_dir.join(name);
                paths::copy_file(path, &staged)?;
                Ok(staged.display().to_string())
            }
            PdbSource::Code(code) => Ok(code.clone()),
        })
        .collect()
}

fn absolute(path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path).map_err(|e| MetalIdError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::mtz::tests::TestMtz;
    use crate::parsers::pdb::tests::pdb_text;
    use crate::tools::fake::FakeRunner;
    use crate::tools::ToolCommand;

    const CELL: [f64; 6] = [78.1, 78.1, 37.2, 90.0, 90.0, 90.0];

    /// dimple 写出模型和 pha，Coot / find-blobs 给出报告，render 写出 png
    fn responder(cmd: &ToolCommand) -> String {
        let cwd = cmd.working_dir.clone().unwrap_or_default();
        match cmd.program.as_str() {
            "dimple" => {
                let dir = Path::new(&cmd.args[cmd.args.len() - 3]);
                fs::create_dir_all(dir).unwrap();
                let model = pdb_text(CELL, "P 43 21 2", &[(" CA", [1.0, 2.0, 3.0])]);
                fs::write(dir.join("final.pdb"), model).unwrap();
                fs::write(dir.join("anode.pha"), "pha\n").unwrap();
                "dimple: done\n".to_string()
            }
            "coot" if cmd.args.last().map(String::as_str) == Some("coot_diff_map.py") => {
                fs::write(cwd.join("diff.map"), "map").unwrap();
                "0 dv: 0.9 n-rmsd: 11.2 xyz = (  5.0,  6.0,  7.0)\n".to_string()
            }
            "coot" => {
                fs::write(cwd.join("peak_1.r3d"), "r3d").unwrap();
                String::new()
            }
            "find-blobs" => "Protein mass center: xyz = ( 1.0, 1.0, 1.0)\n".to_string(),
            "render" => {
                fs::write(cwd.join(&cmd.args[1]), "png").unwrap();
                String::new()
            }
            _ => String::new(),
        }
    }

    #[test]
    fn test_full_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let input_dir = dir.path().join("input");
        fs::create_dir(&input_dir).unwrap();
        let mtz_above = TestMtz::with_data_columns(&[
            ("F", 'F'),
            ("SIGF", 'Q'),
            ("DANO", 'D'),
            ("SIGDANO", 'Q'),
        ])
        .write(&input_dir.join("above.mtz"));
        let mtz_below = TestMtz::with_data_columns(&[("F", 'F'), ("SIGF", 'Q')])
            .write(&input_dir.join("below.mtz"));
        let model = input_dir.join("start.pdb");
        fs::write(&model, pdb_text(CELL, "P 43 21 2", &[(" CA", [1.0, 2.0, 3.0])])).unwrap();

        let output_dir = dir.path().join("metal_id");
        fs::create_dir(&output_dir).unwrap();

        let runner = FakeRunner::with_responder(responder);
        let tools = ToolSet::default();
        let log = RunLog::silent();
        let ctx = ToolContext::new(&runner, &tools, &log);

        let inputs = RunInputs {
            mtz_above,
            mtz_below,
            pdb: vec![PdbSource::File(model), PdbSource::Code("1abc".to_string())],
            search: PeakSearch::default(),
        };
        run_pipeline(&inputs, &output_dir, &ctx).unwrap();

        assert_eq!(
            runner.programs(),
            vec![
                "pointless", "cad", "scaleit", "mtzutils", "dimple", "dimple", "coot", "find-blobs",
                "coot", "render"
            ]
        );
        assert!(output_dir.join("start.pdb").is_file());
        assert!(output_dir.join("found_peaks.dat").is_file());
        assert!(output_dir.join("peak_1.png").is_file());

        let calls = runner.calls.borrow();
        let dimple_above = &calls[4].args;
        assert_eq!(
            dimple_above[0],
            output_dir.join("scaling/above_reindexed_scaled.mtz").display().to_string()
        );
        assert_eq!(dimple_above[1], output_dir.join("start.pdb").display().to_string());
        assert_eq!(dimple_above[2], "1abc");

        let dimple_below = &calls[5].args;
        assert_eq!(
            dimple_below[1],
            output_dir.join("dimple_above/final.pdb").display().to_string()
        );
    }

    #[test]
    fn test_stage_models_keeps_codes() {
        let dir = tempfile::tempdir().unwrap();
        let staged = stage_models(&[PdbSource::Code("4abc".to_string())], dir.path()).unwrap();
        assert_eq!(staged, vec!["4abc"]);
    }
}
