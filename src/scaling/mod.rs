//! # 数据缩放流程
//!
//! 把吸收边上方 (above) 的数据缩放到下方 (below) 数据的尺度上，
//! 使两组反常差值图可以直接相减。
//!
//! ## 流程
//! 1. 复制输入到 `scaling/` 工作目录
//! 2. POINTLESS 以 below 为参考重新指标化 above，对称性不兼容时终止
//! 3. 两组数据分别确保有振幅列 (TRUNCATE)
//! 4. 解析所需列：below 的 F，above 的 F 和 DANO
//! 5. CAD 把 below 的振幅作为参考列并入 above
//! 6. SCALEIT 精修缩放因子
//! 7. MTZUTILS 删除参考列
//!
//! 任何一步失败都返回错误，不重试。
//!
//! ## 依赖关系
//! - 被 `commands/mod.rs` 使用
//! - 使用 `tools/`, `parsers/mtz.rs`, `parsers/ccp4_log.rs`
//! - 子模块: columns, amplitudes

pub mod amplitudes;
pub mod columns;

pub use amplitudes::calc_amplitudes;
pub use columns::find_cols_from_type;

use crate::error::{MetalIdError, Result};
use crate::models::{ColumnType, ReflectionFile};
use crate::parsers::{ccp4_log, mtz};
use crate::tools::script::{assignments, numbered_assignments};
use crate::tools::{self, ControlScript, ToolCommand, ToolContext};
use crate::utils::paths;

use std::path::{Path, PathBuf};

/// 缩放结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaledData {
    /// 缩放后的 above 数据
    pub above: PathBuf,
    /// 作为参考的 below 数据（工作目录中的副本，可能经过 TRUNCATE）
    pub below: PathBuf,
}

/// 执行完整的缩放流程，中间文件写入 `output_dir/scaling`
pub fn scale_data(
    mtz_above: &Path,
    mtz_below: &Path,
    output_dir: &Path,
    ctx: &ToolContext,
) -> Result<ScaledData> {
    let scaling_dir = output_dir.join("scaling");
    paths::create_dir(&scaling_dir)?;

    let (above, below) = copy_inputs(mtz_above, mtz_below, &scaling_dir)?;

    // 统一空间群和指标
    let reindexed = scaling_dir.join(format!("{}_reindexed.mtz", paths::file_stem(&above)));
    ctx.log
        .info("Running pointless to ensure above and below data are in the same space group");
    let pointless = ToolCommand::new(&ctx.tools.pointless)
        .keyed_path("hklin", &above)
        .keyed_path("hklout", &reindexed)
        .keyed_path("hklref", &below);
    let pointless_log = scaling_dir.join("pointless.log");
    let text = ctx.run_and_capture(&pointless, &pointless_log)?;

    if ccp4_log::detect_symmetry_failure(&text) {
        ctx.log.error("mtz files have incompatible symmetry");
        return Err(MetalIdError::IncompatibleSymmetry {
            log: pointless_log.display().to_string(),
        });
    }
    tools::require_output("pointless", &reindexed)?;

    let below = read_reflections(below)?;
    let above = read_reflections(reindexed)?;

    let below = calc_amplitudes(below, &scaling_dir, ctx)?;
    let above = calc_amplitudes(above, &scaling_dir, ctx)?;

    let below_name = below.path.display().to_string();
    let above_name = above.path.display().to_string();
    ctx.log.info(&format!("{}: {}", below_name, below.dataset.summary()));
    ctx.log.info(&format!("{}: {}", above_name, above.dataset.summary()));
    let f_nat = find_cols_from_type(&below.dataset, ColumnType::Amplitude, &below_name, ctx.log)?;
    let f_der = find_cols_from_type(&above.dataset, ColumnType::Amplitude, &above_name, ctx.log)?;
    let dano_der = find_cols_from_type(
        &above.dataset,
        ColumnType::AnomalousDifference,
        &above_name,
        ctx.log,
    )?;

    let stem = paths::file_stem(&above.path);

    // 并入参考列
    let combined = scaling_dir.join(format!("{}_combined.mtz", stem));
    let derivative_labels = match above.dataset.first_data_column_labels() {
        Some(labels) => labels,
        None => {
            ctx.log.warn(&format!(
                "No crystal dataset found in {}, passing all data columns to CAD",
                above_name
            ));
            above
                .dataset
                .columns
                .iter()
                .filter(|c| c.kind != ColumnType::Index)
                .map(|c| c.label.as_str())
                .collect()
        }
    };
    let cad_script = ControlScript::new()
        .card("TITLE", ["Add data for scaling"])
        .card(
            "LABIN FILE 2",
            assignments([("E1", f_nat.value.as_str()), ("E2", f_nat.sigma.as_str())]),
        )
        .card("LABIN FILE 1", numbered_assignments(&derivative_labels))
        .card("LABOUT FILE 2", assignments([("E1", "Fscale"), ("E2", "SIGFscale")]))
        .card("DNAME FILE_NUMBER 2", ["ALL=refData"])
        .flag("SYSAB_KEEP");

    ctx.log.info("Adding reference columns to data for scaling with CAD");
    let cad = ToolCommand::new(&ctx.tools.cad)
        .keyed_path("hklin1", &above.path)
        .keyed_path("hklin2", &below.path)
        .keyed_path("hklout", &combined)
        .script(cad_script);
    ctx.run_and_capture(&cad, &scaling_dir.join("cad.log"))?;
    tools::require_output("cad", &combined)?;

    // 缩放
    let combined_scaled = scaling_dir.join(format!("{}_combined_scaled.mtz", stem));
    let scaleit_script = ControlScript::new()
        .card("TITLE", ["Scale data using added ref data"])
        .card(
            "LABIN",
            assignments([
                ("FP", "Fscale"),
                ("SIGFP", "SIGFscale"),
                ("FPH1", f_der.value.as_str()),
                ("SIGFPH1", f_der.sigma.as_str()),
                ("DPH1", dano_der.value.as_str()),
                ("SIGDPH1", dano_der.sigma.as_str()),
            ]),
        )
        .flag("AUTO")
        .flag("WEIGHT")
        .card("REFINE", ["SCALE"]);

    ctx.log.info("Scaling data with SCALEIT");
    let scaleit = ToolCommand::new(&ctx.tools.scaleit)
        .keyed_path("hklin", &combined)
        .keyed_path("hklout", &combined_scaled)
        .script(scaleit_script);
    ctx.run_and_capture(&scaleit, &scaling_dir.join("scaleit.log"))?;
    tools::require_output("scaleit", &combined_scaled)?;

    // 删除参考列
    let scaled = scaling_dir.join(format!("{}_scaled.mtz", stem));
    ctx.log.info(&format!(
        "Removing scaling columns from {} with mtzutils",
        combined_scaled.display()
    ));
    let mtzutils = ToolCommand::new(&ctx.tools.mtzutils)
        .keyed_path("hklin", &combined_scaled)
        .keyed_path("hklout", &scaled)
        .script(ControlScript::new().card("EXCLUDE", ["Fscale", "SIGFscale"]));
    ctx.run_and_capture(&mtzutils, &scaling_dir.join("mtzutils.log"))?;
    tools::require_output("mtzutils", &scaled)?;

    ctx.log.success(&format!("Scaled data written to {}", scaled.display()));
    Ok(ScaledData {
        above: scaled,
        below: below.path,
    })
}

/// 复制两个输入文件；文件名相同时加 `above_` / `below_` 前缀
fn copy_inputs(mtz_above: &Path, mtz_below: &Path, dir: &Path) -> Result<(PathBuf, PathBuf)> {
    let name_of = |path: &Path| -> Result<String> {
        path.file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| MetalIdError::InvalidArgument(format!("Not a file: {}", path.display())))
    };
    let above_name = name_of(mtz_above)?;
    let below_name = name_of(mtz_below)?;

    let (above_name, below_name) = if above_name == below_name {
        (format!("above_{}", above_name), format!("below_{}", below_name))
    } else {
        (above_name, below_name)
    };

    let above = dir.join(above_name);
    let below = dir.join(below_name);
    paths::copy_file(mtz_above, &above)?;
    paths::copy_file(mtz_below, &below)?;
    Ok((above, below))
}

fn read_reflections(path: PathBuf) -> Result<ReflectionFile> {
    let dataset = mtz::read_mtz_file(&path)?;
    Ok(ReflectionFile { path, dataset })
}
