//! # 峰图像渲染
//!
//! 每个峰生成一张从峰位置看向蛋白质质心的图像：
//! find-blobs 给出质心，Coot 写出 Raster3D 文件，`render` 转为 PNG。
//!
//! Coot 对命令长度有限制，脚本中一律使用相对工作目录的路径。
//!
//! ## 依赖关系
//! - 被 `diffmap/mod.rs` 使用
//! - 使用 `analysis/geometry.rs`, `parsers/coot.rs`, `tools/coot.rs`

use crate::analysis::view_as_quat;
use crate::error::{MetalIdError, Result};
use crate::models::{Peak, RenderJob};
use crate::parsers::coot as coot_report;
use crate::tools::coot::xyz_args;
use crate::tools::{CootArg, CootScript, ToolCommand, ToolContext};
use crate::utils::paths;

use std::path::{Path, PathBuf};

/// 渲染视野大小
const ZOOM: f64 = 30.0;

/// 用 find-blobs 求蛋白质质心
pub fn find_protein_centre(
    working_dir: &Path,
    pdb_file: &Path,
    ctx: &ToolContext,
) -> Result<[f64; 3]> {
    let command = ToolCommand::new(&ctx.tools.find_blobs)
        .arg("-c")
        .path_arg(&paths::relative_to(pdb_file, working_dir))
        .current_dir(working_dir);
    let text = ctx.run_and_capture(&command, &working_dir.join("find_blobs.log"))?;

    coot_report::parse_mass_centre(&text).ok_or_else(|| MetalIdError::CentroidNotFound {
        command: command.display(),
    })
}

/// 渲染每个峰，返回生成的 PNG 路径
///
/// 与质心重合的峰没有视线方向，跳过并记录警告。
pub fn render_diff_map_peaks(
    working_dir: &Path,
    pdb_file: &Path,
    diff_map: &Path,
    threshold: f64,
    peaks: &[Peak],
    ctx: &ToolContext,
) -> Result<Vec<PathBuf>> {
    if peaks.is_empty() {
        return Ok(Vec::new());
    }

    ctx.log.info("Finding protein centre");
    let centre = find_protein_centre(working_dir, pdb_file, ctx)?;
    ctx.log.info(&format!(
        "Protein mass centre at: ({:.2}, {:.2}, {:.2})",
        centre[0], centre[1], centre[2]
    ));

    let mut jobs = Vec::with_capacity(peaks.len());
    for (i, peak) in peaks.iter().enumerate() {
        let quaternion = match view_as_quat(Some(peak.position), Some(centre)) {
            Ok(q) => q,
            Err(e @ MetalIdError::DegenerateView { .. }) => {
                ctx.log.warn(&format!("{}, skipping image for peak {}", e, i + 1));
                continue;
            }
            Err(e) => return Err(e),
        };
        jobs.push(RenderJob {
            index: i + 1,
            peak: *peak,
            quaternion,
            raster_path: PathBuf::from(format!("peak_{}.r3d", i + 1)),
        });
    }
    if jobs.is_empty() {
        ctx.log.warn("No peaks can be rendered");
        return Ok(Vec::new());
    }

    let script = render_script(
        &paths::relative_to(pdb_file, working_dir),
        &paths::relative_to(diff_map, working_dir),
        threshold,
        &jobs,
    );
    let script_path = working_dir.join("coot_render.py");
    paths::write_text(&script_path, &script.to_text())?;

    ctx.log
        .info(&format!("Running coot rendering script {}", script_path.display()));
    let command = ToolCommand::new(&ctx.tools.coot)
        .arg("--no-guano")
        .arg("--no-graphics")
        .arg("-s")
        .arg("coot_render.py")
        .current_dir(working_dir);
    ctx.run_and_capture(&command, &working_dir.join("coot_render.log"))?;

    ctx.log.info("Converting r3d files to pngs");
    let mut images = Vec::new();
    for job in &jobs {
        let raster = working_dir.join(&job.raster_path);
        if !raster.is_file() {
            ctx.log.warn(&format!(
                "Coot did not write {}, skipping image for peak {}",
                raster.display(),
                job.index
            ));
            continue;
        }

        let png = job.png_path();
        ctx.log.info(&format!(
            "Converting {} to {}",
            job.raster_path.display(),
            png.display()
        ));
        let convert = ToolCommand::new(&ctx.tools.render)
            .arg("-png")
            .path_arg(&png)
            .stdin_file(&raster)
            .current_dir(working_dir);
        let render_log = working_dir.join(format!("peak_{}_render.log", job.index));
        ctx.run_and_capture(&convert, &render_log)?;

        let png = working_dir.join(png);
        if !png.is_file() {
            ctx.log.warn(&format!(
                "render did not write {}, see {}",
                png.display(),
                render_log.display()
            ));
            continue;
        }
        images.push(png);
    }

    Ok(images)
}

/// 加载模型和差值图，然后逐个峰设置视角并导出 Raster3D
fn render_script(
    pdb_file: &Path,
    diff_map: &Path,
    threshold: f64,
    jobs: &[RenderJob],
) -> CootScript {
    let mut script = CootScript::new()
        .call("read_pdb", vec![CootArg::path(pdb_file)])
        .call("read_ccp4_map", vec![CootArg::path(diff_map), CootArg::Int(1)])
        .call(
            "set_contour_level_in_sigma",
            vec![CootArg::Int(1), CootArg::Float(threshold)],
        );

    for job in jobs {
        script = script
            .call("set_rotation_centre", xyz_args(job.peak.position))
            .call("set_zoom", vec![CootArg::Float(ZOOM)])
            .call(
                "set_view_quaternion",
                job.quaternion.iter().map(|v| CootArg::Float(*v)).collect(),
            )
            .call("graphics_draw", Vec::new())
            .call("raster3d", vec![CootArg::path(&job.raster_path)]);
    }
    script.exit()
}
