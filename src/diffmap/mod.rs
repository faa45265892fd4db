//! # 双差值图阶段
//!
//! 比较两次 dimple 精修得到的模型，计算 above - below 反常差值图，
//! 找出金属位点候选峰，写出峰列表并渲染图像。
//!
//! ## 输出文件
//! - `final.pdb`, `above.pha`, `below.pha`: 输入副本
//! - `diff.map`: 双差值图
//! - `found_peaks.dat`, `found_peaks.csv`: 峰列表
//! - `peak_<n>.png`: 峰图像
//!
//! ## 依赖关系
//! - 被 `commands/mod.rs` 使用
//! - 使用 `analysis/similarity.rs`, `tools/`
//! - 子模块: peaks, render

pub mod peaks;
pub mod render;

pub use peaks::{make_double_diff_map_and_get_peaks, PeakSearch};
pub use render::render_diff_map_peaks;

use crate::analysis::are_pdbs_similar;
use crate::error::{MetalIdError, Result};
use crate::models::{Peak, SymmetryTolerance};
use crate::tools::ToolContext;
use crate::utils::paths;

use serde::Serialize;
use std::path::Path;
use tabled::{Table, Tabled};

/// 峰列表中的一行
#[derive(Debug, Clone, Serialize, Tabled)]
struct PeakRow {
    #[serde(rename = "peak")]
    #[tabled(rename = "Peak")]
    index: usize,
    #[serde(rename = "density_e_per_A3")]
    #[tabled(rename = "Density (e/Å³)")]
    density: f64,
    #[serde(rename = "rmsd")]
    #[tabled(rename = "RMSD")]
    score: f64,
    #[tabled(rename = "X")]
    x: f64,
    #[tabled(rename = "Y")]
    y: f64,
    #[tabled(rename = "Z")]
    z: f64,
}

impl PeakRow {
    fn new(index: usize, peak: &Peak) -> Self {
        let [x, y, z] = peak.position;
        PeakRow {
            index,
            density: peak.density,
            score: peak.score,
            x,
            y,
            z,
        }
    }
}

/// 从两组 dimple 结果计算双差值图并渲染峰
///
/// `pdb_above` 作为参考模型。返回保留的峰。
pub fn calc_double_diff_maps(
    pdb_above: &Path,
    pdb_below: &Path,
    pha_above: &Path,
    pha_below: &Path,
    output_dir: &Path,
    search: &PeakSearch,
    ctx: &ToolContext,
) -> Result<Vec<Peak>> {
    for (role, path) in [("above", pha_above), ("below", pha_below)] {
        if !path.is_file() {
            return Err(MetalIdError::MissingAnomalousMap {
                role: role.to_string(),
                path: path.display().to_string(),
            });
        }
    }

    ctx.log.info(&format!(
        "Checking pdb files for similarity. Files: {}, {}",
        pdb_above.display(),
        pdb_below.display()
    ));
    if !are_pdbs_similar(pdb_above, pdb_below, &SymmetryTolerance::default(), ctx.log)? {
        ctx.log.error("PDB files are not similar enough, not running metal_id");
        return Err(MetalIdError::ModelsNotSimilar {
            first: pdb_above.display().to_string(),
            second: pdb_below.display().to_string(),
        });
    }
    ctx.log.info("PDB files are similar enough, continuing with metal_id");

    ctx.log.info("Copying input files to working directory");
    let pdb_file = output_dir.join("final.pdb");
    let map_above = output_dir.join("above.pha");
    let map_below = output_dir.join("below.pha");
    paths::copy_file(pdb_above, &pdb_file)?;
    paths::copy_file(pha_above, &map_above)?;
    paths::copy_file(pha_below, &map_below)?;

    ctx.log.header("Making double difference map");
    ctx.log.info(&format!(
        "Using {} as reference coordinates for map",
        pdb_above.display()
    ));
    let map_out = output_dir.join("diff.map");
    let peaks = make_double_diff_map_and_get_peaks(
        &map_above, &map_below, output_dir, &pdb_file, &map_out, search, ctx,
    )?;

    ctx.log.info(&format!(
        "The first peaks reported (up to a maximum of {}) above the threshold of {} rmsd:",
        search.max_peaks, search.threshold
    ));
    let lines: Vec<String> = peaks
        .iter()
        .enumerate()
        .map(|(i, peak)| peak_line(i + 1, peak))
        .collect();
    for line in &lines {
        ctx.log.info(line);
    }
    let mut dat = lines.join("\n");
    if !dat.is_empty() {
        dat.push('\n');
    }
    paths::write_text(&output_dir.join("found_peaks.dat"), &dat)?;

    let rows: Vec<PeakRow> = peaks
        .iter()
        .enumerate()
        .map(|(i, peak)| PeakRow::new(i + 1, peak))
        .collect();
    save_peaks_csv(&rows, &output_dir.join("found_peaks.csv"))?;
    if rows.is_empty() {
        ctx.log.warn(&format!("No peaks found above {} rmsd", search.threshold));
    } else {
        println!("{}", Table::new(&rows));
    }

    ctx.log.header("Rendering images of peaks");
    let images = render_diff_map_peaks(
        output_dir,
        &pdb_file,
        &map_out,
        search.threshold,
        &peaks,
        ctx,
    )?;
    ctx.log.success(&format!("Rendered {} peak image(s)", images.len()));

    Ok(peaks)
}

/// `found_peaks.dat` 中的一行
fn peak_line(index: usize, peak: &Peak) -> String {
    let [x, y, z] = peak.position;
    format!(
        "Peak {}: Electron Density = {:?} e/Å^3, RMSD = {:?}, XYZ = ({:?}, {:?}, {:?})",
        index, peak.density, peak.score, x, y, z
    )
}

fn save_peaks_csv(rows: &[PeakRow], output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush().map_err(|e| MetalIdError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::pdb::tests::pdb_text;
    use crate::tools::fake::FakeRunner;
    use crate::tools::{ToolCommand, ToolSet};
    use crate::utils::RunLog;
    use std::fs;
    use std::path::PathBuf;

    const CELL: [f64; 6] = [78.1, 78.1, 37.2, 90.0, 90.0, 90.0];

    fn responder(cmd: &ToolCommand) -> String {
        let dir = cmd.working_dir.clone().unwrap_or_default();
        match cmd.program.as_str() {
            "coot" if cmd.args.last().map(String::as_str) == Some("coot_diff_map.py") => {
                fs::write(dir.join("diff.map"), "map").unwrap();
                "1 dv: 10.0 n-rmsd: 5.0 xyz = ( 1.0, 2.0, 3.0)\n\
                 2 dv: 8.0 n-rmsd: 4.0 xyz = ( 4.0, 5.0, 6.0)\n"
                    .to_string()
            }
            "coot" => {
                for n in 1..=2 {
                    fs::write(dir.join(format!("peak_{}.r3d", n)), "r3d").unwrap();
                }
                String::new()
            }
            "find-blobs" => "Protein mass center: xyz = ( 20.0, 20.0, 20.0)\n".to_string(),
            _ => String::new(),
        }
    }

    struct Inputs {
        pdb_above: PathBuf,
        pdb_below: PathBuf,
        pha_above: PathBuf,
        pha_below: PathBuf,
    }

    fn inputs(dir: &Path, shift: f64) -> Inputs {
        let write = |name: &str, text: String| {
            let path = dir.join(name);
            fs::write(&path, text).unwrap();
            path
        };
        Inputs {
            pdb_above: write("above.pdb", pdb_text(CELL, "P 43 21 2", &[(" CA", [1.0, 2.0, 3.0])])),
            pdb_below: write(
                "below.pdb",
                pdb_text(CELL, "P 43 21 2", &[(" CA", [1.0 + shift, 2.0, 3.0])]),
            ),
            pha_above: write("anode_above.pha", "pha".to_string()),
            pha_below: write("anode_below.pha", "pha".to_string()),
        }
    }

    #[test]
    fn test_peak_line_format() {
        let peak = Peak::new([24.08, 12.31, 28.48], 0.81, 12.4);
        assert_eq!(
            peak_line(1, &peak),
            "Peak 1: Electron Density = 0.81 e/Å^3, RMSD = 12.4, XYZ = (24.08, 12.31, 28.48)"
        );
    }

    #[test]
    fn test_full_stage_writes_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let input = inputs(dir.path(), 0.2);
        let out = dir.path().join("out");
        fs::create_dir(&out).unwrap();

        let runner = FakeRunner::with_responder(responder);
        let tools = ToolSet::default();
        let log = RunLog::silent();
        let ctx = ToolContext::new(&runner, &tools, &log);

        let peaks = calc_double_diff_maps(
            &input.pdb_above,
            &input.pdb_below,
            &input.pha_above,
            &input.pha_below,
            &out,
            &PeakSearch::default(),
            &ctx,
        )
        .unwrap();

        assert_eq!(peaks.len(), 2);
        for name in ["final.pdb", "above.pha", "below.pha", "diff.map", "found_peaks.csv"] {
            assert!(out.join(name).is_file(), "{}", name);
        }

        let dat = fs::read_to_string(out.join("found_peaks.dat")).unwrap();
        assert_eq!(
            dat,
            "Peak 1: Electron Density = 10.0 e/Å^3, RMSD = 5.0, XYZ = (1.0, 2.0, 3.0)\n\
             Peak 2: Electron Density = 8.0 e/Å^3, RMSD = 4.0, XYZ = (4.0, 5.0, 6.0)\n"
        );

        let csv_text = fs::read_to_string(out.join("found_peaks.csv")).unwrap();
        let mut lines = csv_text.lines();
        assert_eq!(lines.next(), Some("peak,density_e_per_A3,rmsd,x,y,z"));
        assert_eq!(lines.next(), Some("1,10.0,5.0,1.0,2.0,3.0"));

        assert_eq!(
            runner.programs(),
            vec!["coot", "find-blobs", "coot", "render", "render"]
        );
    }

    #[test]
    fn test_dissimilar_models_stop_stage() {
        let dir = tempfile::tempdir().unwrap();
        let input = inputs(dir.path(), 6.0);
        let out = dir.path().join("out");
        fs::create_dir(&out).unwrap();

        let runner = FakeRunner::with_responder(responder);
        let tools = ToolSet::default();
        let log = RunLog::silent();
        let ctx = ToolContext::new(&runner, &tools, &log);

        let err = calc_double_diff_maps(
            &input.pdb_above,
            &input.pdb_below,
            &input.pha_above,
            &input.pha_below,
            &out,
            &PeakSearch::default(),
            &ctx,
        )
        .unwrap_err();

        assert!(matches!(err, MetalIdError::ModelsNotSimilar { .. }));
        assert!(runner.programs().is_empty());
        assert!(!out.join("final.pdb").exists());
    }

    #[test]
    fn test_missing_pha_checked_first() {
        let dir = tempfile::tempdir().unwrap();
        let input = inputs(dir.path(), 0.0);
        fs::remove_file(&input.pha_above).unwrap();

        let runner = FakeRunner::new();
        let tools = ToolSet::default();
        let log = RunLog::silent();
        let ctx = ToolContext::new(&runner, &tools, &log);

        let err = calc_double_diff_maps(
            &input.pdb_above,
            &input.pdb_below,
            &input.pha_above,
            &input.pha_below,
            dir.path(),
            &PeakSearch::default(),
            &ctx,
        )
        .unwrap_err();

        match err {
            MetalIdError::MissingAnomalousMap { role, .. } => assert_eq!(role, "above"),
            other => panic!("unexpected error {:?}", other),
        }
    }
}
