//! # 双差值图与峰搜索
//!
//! 用 Coot 从 above / below 两组反常图计算差值图，并从报告中提取峰。
//!
//! ## 依赖关系
//! - 被 `diffmap/mod.rs` 使用
//! - 使用 `tools/coot.rs`, `parsers/coot.rs`

use crate::error::{MetalIdError, Result};
use crate::models::Peak;
use crate::parsers::coot as coot_report;
use crate::tools::{CootArg, CootScript, ToolCommand, ToolContext};
use crate::utils::paths;

use std::path::Path;

/// 峰搜索参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakSearch {
    /// n-rmsd 阈值，同时用作显示等高线
    pub threshold: f64,
    /// 最多保留的峰数
    pub max_peaks: usize,
}

impl Default for PeakSearch {
    fn default() -> Self {
        PeakSearch {
            threshold: 5.0,
            max_peaks: 10,
        }
    }
}

/// 生成差值图 `map_out` 并返回搜索到的峰
///
/// 所有路径都写成相对 `working_dir` 的形式，Coot 在该目录下运行。
/// 峰按报告中的顺序保留前 `max_peaks` 个。
pub fn make_double_diff_map_and_get_peaks(
    map_above: &Path,
    map_below: &Path,
    working_dir: &Path,
    pdb_file: &Path,
    map_out: &Path,
    search: &PeakSearch,
    ctx: &ToolContext,
) -> Result<Vec<Peak>> {
    for (role, path) in [("above", map_above), ("below", map_below)] {
        if !path.is_file() {
            ctx.log.error(&format!(
                "Could not find AnoDe map {}, expected at: {}",
                role,
                path.display()
            ));
            return Err(MetalIdError::MissingAnomalousMap {
                role: role.to_string(),
                path: path.display().to_string(),
            });
        }
    }

    let rel = |p: &Path| CootArg::path(&paths::relative_to(p, working_dir));
    let script = CootScript::new()
        .call("read_pdb", vec![rel(pdb_file)])
        .assign(
            "map_above",
            "read_phs_and_make_map_using_cell_symm_from_previous_mol",
            vec![rel(map_above)],
        )
        .assign(
            "map_below",
            "read_phs_and_make_map_using_cell_symm_from_previous_mol",
            vec![rel(map_below)],
        )
        .assign(
            "map_diff",
            "difference_map",
            vec![
                CootArg::Var("map_above".to_string()),
                CootArg::Var("map_below".to_string()),
                CootArg::Int(1),
            ],
        )
        .call(
            "difference_map_peaks",
            vec![
                CootArg::Var("map_diff".to_string()),
                CootArg::Int(0),
                CootArg::Float(search.threshold),
                CootArg::Float(0.0),
                CootArg::Int(1),
                CootArg::Int(0),
                CootArg::Int(0),
            ],
        )
        .call("export_map", vec![CootArg::Var("map_diff".to_string()), rel(map_out)])
        .exit();

    let script_path = working_dir.join("coot_diff_map.py");
    paths::write_text(&script_path, &script.to_text())?;

    ctx.log.info(&format!(
        "Running coot script {} to create {}",
        script_path.display(),
        map_out.display()
    ));
    let command = ToolCommand::new(&ctx.tools.coot)
        .arg("--no-guano")
        .arg("--no-graphics")
        .arg("-s")
        .arg("coot_diff_map.py")
        .current_dir(working_dir);
    let text = ctx.run_and_capture(&command, &working_dir.join("coot_diff_map.log"))?;

    ctx.log.header("Finding peaks in double difference map");
    let report = coot_report::parse_peak_report(&text, search.max_peaks);
    if report.truncated {
        ctx.log.warn(&format!(
            "Found more peaks than the set maximum of {} - keeping the first {} reported",
            search.max_peaks, search.max_peaks
        ));
    }
    Ok(report.peaks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::fake::FakeRunner;
    use crate::tools::ToolSet;
    use crate::utils::log::Level;
    use crate::utils::RunLog;
    use std::fs;

    fn setup(dir: &Path) {
        for name in ["final.pdb", "above.pha", "below.pha"] {
            fs::write(dir.join(name), "x\n").unwrap();
        }
    }

    #[test]
    fn test_missing_map_reports_role() {
        let dir = tempfile::tempdir().unwrap();
        setup(dir.path());
        fs::remove_file(dir.path().join("below.pha")).unwrap();

        let runner = FakeRunner::new();
        let tools = ToolSet::default();
        let log = RunLog::silent();
        let ctx = ToolContext::new(&runner, &tools, &log);

        let d = dir.path();
        let err = make_double_diff_map_and_get_peaks(
            &d.join("above.pha"),
            &d.join("below.pha"),
            d,
            &d.join("final.pdb"),
            &d.join("diff.map"),
            &PeakSearch::default(),
            &ctx,
        )
        .unwrap_err();

        match err {
            MetalIdError::MissingAnomalousMap { role, .. } => assert_eq!(role, "below"),
            other => panic!("unexpected error {:?}", other),
        }
        assert!(runner.programs().is_empty());
    }

    #[test]
    fn test_peaks_from_coot_output() {
        let dir = tempfile::tempdir().unwrap();
        setup(dir.path());

        let runner = FakeRunner::with_responder(|_| {
            "INFO:: difference map made\n\
             0 dv: 0.81 n-rmsd: 12.40 xyz = (     24.08,     12.31,     28.48)\n\
             1 dv: 0.42 n-rmsd: 6.51 xyz = (     -3.10,      7.00,      1.25)\n\
             2 dv: 0.33 n-rmsd: 5.12 xyz = (      9.90,      8.80,      7.70)\n"
                .to_string()
        });
        let tools = ToolSet::default();
        let log = RunLog::silent();
        let ctx = ToolContext::new(&runner, &tools, &log);

        let d = dir.path();
        let search = PeakSearch {
            threshold: 5.0,
            max_peaks: 2,
        };
        let peaks = make_double_diff_map_and_get_peaks(
            &d.join("above.pha"),
            &d.join("below.pha"),
            d,
            &d.join("final.pdb"),
            &d.join("diff.map"),
            &search,
            &ctx,
        )
        .unwrap();

        assert_eq!(peaks.len(), 2);
        assert_eq!(peaks[0].position, [24.08, 12.31, 28.48]);
        assert_eq!(peaks[1].score, 6.51);
        assert_eq!(log.messages(Level::Warn).len(), 1);
        assert!(d.join("coot_diff_map.log").is_file());

        let calls = runner.calls.borrow();
        assert_eq!(calls[0].working_dir.as_deref(), Some(d));
        assert_eq!(
            calls[0].args,
            vec!["--no-guano", "--no-graphics", "-s", "coot_diff_map.py"]
        );

        let script = fs::read_to_string(d.join("coot_diff_map.py")).unwrap();
        assert!(script.contains("read_pdb('final.pdb')"));
        assert!(script.contains(
            "map_above = read_phs_and_make_map_using_cell_symm_from_previous_mol('above.pha')"
        ));
        assert!(script.contains("map_diff = difference_map(map_above, map_below, 1)"));
        assert!(script.contains("difference_map_peaks(map_diff, 0, 5.0, 0.0, 1, 0, 0)"));
        assert!(script.contains("export_map(map_diff, 'diff.map')"));
        assert!(script.ends_with("coot_real_exit(0)\n"));
    }
}
