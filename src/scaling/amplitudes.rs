//! # 结构因子振幅计算
//!
//! 数据集缺少振幅列 (F) 时，用 TRUNCATE 从强度列 (J) 计算。
//!
//! ## 依赖关系
//! - 被 `scaling/mod.rs` 使用
//! - 使用 `scaling/columns.rs`, `parsers/mtz.rs`, `tools/`

use crate::error::Result;
use crate::models::{ColumnType, ReflectionFile};
use crate::parsers::mtz;
use crate::scaling::columns::find_cols_from_type;
use crate::tools::script::assignments;
use crate::tools::{self, ControlScript, ToolCommand, ToolContext};
use crate::utils::paths;

use std::path::Path;

/// 确保数据集包含振幅列，已有振幅时原样返回
///
/// 计算结果写入 `<stem>_amplit.mtz` 并重新读入。
pub fn calc_amplitudes(
    file: ReflectionFile,
    output_dir: &Path,
    ctx: &ToolContext,
) -> Result<ReflectionFile> {
    if file.dataset.has_column_type(ColumnType::Amplitude) {
        return Ok(file);
    }

    let name = file.path.display().to_string();
    let intensity = find_cols_from_type(&file.dataset, ColumnType::Intensity, &name, ctx.log)?;
    ctx.log.info(&format!(
        "Amplitude data not in {}, running TRUNCATE to calculate",
        name
    ));

    let stem = paths::file_stem(&file.path);
    let amplit_path = output_dir.join(format!("{}_amplit.mtz", stem));

    let script = ControlScript::new()
        .card(
            "labin",
            assignments([
                ("IMEAN", intensity.value.as_str()),
                ("SIGIMEAN", intensity.sigma.as_str()),
            ]),
        )
        .card("labout", assignments([("F", "F"), ("SIGF", "SIGF")]))
        .flag("NOHARVEST");

    let command = ToolCommand::new(&ctx.tools.truncate)
        .keyed_path("hklin", &file.path)
        .keyed_path("hklout", &amplit_path)
        .script(script);

    ctx.run_and_capture(&command, &output_dir.join(format!("{}_truncate.log", stem)))?;
    tools::require_output("truncate", &amplit_path)?;

    let dataset = mtz::read_mtz_file(&amplit_path)?;
    Ok(ReflectionFile {
        path: amplit_path,
        dataset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MetalIdError;
    use crate::parsers::mtz::tests::TestMtz;
    use crate::tools::fake::FakeRunner;
    use crate::tools::{ToolInput, ToolSet};
    use crate::utils::RunLog;
    use std::path::PathBuf;

    fn load(path: PathBuf) -> ReflectionFile {
        let dataset = mtz::read_mtz_file(&path).unwrap();
        ReflectionFile { path, dataset }
    }

    #[test]
    fn test_existing_amplitudes_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let file = load(
            TestMtz::with_data_columns(&[("F", 'F'), ("SIGF", 'Q')])
                .write(&dir.path().join("a.mtz")),
        );
        let runner = FakeRunner::new();
        let tools = ToolSet::default();
        let log = RunLog::silent();
        let ctx = ToolContext::new(&runner, &tools, &log);

        let once = calc_amplitudes(file.clone(), dir.path(), &ctx).unwrap();
        let twice = calc_amplitudes(once.clone(), dir.path(), &ctx).unwrap();

        assert_eq!(once, file);
        assert_eq!(twice, file);
        assert!(runner.programs().is_empty());
    }

    #[test]
    fn test_truncate_runs_for_intensities() {
        let dir = tempfile::tempdir().unwrap();
        let file = load(
            TestMtz::with_data_columns(&[("IMEAN", 'J'), ("SIGIMEAN", 'Q')])
                .write(&dir.path().join("above.mtz")),
        );

        let runner = FakeRunner::with_responder(|cmd| {
            let out = PathBuf::from(cmd.value_of("hklout").unwrap());
            TestMtz::with_data_columns(&[("F", 'F'), ("SIGF", 'Q')]).write(&out);
            "TRUNCATE: Normal termination".to_string()
        });
        let tools = ToolSet::default();
        let log = RunLog::silent();
        let ctx = ToolContext::new(&runner, &tools, &log);

        let result = calc_amplitudes(file, dir.path(), &ctx).unwrap();

        assert_eq!(result.path, dir.path().join("above_amplit.mtz"));
        assert!(result.dataset.has_column_type(ColumnType::Amplitude));
        assert!(dir.path().join("above_truncate.log").is_file());

        let calls = runner.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "truncate");
        match &calls[0].input {
            ToolInput::Script(script) => assert_eq!(
                script.to_text(),
                "labin IMEAN=IMEAN SIGIMEAN=SIGIMEAN\nlabout F=F SIGF=SIGF\nNOHARVEST\nEND\n"
            ),
            other => panic!("unexpected input {:?}", other),
        }
    }

    #[test]
    fn test_no_intensities_propagates_failure() {
        let dir = tempfile::tempdir().unwrap();
        let file = load(
            TestMtz::with_data_columns(&[("DANO", 'D'), ("SIGDANO", 'Q')])
                .write(&dir.path().join("odd.mtz")),
        );
        let runner = FakeRunner::new();
        let tools = ToolSet::default();
        let log = RunLog::silent();
        let ctx = ToolContext::new(&runner, &tools, &log);

        let err = calc_amplitudes(file, dir.path(), &ctx).unwrap_err();
        assert!(matches!(err, MetalIdError::MissingColumn { .. }));
        assert!(runner.programs().is_empty());
    }
}
