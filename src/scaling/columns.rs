//! # 反射列解析
//!
//! 为指定列类型找到值列和对应的 sigma 列（标签为 "SIG" + 值列标签）。
//!
//! ## 依赖关系
//! - 被 `scaling/amplitudes.rs`, `scaling/mod.rs` 使用
//! - 使用 `models/reflection.rs`

use crate::error::{MetalIdError, Result};
use crate::models::{ColumnSpec, ColumnType, ReflectionDataset};
use crate::utils::RunLog;

/// 查找 `kind` 类型的第一列及其 sigma 列
///
/// 多列匹配时记录警告并使用文件顺序中的第一列；找不到值列或 sigma 列都返回错误。
pub fn find_cols_from_type(
    dataset: &ReflectionDataset,
    kind: ColumnType,
    file: &str,
    log: &RunLog,
) -> Result<ColumnSpec> {
    let matches: Vec<&str> = dataset
        .columns
        .iter()
        .filter(|c| c.kind == kind)
        .map(|c| c.label.as_str())
        .collect();

    let value = match matches.as_slice() {
        [] => {
            return Err(MetalIdError::MissingColumn {
                column_type: kind.legend().to_string(),
                file: file.to_string(),
            })
        }
        [only] => *only,
        [first, ..] => {
            log.warn(&format!(
                "Multiple {} data columns found in {}, using the first one",
                kind, file
            ));
            *first
        }
    };

    let sigma = format!("SIG{}", value);
    if !dataset.has_label(&sigma) {
        return Err(MetalIdError::MissingSigmaColumn {
            label: sigma,
            file: file.to_string(),
        });
    }

    Ok(ColumnSpec {
        value: value.to_string(),
        sigma,
    })
}
