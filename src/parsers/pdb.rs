//! # PDB 格式解析器
//!
//! 只读取比较模型所需的内容：晶体对称性和有序的原子名/坐标。
//!
//! ## PDB 格式说明（固定列宽，列号从 1 开始）
//! ```text
//! CRYST1   a(7-15)  b(16-24)  c(25-33) alpha(34-40) beta(41-47) gamma(48-54) sg(56-66)
//! ATOM/HETATM  name(13-16)  x(31-38)  y(39-46)  z(47-54)
//! ```
//!
//! ## 依赖关系
//! - 被 `analysis/similarity.rs` 使用
//! - 使用 `models/structure.rs`

use crate::error::{MetalIdError, Result};
use crate::models::{AtomicModel, CrystalSymmetry, ModelAtom, UnitCell};
use std::fs;
use std::path::Path;

/// 解析 PDB 文件
pub fn read_pdb_file(path: &Path) -> Result<AtomicModel> {
    let content = fs::read_to_string(path).map_err(|e| MetalIdError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_pdb_content(&content, &path.display().to_string())
}

/// 从字符串内容解析 PDB 格式
pub fn parse_pdb_content(content: &str, name: &str) -> Result<AtomicModel> {
    let mut symmetry: Option<CrystalSymmetry> = None;
    let mut atoms: Vec<ModelAtom> = Vec::new();

    for (i, line) in content.lines().enumerate() {
        let line_num = i + 1;

        if line.starts_with("CRYST1") {
            symmetry = Some(parse_cryst1(line, name, line_num)?);
        } else if line.starts_with("ATOM  ") || line.starts_with("HETATM") {
            atoms.push(parse_atom_record(line, name, line_num)?);
        }
    }

    Ok(AtomicModel::new(name, symmetry, atoms))
}

/// 解析 CRYST1 记录
fn parse_cryst1(line: &str, name: &str, line_num: usize) -> Result<CrystalSymmetry> {
    let mut params = [0.0; 6];
    let ranges = [(7, 15), (16, 24), (25, 33), (34, 40), (41, 47), (48, 54)];
    for (value, (start, end)) in params.iter_mut().zip(ranges) {
        *value = parse_float_field(line, start, end, name, line_num)?;
    }

    // 缺省空间群按 PDB 约定为 P 1
    let space_group = match field(line, 56, 66).trim() {
        "" => "P 1".to_string(),
        sg => sg.to_string(),
    };

    let cell = UnitCell::new(params[0], params[1], params[2], params[3], params[4], params[5]);
    Ok(CrystalSymmetry::new(cell, space_group))
}

/// 解析 ATOM/HETATM 记录
fn parse_atom_record(line: &str, name: &str, line_num: usize) -> Result<ModelAtom> {
    let atom_name = field(line, 13, 16).trim().to_string();
    let x = parse_float_field(line, 31, 38, name, line_num)?;
    let y = parse_float_field(line, 39, 46, name, line_num)?;
    let z = parse_float_field(line, 47, 54, name, line_num)?;

    Ok(ModelAtom::new(atom_name, [x, y, z]))
}

/// 取第 start..=end 列（从 1 开始），越界部分视为空
fn field(line: &str, start: usize, end: usize) -> &str {
    let len = line.len();
    let from = (start - 1).min(len);
    let to = end.min(len);
    line.get(from..to).unwrap_or("")
}

fn parse_float_field(
    line: &str,
    start: usize,
    end: usize,
    name: &str,
    line_num: usize,
) -> Result<f64> {
    let raw = field(line, start, end).trim();
    raw.parse().map_err(|_| MetalIdError::ParseError {
        format: "pdb".to_string(),
        path: name.to_string(),
        reason: format!(
            "line {}: invalid number '{}' in columns {}-{}",
            line_num, raw, start, end
        ),
    })
}
