//! # MTZ 反射文件解析器
//!
//! 读取 CCP4 MTZ 二进制文件的反射数据表和头记录。
//!
//! ## MTZ 格式说明
//! ```text
//! 字节 0-3    "MTZ "
//! 字节 4-7    头记录位置（4 字节字，从 1 开始）；为 -1 时使用字节 12-19 的 64 位位置
//! 字节 8-11   machine stamp，高半字节 0x4 = little-endian, 0x1 = big-endian
//! 字节 80-    反射数据：NREF 行 × NCOL 列 float32
//! 头记录      每条 80 字符：VERS, TITLE, NCOL, CELL, SYMINF, COLUMN,
//!             PROJECT, CRYSTAL, DATASET, ..., END
//! ```
//!
//! ## 依赖关系
//! - 被 `scaling/` 使用
//! - 使用 `models/reflection.rs`
//! - 使用 `byteorder` 读取二进制字段

use crate::error::{MetalIdError, Result};
use crate::models::{Column, ColumnType, DatasetInfo, ReflectionDataset, UnitCell};

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use std::fs;
use std::path::Path;

const MAGIC: &[u8; 4] = b"MTZ ";
const DATA_START: usize = 80;
const RECORD_LEN: usize = 80;

/// 读取 MTZ 文件
pub fn read_mtz_file(path: &Path) -> Result<ReflectionDataset> {
    let bytes = fs::read(path).map_err(|e| MetalIdError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_mtz_bytes(&bytes, &path.display().to_string())
}

/// 从内存中的字节解析 MTZ
pub fn parse_mtz_bytes(bytes: &[u8], name: &str) -> Result<ReflectionDataset> {
    let fail = |reason: String| MetalIdError::ParseError {
        format: "mtz".to_string(),
        path: name.to_string(),
        reason,
    };

    if bytes.len() < DATA_START || &bytes[0..4] != MAGIC {
        return Err(fail("missing 'MTZ ' file signature".to_string()));
    }

    let big_endian = (bytes[9] & 0xf0) == 0x10;
    let header_offset = if big_endian {
        header_offset::<BigEndian>(bytes)
    } else {
        header_offset::<LittleEndian>(bytes)
    };

    let header_start = usize::try_from(header_offset)
        .ok()
        .filter(|&w| w >= 1)
        .map(|w| (w - 1) * 4)
        .filter(|&start| start >= DATA_START && start <= bytes.len())
        .ok_or_else(|| fail(format!("invalid header offset {}", header_offset)))?;

    let header = parse_header(&bytes[header_start..]).map_err(fail)?;

    if header.columns.len() != header.ncol {
        return Err(fail(format!(
            "NCOL declares {} columns but {} COLUMN records found",
            header.ncol,
            header.columns.len()
        )));
    }

    let overrun = || {
        fail(format!(
            "reflection table of {} x {} values overruns header",
            header.nref, header.ncol
        ))
    };
    let n_values = header.ncol.checked_mul(header.nref).ok_or_else(overrun)?;
    let data_end = n_values
        .checked_mul(4)
        .and_then(|n| n.checked_add(DATA_START))
        .filter(|&end| end <= header_start)
        .ok_or_else(overrun)?;

    let raw = &bytes[DATA_START..data_end];
    let mut values = vec![0f32; n_values];
    if big_endian {
        BigEndian::read_f32_into(raw, &mut values);
    } else {
        LittleEndian::read_f32_into(raw, &mut values);
    }

    Ok(ReflectionDataset {
        title: header.title,
        cell: header.cell,
        space_group: header.space_group,
        columns: header.columns,
        datasets: header.datasets,
        num_reflections: header.nref,
        values,
    })
}

fn header_offset<B: ByteOrder>(bytes: &[u8]) -> i64 {
    let short = B::read_i32(&bytes[4..8]);
    if short == -1 {
        B::read_i64(&bytes[12..20])
    } else {
        i64::from(short)
    }
}

/// 头记录解析结果
struct MtzHeader {
    title: String,
    ncol: usize,
    nref: usize,
    cell: Option<UnitCell>,
    space_group: Option<String>,
    columns: Vec<Column>,
    datasets: Vec<DatasetInfo>,
}

/// 逐条解析 80 字符头记录，直到 END
fn parse_header(raw: &[u8]) -> std::result::Result<MtzHeader, String> {
    let mut header = MtzHeader {
        title: String::new(),
        ncol: 0,
        nref: 0,
        cell: None,
        space_group: None,
        columns: Vec::new(),
        datasets: Vec::new(),
    };
    let mut found_end = false;

    for chunk in raw.chunks(RECORD_LEN) {
        let record = String::from_utf8_lossy(chunk);
        let record = record.trim_end();
        let keyword: String = record.chars().take(4).collect::<String>().to_uppercase();
        let tokens: Vec<&str> = record.split_whitespace().collect();

        match keyword.as_str() {
            "END" => {
                found_end = true;
                break;
            }
            "TITL" => {
                header.title = record.get(5..).unwrap_or("").trim().to_string();
            }
            "NCOL" => {
                header.ncol = parse_token(&tokens, 1, "NCOL")?;
                header.nref = parse_token(&tokens, 2, "NCOL")?;
            }
            "CELL" => {
                let p: Vec<f64> = tokens[1..]
                    .iter()
                    .filter_map(|t| t.parse().ok())
                    .collect();
                if p.len() < 6 {
                    return Err(format!("incomplete CELL record: '{}'", record));
                }
                header.cell = Some(UnitCell::new(p[0], p[1], p[2], p[3], p[4], p[5]));
            }
            "SYMI" => {
                // SYMINF nsym nsymp lattice sg_number 'sg_name' 'pg_name'
                header.space_group = quoted(record);
            }
            "COLU" => {
                if tokens.len() < 3 {
                    return Err(format!("incomplete COLUMN record: '{}'", record));
                }
                let code = tokens[2].chars().next().unwrap_or('?');
                let dataset_id = tokens.get(5).and_then(|t| t.parse().ok()).unwrap_or(0);
                header.columns.push(Column {
                    label: tokens[1].to_string(),
                    kind: ColumnType::from_code(code),
                    dataset_id,
                });
            }
            "PROJ" | "CRYS" | "DATA" => {
                let id: i32 = parse_token(&tokens, 1, &keyword)?;
                let value = tokens.get(2..).map(|t| t.join(" ")).unwrap_or_default();
                let dataset = dataset_entry(&mut header.datasets, id);
                match keyword.as_str() {
                    "PROJ" => dataset.project = value,
                    "CRYS" => dataset.crystal = value,
                    _ => dataset.name = value,
                }
            }
            _ => {}
        }
    }

    if !found_end {
        return Err("header has no END record".to_string());
    }

    // 没有 HKL_base 记录的文件仍把 0 号数据集当作基础晶体
    if !header.datasets.iter().any(|d| d.id == 0) {
        header.datasets.insert(
            0,
            DatasetInfo {
                id: 0,
                project: "HKL_base".to_string(),
                crystal: "HKL_base".to_string(),
                name: "HKL_base".to_string(),
            },
        );
    }

    Ok(header)
}

fn dataset_entry(datasets: &mut Vec<DatasetInfo>, id: i32) -> &mut DatasetInfo {
    let idx = match datasets.iter().position(|d| d.id == id) {
        Some(idx) => idx,
        None => {
            datasets.push(DatasetInfo {
                id,
                project: String::new(),
                crystal: String::new(),
                name: String::new(),
            });
            datasets.len() - 1
        }
    };
    &mut datasets[idx]
}

fn parse_token<T: std::str::FromStr>(
    tokens: &[&str],
    idx: usize,
    keyword: &str,
) -> std::result::Result<T, String> {
    tokens
        .get(idx)
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| format!("invalid {} record: '{}'", keyword, tokens.join(" ")))
}

/// 第一对单引号之间的文本
fn quoted(record: &str) -> Option<String> {
    let start = record.find('\'')? + 1;
    let len = record[start..].find('\'')?;
    Some(record[start..start + len].trim().to_string())
}
