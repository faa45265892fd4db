//! # Coot / find-blobs 文本输出解析器
//!
//! 从 Coot 的峰搜索报告中提取峰，从 find-blobs 输出中提取蛋白质质心。
//!
//! ## 输出格式
//! ```text
//! 0 dv: 77.94 n-rmsd: 42.52 xyz = (     24.08,     12.31,     28.48)
//! Protein mass center: xyz = (     12.37,     23.89,     32.69)
//! ```
//!
//! ## 依赖关系
//! - 被 `diffmap/peaks.rs`, `diffmap/render.rs` 使用
//! - 使用 `models/peak.rs`
//! - 使用 `regex`

use crate::models::Peak;

use regex::Regex;
use std::sync::OnceLock;

/// 峰报告解析结果
#[derive(Debug, Clone, PartialEq)]
pub struct PeakReport {
    /// 按报告顺序保留的峰
    pub peaks: Vec<Peak>,
    /// 达到上限后是否还有未保留的峰
    pub truncated: bool,
}

fn peak_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\s*\d+\s+dv:\s*([\d.]+)\s+n-rmsd:\s*([\d.]+)\s+xyz\s*=\s*\(\s*([\d., -]+)\)")
            .expect("peak report pattern is valid")
    })
}

fn centre_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"Protein mass center: xyz = \(\s*([-+]?\d*\.\d+|\d+\.\d*)\s*,\s*([-+]?\d*\.\d+|\d+\.\d*)\s*,\s*([-+]?\d*\.\d+|\d+\.\d*)\s*\)",
        )
        .expect("mass centre pattern is valid")
    })
}

/// 解析 Coot 峰报告，最多保留 `max_peaks` 个
///
/// 按报告中出现的顺序取前 N 个，不按密度重新排序。
pub fn parse_peak_report(text: &str, max_peaks: usize) -> PeakReport {
    let mut peaks = Vec::new();
    let mut truncated = false;

    for caps in peak_pattern().captures_iter(text) {
        if peaks.len() == max_peaks {
            truncated = true;
            break;
        }

        let density = caps[1].parse::<f64>();
        let score = caps[2].parse::<f64>();
        let position = parse_triple(&caps[3]);

        // 无法解析的行跳过
        if let (Ok(density), Ok(score), Some(position)) = (density, score, position) {
            peaks.push(Peak::new(position, density, score));
        }
    }

    PeakReport { peaks, truncated }
}

/// 解析 find-blobs 报告的蛋白质质心
pub fn parse_mass_centre(text: &str) -> Option<[f64; 3]> {
    let caps = centre_pattern().captures(text)?;
    let x = caps[1].parse().ok()?;
    let y = caps[2].parse().ok()?;
    let z = caps[3].parse().ok()?;
    Some([x, y, z])
}

/// "x, y, z" -> [x, y, z]
fn parse_triple(s: &str) -> Option<[f64; 3]> {
    let values: Vec<f64> = s
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .ok()?;
    match values.as_slice() {
        [x, y, z] => Some([*x, *y, *z]),
        _ => None,
    }
}
