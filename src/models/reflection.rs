//! # 反射数据集数据模型
//!
//! 表示一个 MTZ 反射文件：列（标签 + 类型代码 + 所属数据集）、
//! 晶体/数据集层级以及按 (h, k, l) 排列的反射数据表。
//!
//! ## 依赖关系
//! - 被 `parsers/mtz.rs` 构建
//! - 被 `scaling/` 使用

use crate::models::UnitCell;

use std::fmt;
use std::path::PathBuf;

/// MTZ 列类型代码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// H: Miller 指数
    Index,
    /// J: 强度
    Intensity,
    /// F: 结构因子振幅
    Amplitude,
    /// D: 反常差值
    AnomalousDifference,
    /// Q: 标准偏差
    StandardDeviation,
    /// G: F(+) / F(-)
    FriedelAmplitude,
    /// L: G 的标准偏差
    FriedelAmplitudeSigma,
    /// K: I(+) / I(-)
    FriedelIntensity,
    /// M: K 的标准偏差
    FriedelIntensitySigma,
    /// E: 归一化振幅
    NormalizedAmplitude,
    /// P: 相位角
    Phase,
    /// W: 权重
    Weight,
    /// A: 相位概率系数
    PhaseProbability,
    /// Y: M/ISYM
    Symmetry,
    /// B: batch 编号
    Batch,
    /// I: 整数
    Integer,
    /// R: 实数
    Real,
    /// 未知代码
    Other(char),
}

impl ColumnType {
    pub fn from_code(code: char) -> Self {
        match code {
            'H' => ColumnType::Index,
            'J' => ColumnType::Intensity,
            'F' => ColumnType::Amplitude,
            'D' => ColumnType::AnomalousDifference,
            'Q' => ColumnType::StandardDeviation,
            'G' => ColumnType::FriedelAmplitude,
            'L' => ColumnType::FriedelAmplitudeSigma,
            'K' => ColumnType::FriedelIntensity,
            'M' => ColumnType::FriedelIntensitySigma,
            'E' => ColumnType::NormalizedAmplitude,
            'P' => ColumnType::Phase,
            'W' => ColumnType::Weight,
            'A' => ColumnType::PhaseProbability,
            'Y' => ColumnType::Symmetry,
            'B' => ColumnType::Batch,
            'I' => ColumnType::Integer,
            'R' => ColumnType::Real,
            other => ColumnType::Other(other),
        }
    }

    #[cfg(test)]
    pub fn code(&self) -> char {
        match self {
            ColumnType::Index => 'H',
            ColumnType::Intensity => 'J',
            ColumnType::Amplitude => 'F',
            ColumnType::AnomalousDifference => 'D',
            ColumnType::StandardDeviation => 'Q',
            ColumnType::FriedelAmplitude => 'G',
            ColumnType::FriedelAmplitudeSigma => 'L',
            ColumnType::FriedelIntensity => 'K',
            ColumnType::FriedelIntensitySigma => 'M',
            ColumnType::NormalizedAmplitude => 'E',
            ColumnType::Phase => 'P',
            ColumnType::Weight => 'W',
            ColumnType::PhaseProbability => 'A',
            ColumnType::Symmetry => 'Y',
            ColumnType::Batch => 'B',
            ColumnType::Integer => 'I',
            ColumnType::Real => 'R',
            ColumnType::Other(c) => *c,
        }
    }

    /// 人类可读的类型说明
    pub fn legend(&self) -> &'static str {
        match self {
            ColumnType::Index => "index h,k,l",
            ColumnType::Intensity => "intensity",
            ColumnType::Amplitude => "amplitude",
            ColumnType::AnomalousDifference => "anomalous difference",
            ColumnType::StandardDeviation => "standard deviation",
            ColumnType::FriedelAmplitude => "F(+) or F(-)",
            ColumnType::FriedelAmplitudeSigma => "standard deviation of F(+) or F(-)",
            ColumnType::FriedelIntensity => "I(+) or I(-)",
            ColumnType::FriedelIntensitySigma => "standard deviation of I(+) or I(-)",
            ColumnType::NormalizedAmplitude => "normalized amplitude",
            ColumnType::Phase => "phase angle",
            ColumnType::Weight => "weight",
            ColumnType::PhaseProbability => "phase probability coefficients",
            ColumnType::Symmetry => "M/ISYM",
            ColumnType::Batch => "batch number",
            ColumnType::Integer => "integer",
            ColumnType::Real => "real",
            ColumnType::Other(_) => "unknown",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.legend())
    }
}

/// 单列描述
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub label: String,
    pub kind: ColumnType,
    /// 所属数据集 ID
    pub dataset_id: i32,
}

/// 数据集描述（PROJECT/CRYSTAL/DATASET 记录）
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetInfo {
    pub id: i32,
    pub project: String,
    pub crystal: String,
    pub name: String,
}

/// 为某一类型解析得到的值列 + sigma 列
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub value: String,
    pub sigma: String,
}

/// 反射数据集
#[derive(Debug, Clone, PartialEq)]
pub struct ReflectionDataset {
    pub title: String,
    pub cell: Option<UnitCell>,
    pub space_group: Option<String>,
    /// 按文件顺序排列的列
    pub columns: Vec<Column>,
    /// 按文件顺序排列的数据集
    pub datasets: Vec<DatasetInfo>,
    /// 反射数
    pub num_reflections: usize,
    /// 行优先的数据表：num_reflections × columns.len()
    pub values: Vec<f32>,
}

impl ReflectionDataset {
    /// 日志用的一行概要
    pub fn summary(&self) -> String {
        format!(
            "{} reflections, {} columns, space group {}",
            self.num_reflections,
            self.columns.len(),
            self.space_group.as_deref().unwrap_or("unknown")
        )
    }

    pub fn has_column_type(&self, kind: ColumnType) -> bool {
        self.columns.iter().any(|c| c.kind == kind)
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.columns.iter().any(|c| c.label == label)
    }

    /// 按晶体分组的数据集，保持首次出现顺序
    pub fn crystals(&self) -> Vec<(String, Vec<&DatasetInfo>)> {
        let mut crystals: Vec<(String, Vec<&DatasetInfo>)> = Vec::new();
        for dataset in &self.datasets {
            match crystals.iter_mut().find(|(name, _)| *name == dataset.crystal) {
                Some((_, members)) => members.push(dataset),
                None => crystals.push((dataset.crystal.clone(), vec![dataset])),
            }
        }
        crystals
    }

    /// 某数据集下的列标签
    pub fn dataset_column_labels(&self, dataset_id: i32) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.dataset_id == dataset_id)
            .map(|c| c.label.as_str())
            .collect()
    }

    /// 第一个实验晶体（HKL_base 之后）的第一个数据集的列标签
    pub fn first_data_column_labels(&self) -> Option<Vec<&str>> {
        let crystals = self.crystals();
        let (_, datasets) = crystals.get(1)?;
        let dataset = datasets.first()?;
        let labels = self.dataset_column_labels(dataset.id);
        if labels.is_empty() {
            None
        } else {
            Some(labels)
        }
    }
}

/// 磁盘上的反射文件及其读入内容
#[derive(Debug, Clone, PartialEq)]
pub struct ReflectionFile {
    pub path: PathBuf,
    pub dataset: ReflectionDataset,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_dataset() -> ReflectionDataset {
        let col = |label: &str, code: char, dataset_id: i32| Column {
            label: label.to_string(),
            kind: ColumnType::from_code(code),
            dataset_id,
        };
        ReflectionDataset {
            title: "sample".to_string(),
            cell: None,
            space_group: None,
            columns: vec![
                col("H", 'H', 0),
                col("K", 'H', 0),
                col("L", 'H', 0),
                col("F", 'F', 1),
                col("SIGF", 'Q', 1),
            ],
            datasets: vec![
                DatasetInfo {
                    id: 0,
                    project: "HKL_base".to_string(),
                    crystal: "HKL_base".to_string(),
                    name: "HKL_base".to_string(),
                },
                DatasetInfo {
                    id: 1,
                    project: "proj".to_string(),
                    crystal: "xtal".to_string(),
                    name: "peak".to_string(),
                },
            ],
            num_reflections: 2,
            values: vec![1.0, 0.0, 0.0, 100.0, 5.0, 0.0, 2.0, -1.0, 80.0, 4.0],
        }
    }

    #[test]
    fn test_column_type_codes() {
        for code in "HJFDQGLKMEPWAYBIR".chars() {
            assert_eq!(ColumnType::from_code(code).code(), code);
        }
        assert_eq!(ColumnType::from_code('Z'), ColumnType::Other('Z'));
        assert_eq!(ColumnType::Intensity.to_string(), "intensity");
    }

    #[test]
    fn test_first_data_column_labels() {
        let ds = sample_dataset();
        assert_eq!(ds.first_data_column_labels().unwrap(), vec!["F", "SIGF"]);
        assert_eq!(ds.crystals().len(), 2);
    }

    #[test]
    fn test_summary() {
        let mut ds = sample_dataset();
        assert_eq!(ds.summary(), "2 reflections, 5 columns, space group unknown");
        ds.space_group = Some("P 43 21 2".to_string());
        assert!(ds.summary().ends_with("space group P 43 21 2"));
    }
}
