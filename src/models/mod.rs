//! # 数据模型模块
//!
//! 定义原子模型、反射数据集和差值图峰的数据模型。
//!
//! ## 依赖关系
//! - 被 `parsers/`, `analysis/`, `scaling/`, `diffmap/` 使用
//! - 子模块: structure, reflection, peak

pub mod peak;
pub mod reflection;
pub mod structure;

pub use peak::{Peak, RenderJob};
pub use reflection::{
    Column, ColumnSpec, ColumnType, DatasetInfo, ReflectionDataset, ReflectionFile,
};
pub use structure::{AtomicModel, CrystalSymmetry, ModelAtom, SymmetryTolerance, UnitCell};
