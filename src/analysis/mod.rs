//! # 分析模块
//!
//! 不依赖外部程序的纯计算：相机取向四元数和模型相似性比较。
//!
//! ## 依赖关系
//! - 被 `diffmap/` 使用
//! - 使用 `models/`, `parsers/pdb.rs`
//! - 子模块: geometry, similarity

pub mod geometry;
pub mod similarity;

pub use geometry::view_as_quat;
pub use similarity::are_pdbs_similar;
