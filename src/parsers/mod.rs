//! # 解析器模块
//!
//! 提供模型文件、反射文件和外部程序文本输出的解析器。
//! 外部程序输出的正则/字符串匹配都集中在这里，输出格式变化时只需替换对应解析器。
//!
//! ## 依赖关系
//! - 被 `analysis/`, `scaling/`, `diffmap/` 使用
//! - 使用 `models/` 数据模型
//! - 子模块: pdb, mtz, coot, ccp4_log

pub mod ccp4_log;
pub mod coot;
pub mod mtz;
pub mod pdb;
