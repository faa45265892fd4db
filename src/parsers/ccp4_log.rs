//! # CCP4 程序日志检查
//!
//! CCP4 程序没有可靠的退出码约定，只能从捕获的文本输出判断失败。
//!
//! ## 依赖关系
//! - 被 `scaling/mod.rs` 使用
//! - 无外部模块依赖

/// POINTLESS 在两组数据对称性不兼容时输出的标记
pub const INCOMPATIBLE_SYMMETRY_MARKER: &str = "Incompatible symmetries";

/// 检查 POINTLESS 输出是否报告对称性不兼容
pub fn detect_symmetry_failure(text: &str) -> bool {
    text.contains(INCOMPATIBLE_SYMMETRY_MARKER)
}
