//! # 差值图峰数据模型
//!
//! ## 依赖关系
//! - 被 `parsers/coot.rs` 构建
//! - 被 `diffmap/` 使用

use std::path::PathBuf;

/// 双差值图中的一个峰
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    /// 峰位置 (Å)
    pub position: [f64; 3],

    /// 电子密度 (e/Å³)
    pub density: f64,

    /// 以 rmsd 为单位的峰高
    pub score: f64,
}

impl Peak {
    pub fn new(position: [f64; 3], density: f64, score: f64) -> Self {
        Peak {
            position,
            density,
            score,
        }
    }
}

/// 单个峰的渲染任务
#[derive(Debug, Clone, PartialEq)]
pub struct RenderJob {
    /// 从 1 开始的峰编号
    pub index: usize,
    pub peak: Peak,
    /// 相机四元数 (x, y, z, w)
    pub quaternion: [f64; 4],
    /// 相对工作目录的 Raster3D 输出路径
    pub raster_path: PathBuf,
}

impl RenderJob {
    /// 转换后的 PNG 路径（同名，扩展名不同）
    pub fn png_path(&self) -> PathBuf {
        self.raster_path.with_extension("png")
    }
}
