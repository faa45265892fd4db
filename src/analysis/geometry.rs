//! # 相机取向计算
//!
//! 计算把相机前向轴（-Z）转向目标点所需的单位四元数。
//!
//! ## 依赖关系
//! - 被 `diffmap/render.rs` 使用
//! - 无外部模块依赖

use crate::error::{MetalIdError, Result};

/// 单位四元数 (x, y, z, w)
pub type Quaternion = [f64; 4];

/// 无旋转
pub const IDENTITY: Quaternion = [0.0, 0.0, 0.0, 1.0];

/// 方向正好为 +Z 时的半周旋转（绕 Y 轴 180°）
const HALF_TURN_Y: Quaternion = [0.0, 1.0, 0.0, 0.0];

const EPSILON: f64 = 1e-12;

/// 从 `from` 看向 `to` 的相机四元数
///
/// 任一点缺失时返回单位四元数。两点重合时方向无定义，返回 `DegenerateView`。
pub fn view_as_quat(from: Option<[f64; 3]>, to: Option<[f64; 3]>) -> Result<Quaternion> {
    let (from, to) = match (from, to) {
        (Some(from), Some(to)) => (from, to),
        _ => return Ok(IDENTITY),
    };

    let d = [to[0] - from[0], to[1] - from[1], to[2] - from[2]];
    let length = norm(&d);
    if length < EPSILON {
        return Err(MetalIdError::DegenerateView { position: from });
    }
    let d = [d[0] / length, d[1] / length, d[2] / length];

    // d × (0, 0, -1) 的简化形式
    let axis = [d[1], -d[0], 0.0];
    let quat = [axis[0], axis[1], axis[2], 1.0 - d[2]];

    let qlen = norm(&quat);
    if qlen < EPSILON {
        return Ok(HALF_TURN_Y);
    }
    Ok([quat[0] / qlen, quat[1] / qlen, quat[2] / qlen, quat[3] / qlen])
}

fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}
