//! # 路径工具
//!
//! 输出目录去重、文件复制和相对路径计算。
//!
//! ## 依赖关系
//! - 被 `commands/`, `scaling/`, `diffmap/` 使用
//! - 无外部模块依赖

use crate::error::{MetalIdError, Result};

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// 创建一个新的输出目录；名称已被占用时追加数字后缀
///
/// `metal_id` -> `metal_id_1` -> `metal_id_2` ...
///
/// 使用 `fs::create_dir`，已存在的目录返回 `AlreadyExists`，
/// 因此同时启动的两次运行不会得到同一个目录。
pub fn create_unique_directory(path: &Path) -> Result<PathBuf> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let suffix = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir(parent)?;
    }

    let mut candidate = path.to_path_buf();
    let mut counter = 1;
    loop {
        match fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                candidate = path.with_file_name(format!("{}_{}{}", stem, counter, suffix));
                counter += 1;
            }
            Err(e) => {
                return Err(MetalIdError::FileWriteError {
                    path: candidate.display().to_string(),
                    source: e,
                })
            }
        }
    }
}

/// 创建目录（含父目录）
pub fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| MetalIdError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}

/// 复制文件到目标路径
pub fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if !from.is_file() {
        return Err(MetalIdError::FileNotFound {
            path: from.display().to_string(),
        });
    }
    fs::copy(from, to).map_err(|e| MetalIdError::FileWriteError {
        path: to.display().to_string(),
        source: e,
    })?;
    Ok(())
}

/// 写入文本文件
pub fn write_text(path: &Path, text: &str) -> Result<()> {
    fs::write(path, text).map_err(|e| MetalIdError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}

/// 相对于工作目录的路径；不在工作目录下时保持原样
pub fn relative_to(path: &Path, base: &Path) -> PathBuf {
    path.strip_prefix(base)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

/// 文件名主干（无扩展名）
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
