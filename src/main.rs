//! # metal-id - 吸收边上下反常数据的金属位点定位
//!
//! 比较在元素吸收边上方和下方收集的衍射数据，计算双差值图，
//! 找出该元素所在位置并渲染每个峰的图像。
//!
//! ## 流程
//! 1. 缩放：POINTLESS / TRUNCATE / CAD / SCALEIT / MTZUTILS
//! 2. 精修：两次 dimple（`--anode`）
//! 3. 双差值图与峰搜索：Coot
//! 4. 渲染：find-blobs + Coot + Raster3D
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (流程编排)
//!   │     ├── scaling/   (数据缩放)
//!   │     ├── diffmap/   (差值图、峰、渲染)
//!   │     ├── analysis/  (取向与模型比较)
//!   │     ├── tools/     (外部程序调用与脚本)
//!   │     ├── parsers/   (PDB / MTZ / 程序输出解析)
//!   │     └── models/    (数据模型)
//!   ├── utils/      (日志、输出、路径)
//!   └── error.rs    (错误处理)
//! ```

mod analysis;
mod cli;
mod commands;
mod diffmap;
mod error;
mod models;
mod parsers;
mod scaling;
mod tools;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    match commands::run(cli) {
        Ok(()) => utils::output::print_done("metal-id finished"),
        Err(e) => {
            utils::output::print_error(&format!("{}", e));
            std::process::exit(1);
        }
    }
}
