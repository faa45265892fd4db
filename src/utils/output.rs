//! # 美化输出工具
//!
//! 提供统一的终端输出样式。`RunLog` 通过这些函数回显日志，
//! 在运行日志尚未建立时（参数错误）也直接使用。
//!
//! ## 依赖关系
//! - 被 `main.rs` 和 `utils/log.rs` 使用
//! - 使用 `colored` crate

use colored::Colorize;

/// 打印成功消息
pub fn print_success(msg: &str) {
    println!("{} {}", "[OK]".green().bold(), msg);
}

/// 打印错误消息
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "[ERR]".red().bold(), msg);
}

/// 打印警告消息
pub fn print_warning(msg: &str) {
    println!("{} {}", "[WARN]".yellow().bold(), msg);
}

/// 打印信息消息
pub fn print_info(msg: &str) {
    println!("{} {}", "[*]".blue().bold(), msg);
}

/// 打印外部程序命令行，多行脚本缩进显示
pub fn print_command(command: &str) {
    let mut lines = command.lines();
    if let Some(first) = lines.next() {
        println!("{} {}", "[$]".cyan().bold(), first);
    }
    for line in lines {
        println!("    {}", line.dimmed());
    }
}

/// 打印完成消息
pub fn print_done(msg: &str) {
    println!("{} {}", "[DONE]".green().bold(), msg);
}

/// 打印标题栏
pub fn print_header(title: &str) {
    let line = "─".repeat(60);
    println!("\n{}", line.dimmed());
    println!("  {}", title.bold());
    println!("{}\n", line.dimmed());
}
