//! # 外部程序调用模块
//!
//! 统一描述和执行外部晶体学程序（CCP4、dimple、Coot、find-blobs、Raster3D）。
//!
//! ## 功能
//! - `ToolCommand`: 程序、参数、标准输入、工作目录
//! - `ToolRunner`: 执行接口，生产环境用 `SystemRunner`，测试中替换为假实现
//! - `run_and_capture`: 记录命令、执行、把输出写入单独的日志文件
//!
//! 外部程序的成败由调用方检查输出文本和输出文件判断，不依赖退出码。
//! 所有调用都是阻塞的，没有超时和重试。
//!
//! ## 依赖关系
//! - 被 `scaling/`, `diffmap/`, `commands/` 使用
//! - 使用 `utils/progress.rs` 显示 spinner
//! - 子模块: script, coot

pub mod coot;
pub mod script;

pub use coot::{CootArg, CootScript};
pub use script::ControlScript;

use crate::error::{MetalIdError, Result};
use crate::utils::{paths, progress, RunLog};

use std::fs::File;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// 外部程序名称配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSet {
    pub pointless: String,
    pub truncate: String,
    pub cad: String,
    pub scaleit: String,
    pub mtzutils: String,
    pub dimple: String,
    pub coot: String,
    pub find_blobs: String,
    pub render: String,
}

impl Default for ToolSet {
    fn default() -> Self {
        ToolSet {
            pointless: "pointless".to_string(),
            truncate: "truncate".to_string(),
            cad: "cad".to_string(),
            scaleit: "scaleit".to_string(),
            mtzutils: "mtzutils".to_string(),
            dimple: "dimple".to_string(),
            coot: "coot".to_string(),
            find_blobs: "find-blobs".to_string(),
            render: "render".to_string(),
        }
    }
}

/// 外部程序的标准输入来源
#[derive(Debug, Clone, PartialEq)]
pub enum ToolInput {
    None,
    Script(ControlScript),
    File(PathBuf),
}

/// 一次外部程序调用
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
    pub input: ToolInput,
    pub working_dir: Option<PathBuf>,
}

impl ToolCommand {
    pub fn new(program: &str) -> Self {
        ToolCommand {
            program: program.to_string(),
            args: Vec::new(),
            input: ToolInput::None,
            working_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.display().to_string())
    }

    /// 关键字 + 路径，如 `hklin file.mtz`
    pub fn keyed_path(self, key: &str, path: &Path) -> Self {
        self.arg(key).path_arg(path)
    }

    pub fn script(mut self, script: ControlScript) -> Self {
        self.input = ToolInput::Script(script);
        self
    }

    pub fn stdin_file(mut self, path: &Path) -> Self {
        self.input = ToolInput::File(path.to_path_buf());
        self
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.working_dir = Some(dir.to_path_buf());
        self
    }

    /// 紧跟在 `key` 之后的参数值
    #[cfg(test)]
    pub fn value_of(&self, key: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a.eq_ignore_ascii_case(key))
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    /// 程序文件名，用于日志标记
    pub fn tool_name(&self) -> String {
        Path::new(&self.program)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.clone())
    }

    /// shell 风格的显示文本，脚本以 heredoc 形式给出
    pub fn display(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        match &self.input {
            ToolInput::None => line,
            ToolInput::File(path) => format!("{} < {}", line, path.display()),
            ToolInput::Script(script) => {
                let marker = format!("END-{}", self.tool_name().to_uppercase());
                format!("{} <<{}\n{}{}", line, marker, script.to_text(), marker)
            }
        }
    }
}

/// 外部程序的捕获输出
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ToolOutput {
    /// stdout 与 stderr 合并后的文本
    pub text: String,
    pub exit_code: Option<i32>,
}

/// 外部程序执行接口
pub trait ToolRunner {
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput>;
}

/// 通过操作系统进程执行
#[derive(Debug, Default)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &command.working_dir {
            cmd.current_dir(dir);
        }

        match &command.input {
            ToolInput::None => {
                cmd.stdin(Stdio::null());
            }
            ToolInput::Script(_) => {
                cmd.stdin(Stdio::piped());
            }
            ToolInput::File(path) => {
                let file = File::open(path).map_err(|e| MetalIdError::FileReadError {
                    path: path.display().to_string(),
                    source: e,
                })?;
                cmd.stdin(Stdio::from(file));
            }
        }

        let mut child = cmd.spawn().map_err(|e| match e.kind() {
            ErrorKind::NotFound => MetalIdError::CommandNotFound {
                command: command.program.clone(),
            },
            _ => MetalIdError::CommandFailed {
                command: command.display(),
                stderr: e.to_string(),
            },
        })?;

        if let (ToolInput::Script(script), Some(mut stdin)) = (&command.input, child.stdin.take()) {
            stdin.write_all(script.to_text().as_bytes()).ok();
        }

        let spinner = progress::create_spinner(&format!("Running {}", command.tool_name()));
        let output = child.wait_with_output();
        spinner.finish_and_clear();

        let output = output.map_err(|e| MetalIdError::CommandFailed {
            command: command.display(),
            stderr: e.to_string(),
        })?;

        let mut text = String::from_utf8_lossy(&output.stdout).to_string();
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(ToolOutput {
            text,
            exit_code: output.status.code(),
        })
    }
}

/// 各阶段共享的外部程序上下文
pub struct ToolContext<'a> {
    pub runner: &'a dyn ToolRunner,
    pub tools: &'a ToolSet,
    pub log: &'a RunLog,
}

impl<'a> ToolContext<'a> {
    pub fn new(runner: &'a dyn ToolRunner, tools: &'a ToolSet, log: &'a RunLog) -> Self {
        ToolContext { runner, tools, log }
    }

    /// 记录并执行命令，把输出写入 `log_path`，返回输出文本
    pub fn run_and_capture(&self, command: &ToolCommand, log_path: &Path) -> Result<String> {
        self.log.command(&command.display());
        let output = self.runner.run(command)?;
        paths::write_text(log_path, &output.text)?;

        if let Some(code) = output.exit_code.filter(|&c| c != 0) {
            self.log.warn(&format!(
                "{} exited with status {} (see {})",
                command.tool_name(),
                code,
                log_path.display()
            ));
        }
        Ok(output.text)
    }
}

/// 检查外部程序是否生成了预期的输出文件
pub fn require_output(tool: &str, path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(MetalIdError::MissingToolOutput {
            tool: tool.to_string(),
            path: path.display().to_string(),
        })
    }
}
