//! # Coot 脚本构建器
//!
//! Coot 以 `-s script.py` 执行 Python 脚本。脚本构建为语句列表，
//! 参数带类型，序列化时统一处理引号和数字格式。
//!
//! ## 依赖关系
//! - 被 `diffmap/peaks.rs`, `diffmap/render.rs` 使用
//! - 无外部模块依赖

use std::path::Path;

/// 函数调用参数
#[derive(Debug, Clone, PartialEq)]
pub enum CootArg {
    Str(String),
    Float(f64),
    Int(i64),
    /// 脚本中先前赋值的变量
    Var(String),
}

impl CootArg {
    pub fn path(path: &Path) -> Self {
        CootArg::Str(path.display().to_string())
    }

    fn render(&self) -> String {
        match self {
            CootArg::Str(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
            // Debug 格式保留小数点，如 30.0
            CootArg::Float(v) => format!("{:?}", v),
            CootArg::Int(v) => v.to_string(),
            CootArg::Var(name) => name.clone(),
        }
    }
}

/// 脚本语句
#[derive(Debug, Clone, PartialEq)]
pub enum CootStatement {
    Comment(String),
    Call { function: String, args: Vec<CootArg> },
    Assign { target: String, function: String, args: Vec<CootArg> },
}

impl CootStatement {
    fn render(&self) -> String {
        match self {
            CootStatement::Comment(text) => format!("# {}", text),
            CootStatement::Call { function, args } => call_text(function, args),
            CootStatement::Assign {
                target,
                function,
                args,
            } => format!("{} = {}", target, call_text(function, args)),
        }
    }
}

fn call_text(function: &str, args: &[CootArg]) -> String {
    let args: Vec<String> = args.iter().map(CootArg::render).collect();
    format!("{}({})", function, args.join(", "))
}

/// Coot Python 脚本
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CootScript {
    statements: Vec<CootStatement>,
}

impl CootScript {
    /// 带标准文件头的新脚本
    pub fn new() -> Self {
        CootScript::default()
            .comment("python script for coot - generated by metal-id")
            .call("set_nomenclature_errors_on_read", vec![CootArg::Str("ignore".to_string())])
    }

    pub fn comment(mut self, text: &str) -> Self {
        self.statements.push(CootStatement::Comment(text.to_string()));
        self
    }

    pub fn call(mut self, function: &str, args: Vec<CootArg>) -> Self {
        self.statements.push(CootStatement::Call {
            function: function.to_string(),
            args,
        });
        self
    }

    pub fn assign(mut self, target: &str, function: &str, args: Vec<CootArg>) -> Self {
        self.statements.push(CootStatement::Assign {
            target: target.to_string(),
            function: function.to_string(),
            args,
        });
        self
    }

    /// 以 `coot_real_exit(0)` 结束脚本
    pub fn exit(self) -> Self {
        self.call("coot_real_exit", vec![CootArg::Int(0)])
    }

    /// 序列化为脚本文本
    pub fn to_text(&self) -> String {
        let mut lines = vec!["#!/usr/bin/env coot".to_string()];
        lines.extend(self.statements.iter().map(CootStatement::render));
        lines.join("\n") + "\n"
    }
}

/// 三维坐标参数
pub fn xyz_args(xyz: [f64; 3]) -> Vec<CootArg> {
    xyz.iter().map(|v| CootArg::Float(*v)).collect()
}
