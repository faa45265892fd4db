//! # CCP4 控制脚本构建器
//!
//! CCP4 程序从标准输入读取关键字卡片。脚本先构建为有序的记录列表，
//! 再序列化为文本，便于脱离外部程序单独测试。
//!
//! ```text
//! LABIN IMEAN=IMEAN SIGIMEAN=SIGIMEAN
//! LABOUT F=F SIGF=SIGF
//! NOHARVEST
//! END
//! ```
//!
//! ## 依赖关系
//! - 被 `tools/mod.rs`, `scaling/` 使用
//! - 无外部模块依赖

/// 单条关键字记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRecord {
    pub keyword: String,
    pub args: Vec<String>,
}

impl ScriptRecord {
    pub fn to_line(&self) -> String {
        if self.args.is_empty() {
            self.keyword.clone()
        } else {
            format!("{} {}", self.keyword, self.args.join(" "))
        }
    }
}

/// CCP4 控制脚本
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlScript {
    records: Vec<ScriptRecord>,
}

impl ControlScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一条记录
    pub fn card<I, S>(mut self, keyword: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.records.push(ScriptRecord {
            keyword: keyword.to_string(),
            args: args.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// 追加无参数记录
    pub fn flag(self, keyword: &str) -> Self {
        self.card(keyword, Vec::<String>::new())
    }

    /// 序列化为标准输入文本，末尾追加 END
    pub fn to_text(&self) -> String {
        let mut lines: Vec<String> = self.records.iter().map(ScriptRecord::to_line).collect();
        lines.push("END".to_string());
        lines.join("\n") + "\n"
    }
}

/// 列标签赋值列表：`E1=F E2=SIGF`
pub fn assignments<'a, I>(pairs: I) -> Vec<String>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    pairs
        .into_iter()
        .map(|(slot, label)| format!("{}={}", slot, label))
        .collect()
}

/// 按位置编号的列赋值：`E1=a E2=b ...`
pub fn numbered_assignments(labels: &[&str]) -> Vec<String> {
    labels
        .iter()
        .enumerate()
        .map(|(i, label)| format!("E{}={}", i + 1, label))
        .collect()
}
