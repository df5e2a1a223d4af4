//! 配置解析模块
//!
//! TOML 为主，JSON 用于机器生成的 hub 配置。解析错误带上配置来源与行列号，
//! 便于直接定位到出错的 `[section]`。

use std::path::Path;

use contracts::{ContractError, HubConfig};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// 根据配置文件路径推断格式
    pub fn detect(path: &Path) -> Result<Self, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        Self::from_extension(ext).ok_or_else(|| {
            let found = if ext.is_empty() {
                "no extension".to_string()
            } else {
                format!(".{ext}")
            };
            ContractError::config_parse(format!(
                "unsupported config format for hub config {}: expected .toml or .json, found {found}",
                path.display()
            ))
        })
    }

    fn label(self) -> &'static str {
        match self {
            Self::Toml => "TOML",
            Self::Json => "JSON",
        }
    }
}

/// 出错位置 (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Position {
    line: usize,
    column: usize,
}

impl Position {
    fn at_offset(content: &str, offset: usize) -> Self {
        let prefix = content.get(..offset).unwrap_or(content);
        let line = prefix.matches('\n').count() + 1;
        let column = prefix
            .rsplit('\n')
            .next()
            .map_or(0, |current| current.chars().count())
            + 1;
        Self { line, column }
    }
}

/// 解析配置内容
///
/// `origin` 是配置来源 (文件路径或 `<inline>`)，只用于错误信息。
pub fn parse(content: &str, format: ConfigFormat, origin: &str) -> Result<HubConfig, ContractError> {
    match format {
        ConfigFormat::Toml => toml::from_str(content).map_err(|e| {
            let position = e.span().map(|span| Position::at_offset(content, span.start));
            let detail = e.message().trim().to_string();
            parse_error(format, origin, position, detail, e)
        }),
        ConfigFormat::Json => serde_json::from_str(content).map_err(|e| {
            let position = (e.line() > 0).then(|| Position {
                line: e.line(),
                column: e.column(),
            });
            let detail = json_detail(&e);
            parse_error(format, origin, position, detail, e)
        }),
    }
}

/// serde_json 的 Display 末尾自带 "at line X column Y"，位置单独给出时去掉
fn json_detail(err: &serde_json::Error) -> String {
    let full = err.to_string();
    match full.rfind(" at line ") {
        Some(idx) if err.line() > 0 => full[..idx].to_string(),
        _ => full,
    }
}

fn parse_error(
    format: ConfigFormat,
    origin: &str,
    position: Option<Position>,
    detail: String,
    source: impl std::error::Error + Send + Sync + 'static,
) -> ContractError {
    let location = match position {
        Some(Position { line, column }) => format!("{origin}:{line}:{column}"),
        None => origin.to_string(),
    };
    ContractError::ConfigParse {
        message: format!("invalid {} hub config {location}: {detail}", format.label()),
        source: Some(Box::new(source)),
    }
}
