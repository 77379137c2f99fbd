use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PackrollError {
    #[error("源目录不存在: {path}")]
    SourceNotFound { path: PathBuf },

    #[error("目标目录不存在: {path}")]
    TargetNotFound { path: PathBuf },

    #[error("类别 '{category}' 的索引值 '{value}' 无效")]
    BadVersionSuffix { category: String, value: String },

    #[error("错误的迁移日期，工作终止")]
    EmptyValidationDate,

    #[error("文档缺少部件: {name}")]
    MissingDocPart { name: String },

    #[error("文档 {path} 缺少表格: 第 {index} 个")]
    MissingTable { path: PathBuf, index: usize },

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("压缩包错误: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML 解析错误: {0}")]
    Xml(String),

    #[error("CSV 写入错误: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML 序列化错误: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML 反序列化错误: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("未知的配置项: {key}")]
    ConfigKeyNotFound { key: String },

    #[error("未找到主目录")]
    HomeNotFound,
}

pub type Result<T> = std::result::Result<T, PackrollError>;

impl PackrollError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::SourceNotFound { .. } => 2,
            Self::TargetNotFound { .. } => 3,
            Self::EmptyValidationDate => 4,
            Self::BadVersionSuffix { .. } => 5,
            _ => 1,
        }
    }
}
