// src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("页面元素未出现: '{selector}' (等待 {waited_ms} ms)")]
    NotFound { selector: String, waited_ms: u128 },
    #[error("文本解析失败: {0}")]
    Parse(String),
    #[error("课程目录加载失败: {0}")]
    Scan(String),
    #[error("数据归属冲突: {0}")]
    OwnershipViolation(String),
    #[error("视频下载失败: {0}")]
    Retrieval(String),
    #[error("浏览器会话错误: {0}")]
    Browser(String),
    #[error("网络请求失败: {0}")]
    Network(#[from] reqwest::Error),
    #[error("网络中间件错误: {0}")]
    NetworkMiddleware(#[from] reqwest_middleware::Error),
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),
    #[error("临时文件持久化失败: {0}")]
    TempFilePersist(#[from] tempfile::PersistError),
    #[error("JSON 解析错误: {0}")]
    Json(#[from] serde_json::Error),
    #[error("URL 解析错误: {0}")]
    Url(#[from] url::ParseError),
    #[error("用户中断")]
    UserInterrupt,
    #[error("{0}")] // 只打印内部信息，不加任何前缀
    UserInputError(String),
    #[error("未知错误: {0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// 单个课时或单个视频范围内可以跳过的错误。
    pub fn is_row_local(&self) -> bool {
        matches!(
            self,
            AppError::NotFound { .. } | AppError::Parse(_) | AppError::Browser(_)
        )
    }
}

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Browser(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
