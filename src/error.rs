//! 统一错误类型定义
//!
//! 使用 `thiserror` 简化错误类型定义，
//! 提供 `AppError` 枚举和 `AppResult` 类型别名。

use serde::Serialize;
use thiserror::Error;

/// 应用级统一错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 索引或目录尚未加载完成
    #[error("search index is not ready yet")]
    NotReady,

    /// 目录数据加载错误
    #[error("catalog error: {0}")]
    Catalog(String),

    /// 文件操作错误
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV 解析错误
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// 验证错误（输入参数不合法）
    #[error("validation failed: {0}")]
    Validation(String),

    /// 选择编号超出当前建议范围
    #[error("selection {given} is out of range (1..={available})")]
    InvalidSelection { given: String, available: usize },

    /// 订单不能为空
    #[error("cannot build an order from an empty selection")]
    EmptySelection,

    /// AI 服务错误
    #[error("ai service error: {0}")]
    AiService(String),

    /// 业务逻辑错误
    #[error("{0}")]
    Business(String),
}

// ========== From 实现：String 和 &str ==========

impl From<String> for AppError {
    fn from(s: String) -> Self {
        AppError::Business(s)
    }
}

impl From<&str> for AppError {
    fn from(s: &str) -> Self {
        AppError::Business(s.to_string())
    }
}

// ========== Serialize 实现：对外接口需要序列化错误 ==========

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("AppError", 2)?;

        let error_type = match self {
            AppError::NotReady => "not_ready",
            AppError::Catalog(_) => "catalog",
            AppError::Io(_) => "io",
            AppError::Csv(_) => "csv",
            AppError::Validation(_) => "validation",
            AppError::InvalidSelection { .. } => "invalid_selection",
            AppError::EmptySelection => "empty_selection",
            AppError::AiService(_) => "ai_service",
            AppError::Business(_) => "business",
        };
        state.serialize_field("type", error_type)?;
        state.serialize_field("message", &self.to_string())?;

        state.end()
    }
}

/// 应用级 Result 类型别名
pub type AppResult<T> = Result<T, AppError>;
