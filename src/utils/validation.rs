//! 通用验证函数
//!
//! 提供集中的验证逻辑，避免在命令层重复验证代码

use crate::error::{AppError, AppResult};

/// 验证字符串非空（通用）
///
/// 返回 trim 后的字符串引用
pub fn validate_not_empty<'a>(value: &'a str, field_name: &str) -> AppResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} 不能为空", field_name)));
    }
    Ok(trimmed)
}

/// 验证限制值范围
pub fn validate_limit(limit: Option<i32>, default: i32, max: i32) -> i32 {
    limit.unwrap_or(default).max(1).min(max)
}
