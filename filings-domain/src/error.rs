//! 领域层统一错误定义
//!
//! 聚焦取值校验、状态流转、资源查找、仓储与外部服务等最小必要集合，
//! 便于应用层统一转换为 `AppError`。
//!
use thiserror::Error;

/// 统一错误类型（领域层最小必要集）
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DomainError {
    // --- 取值/状态 ---
    #[error("invalid value: {reason}")]
    InvalidValue { reason: String },
    #[error("invalid state: {reason}")]
    InvalidState { reason: String },

    // --- 查找 ---
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    // --- 仓储/外部服务 ---
    #[error("repository error: {reason}")]
    Repository { reason: String },
    #[error("external service error: service={service}, reason={reason}")]
    External {
        service: &'static str,
        reason: String,
    },

    #[error("serialization error: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },
}

impl DomainError {
    pub fn invalid_value(reason: impl Into<String>) -> Self {
        DomainError::InvalidValue {
            reason: reason.into(),
        }
    }

    pub fn invalid_state(reason: impl Into<String>) -> Self {
        DomainError::InvalidState {
            reason: reason.into(),
        }
    }

    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        DomainError::NotFound {
            resource,
            id: id.to_string(),
        }
    }
}

/// 统一 Result 类型别名
pub type DomainResult<T> = Result<T, DomainError>;

impl From<uuid::Error> for DomainError {
    fn from(err: uuid::Error) -> Self {
        DomainError::InvalidValue {
            reason: err.to_string(),
        }
    }
}

impl From<chrono::ParseError> for DomainError {
    fn from(err: chrono::ParseError) -> Self {
        DomainError::InvalidValue {
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_resource_and_id() {
        let err = DomainError::not_found("filing", "abc");
        assert_eq!(err.to_string(), "filing not found: abc");
    }

    #[test]
    fn uuid_parse_error_becomes_invalid_value() {
        let err: DomainError = uuid::Uuid::parse_str("nope").unwrap_err().into();
        assert!(matches!(err, DomainError::InvalidValue { .. }));
    }
}
