use filings_domain::error::DomainError;

/// 应用层统一错误
///
/// 调度器对处理器返回的错误不做任何包装或转换，调用方可直接按变体匹配：
/// - `Validation`：命令/查询构造期校验失败（分发之前即返回）；
/// - `HandlerNotFound`：请求类型未注册处理器；
/// - `DependencyResolution`：首次构造处理器时某个依赖无法解析；
/// - `BusinessRule` / `NotFound`：处理器主动抛出的业务错误；
/// - 其余变体：协作方（仓储、外部服务）的失败。
#[non_exhaustive]
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("validation: {0}")]
    Validation(String),

    #[error("handler not found: {0}")]
    HandlerNotFound(&'static str),

    #[error("dependency resolution failed: parameter={parameter}")]
    DependencyResolution { parameter: String },

    #[error("business rule violated: {0}")]
    BusinessRule(String),

    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    #[error("infra: {0}")]
    Infra(String),

    #[error("external service error: service={service}, reason={reason}")]
    External {
        service: &'static str,
        reason: String,
    },

    #[error("type mismatch: expected={expected}, found={found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

impl AppError {
    pub fn validation(reason: impl Into<String>) -> Self {
        AppError::Validation(reason.into())
    }

    pub fn business_rule(reason: impl Into<String>) -> Self {
        AppError::BusinessRule(reason.into())
    }

    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        AppError::NotFound {
            resource,
            id: id.to_string(),
        }
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidValue { reason } => AppError::Validation(reason),
            DomainError::InvalidState { reason } => AppError::BusinessRule(reason),
            DomainError::NotFound { resource, id } => AppError::NotFound { resource, id },
            DomainError::External { service, reason } => AppError::External { service, reason },
            other => AppError::Infra(other.to_string()),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
