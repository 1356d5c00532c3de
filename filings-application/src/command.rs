use bon::Builder;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;

/// 应用层命令（Command）
///
/// 表达“意图”的写操作请求，通常会修改领域状态。
/// - 命令构造即校验：具体命令应保持字段私有，仅暴露以 [`Command::validated`]
///   收尾的构造函数，从而不存在“未校验”的命令实例；
/// - 构造后不可变，只被对应处理器消费一次，本身不持久化；
/// - 建议保持语义化的“动宾结构”命名，如 `ImportFiling`、`DeleteTemplate`。
///
/// 关联常量：
/// - `NAME`：命令的稳定名称，用于日志、追踪与错误信息。避免依赖 `type_name::<T>()`。
pub trait Command: Send + Sync + 'static {
    /// 命令的稳定名称（建议常量字符串，不随重构变化）
    const NAME: &'static str;

    /// 处理结果类型
    type Output: Send + 'static;

    /// 命令信封（标识、时间戳、关联 ID、执行者）
    fn envelope(&self) -> &CommandEnvelope;

    /// 命令载荷的语义校验，失败时返回 `AppError::Validation`
    fn validate(&self) -> Result<(), AppError>;

    /// 校验通过后返回自身
    fn validated(self) -> Result<Self, AppError>
    where
        Self: Sized,
    {
        self.validate()?;
        Ok(self)
    }
}

/// 命令信封
///
/// `id` 与 `created_at` 在构造时生成，不可由调用方指定。
///
/// ```rust
/// use filings_application::command::CommandEnvelope;
///
/// let env = CommandEnvelope::builder()
///     .correlation_id("req-42".into())
///     .user_id("u-1".into())
///     .build();
/// assert_eq!(env.correlation_id(), Some("req-42"));
/// ```
#[derive(Builder, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandEnvelope {
    #[builder(skip = Uuid::new_v4())]
    id: Uuid,
    #[builder(skip = Utc::now())]
    created_at: DateTime<Utc>,
    /// 关联 ID：由调用方沿请求链传递
    correlation_id: Option<String>,
    /// 执行者 ID
    user_id: Option<String>,
}

impl Default for CommandEnvelope {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl CommandEnvelope {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> &DateTime<Utc> {
        &self.created_at
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }
}

/// 必填字符串字段校验
pub fn require_not_blank(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

/// 必填标识字段校验
pub fn require_id(field: &str, value: &Uuid) -> Result<(), AppError> {
    if value.is_nil() {
        return Err(AppError::validation(format!("{field} must not be nil")));
    }
    Ok(())
}
