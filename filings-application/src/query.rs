use bon::Builder;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::dto::Dto;
use crate::error::AppError;

/// 单页最大条数
pub const MAX_PAGE_SIZE: u32 = 100;
/// 默认单页条数
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// 应用层查询（Query）
///
/// 表达只读意图，不改变领域状态。
/// - 结果返回 [`Dto`](crate::dto::Dto)；
/// - 与 [`Command`](crate::command::Command) 相对，`Query` 应避免副作用；
/// - 分页参数在 [`Pagination`] 构造时即校验，子类型可在 `validate` 中追加自身规则。
pub trait Query: Send + Sync + 'static {
    /// 查询的稳定名称（建议常量字符串，不随重构变化）
    const NAME: &'static str;

    /// 查询返回的数据传输对象（序列化友好、与领域模型解耦）
    type Output: Dto;

    fn envelope(&self) -> &QueryEnvelope;

    fn validate(&self) -> Result<(), AppError> {
        Ok(())
    }

    fn validated(self) -> Result<Self, AppError>
    where
        Self: Sized,
    {
        self.validate()?;
        Ok(self)
    }

    fn pagination(&self) -> Pagination {
        self.envelope().pagination()
    }
}

/// 分页参数（页码从 1 开始）
///
/// ```rust
/// use filings_application::query::Pagination;
///
/// let p = Pagination::new(3, 25).unwrap();
/// assert_eq!(p.offset(), 50);
/// assert!(Pagination::new(0, 25).is_err());
/// assert!(Pagination::new(1, 101).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    page: u32,
    page_size: u32,
}

impl Pagination {
    pub fn new(page: u32, page_size: u32) -> Result<Self, AppError> {
        if page < 1 {
            return Err(AppError::validation(format!(
                "page must be >= 1, got {page}"
            )));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(AppError::validation(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}, got {page_size}"
            )));
        }
        Ok(Self { page, page_size })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// `(page - 1) * page_size`
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    /// 仓储接口使用的 `limit/offset`
    pub fn limit_offset(&self) -> (usize, usize) {
        (
            self.page_size as usize,
            usize::try_from(self.offset()).unwrap_or(usize::MAX),
        )
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// 查询信封
#[derive(Builder, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryEnvelope {
    #[builder(skip = Uuid::new_v4())]
    id: Uuid,
    #[builder(skip = Utc::now())]
    created_at: DateTime<Utc>,
    user_id: Option<String>,
    #[builder(default)]
    pagination: Pagination,
}

impl Default for QueryEnvelope {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl QueryEnvelope {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> &DateTime<Utc> {
        &self.created_at
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn offset_examples() {
        assert_eq!(Pagination::new(3, 25).unwrap().offset(), 50);
        assert_eq!(Pagination::new(1, 100).unwrap().offset(), 0);
        assert_eq!(Pagination::default().offset(), 0);
        assert_eq!(Pagination::default().page_size(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn bounds_are_enforced() {
        assert!(matches!(Pagination::new(0, 10), Err(AppError::Validation(_))));
        assert!(matches!(Pagination::new(1, 0), Err(AppError::Validation(_))));
        assert!(matches!(Pagination::new(1, 101), Err(AppError::Validation(_))));
        assert!(Pagination::new(1, 1).is_ok());
        assert!(Pagination::new(1, 100).is_ok());
    }

    #[test]
    fn envelope_defaults_to_first_page() {
        let env = QueryEnvelope::builder().user_id("u-1".into()).build();
        assert_eq!(env.pagination(), Pagination::default());
        assert_eq!(env.user_id(), Some("u-1"));
    }

    proptest! {
        #[test]
        fn offset_matches_formula(page in 1u32..=100_000, page_size in 1u32..=MAX_PAGE_SIZE) {
            let p = Pagination::new(page, page_size).unwrap();
            prop_assert_eq!(p.offset(), (u64::from(page) - 1) * u64::from(page_size));
            prop_assert_eq!(p.limit_offset().0, page_size as usize);
        }

        #[test]
        fn oversized_pages_are_rejected(page in 1u32..1000, page_size in (MAX_PAGE_SIZE + 1)..u32::MAX) {
            prop_assert!(Pagination::new(page, page_size).is_err());
        }
    }
}
