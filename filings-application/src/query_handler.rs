use crate::{error::AppError, query::Query};
use async_trait::async_trait;

/// 查询处理器：只读，不得修改状态
#[async_trait]
pub trait QueryHandler: Send + Sync + 'static {
    type Query: Query;

    async fn handle(&self, q: Self::Query) -> Result<<Self::Query as Query>::Output, AppError>;
}
