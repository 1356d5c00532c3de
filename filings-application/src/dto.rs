use serde::Serialize;

use crate::query::Pagination;

/// 数据传输对象（DTO）
///
/// - 作为应用层的输出载体，面向接口/外部系统序列化友好；
/// - 与领域模型解耦，避免将领域对象直接暴露到接口层；
/// - 应保持只读特性与简洁结构，适配不同用例的返回需求。
pub trait Dto: Serialize + Send + Sync + 'static {}

impl<T: Dto> Dto for Option<T> {}

/// 分页结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: usize,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total: usize, pagination: Pagination) -> Self {
        let page_size = pagination.page_size() as usize;
        Self {
            items,
            total,
            page: pagination.page(),
            page_size: pagination.page_size(),
            total_pages: total.div_ceil(page_size),
        }
    }

    pub fn has_next(&self) -> bool {
        (self.page as usize) < self.total_pages
    }
}

impl<T: Dto> Dto for PagedResult<T> {}
