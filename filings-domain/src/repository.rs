//! 仓储端口（Repository）
//!
//! 仅定义读写接口；具体存储后端（如 Postgres）由基础设施层实现并注入。
//! 分页参数统一使用 `limit/offset`。
//!
use async_trait::async_trait;
use uuid::Uuid;

use crate::analysis::Analysis;
use crate::error::DomainResult;
use crate::filing::Filing;
use crate::template::AnalysisTemplate;
use crate::value_object::{AccessionNumber, Cik};

#[async_trait]
pub trait FilingRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> DomainResult<Option<Filing>>;

    async fn find_by_accession(
        &self,
        accession: &AccessionNumber,
    ) -> DomainResult<Option<Filing>>;

    /// 按申报日期倒序列出某公司的申报文件
    async fn list_by_cik(&self, cik: &Cik, limit: usize, offset: usize)
    -> DomainResult<Vec<Filing>>;

    async fn count_by_cik(&self, cik: &Cik) -> DomainResult<usize>;

    async fn save(&self, filing: &Filing) -> DomainResult<()>;

    /// 受理号唯一：仅当尚无相同受理号的申报文件时写入，返回是否写入
    ///
    /// 检查与写入必须是一个原子操作。
    async fn insert_new(&self, filing: &Filing) -> DomainResult<bool>;
}

#[async_trait]
pub trait TemplateRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> DomainResult<Option<AnalysisTemplate>>;

    /// 按名称升序列出模板
    async fn list(&self, limit: usize, offset: usize) -> DomainResult<Vec<AnalysisTemplate>>;

    async fn count(&self) -> DomainResult<usize>;

    async fn save(&self, template: &AnalysisTemplate) -> DomainResult<()>;

    /// 删除模板，返回是否存在
    async fn delete(&self, id: Uuid) -> DomainResult<bool>;
}

#[async_trait]
pub trait AnalysisRepository: Send + Sync {
    async fn get(&self, id: Uuid) -> DomainResult<Option<Analysis>>;

    async fn list_by_template(&self, template_id: Uuid) -> DomainResult<Vec<Analysis>>;

    async fn save(&self, analysis: &Analysis) -> DomainResult<()>;
}
