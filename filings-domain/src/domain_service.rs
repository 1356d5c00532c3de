//! 外部服务端口（External Services）
//!
//! 封装不属于单个实体的外部协作方：
//! - `EdgarService`：从 SEC EDGAR 获取申报元数据与章节正文；
//! - `FilingAnalyzer`：对章节正文执行基于模板的 LLM 分析，结果视为不透明 JSON。
//!
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DomainResult;
use crate::filing::FormType;
use crate::template::AnalysisTemplate;
use crate::value_object::{AccessionNumber, Cik};

/// EDGAR 返回的申报元数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilingMetadata {
    pub cik: Cik,
    pub company_name: String,
    pub form_type: FormType,
    pub accession_number: AccessionNumber,
    pub filed_on: NaiveDate,
    pub sections: Vec<String>,
}

#[async_trait]
pub trait EdgarService: Send + Sync {
    async fn fetch_filing(
        &self,
        cik: &Cik,
        accession: &AccessionNumber,
    ) -> DomainResult<FilingMetadata>;

    async fn fetch_section(&self, accession: &AccessionNumber, section: &str)
    -> DomainResult<String>;
}

#[async_trait]
pub trait FilingAnalyzer: Send + Sync {
    /// 分析单个章节正文，返回结构化结果
    async fn analyze(
        &self,
        template: &AnalysisTemplate,
        section: &str,
        content: &str,
    ) -> DomainResult<Value>;
}
