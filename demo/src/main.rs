//! 端到端演示：导入申报文件、创建模板、执行分析并查询结果
//!
//! EDGAR 与分析器使用本地夹具实现；配置从 `filings.yaml` 与 `FILINGS_` 环境变量读取。
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use filings_application::ApplicationService;
use filings_application::command::CommandEnvelope;
use filings_application::config::ConfigLoader;
use filings_application::handlers::analysis::{GetAnalysis, RunAnalysis};
use filings_application::handlers::filing::{ImportFiling, ListCompanyFilings};
use filings_application::handlers::template::{CreateTemplate, ListTemplates};
use filings_application::query::{Pagination, QueryEnvelope};
use filings_application::telemetry;
use filings_domain::domain_service::{EdgarService, FilingAnalyzer, FilingMetadata};
use filings_domain::error::{DomainError, DomainResult};
use filings_domain::filing::FormType;
use filings_domain::inmemory::{
    InMemoryAnalysisRepository, InMemoryFilingRepository, InMemoryTemplateRepository,
};
use filings_domain::template::AnalysisTemplate;
use filings_domain::value_object::{AccessionNumber, Cik};
use serde_json::{Value, json};
use tracing::info;

const CIK: &str = "0000320193";
const ACCESSIONS: [&str; 2] = ["0000320193-23-000106", "0000320193-24-000123"];

struct FixtureEdgar;

#[async_trait]
impl EdgarService for FixtureEdgar {
    async fn fetch_filing(
        &self,
        cik: &Cik,
        accession: &AccessionNumber,
    ) -> DomainResult<FilingMetadata> {
        if accession.filer_id() != cik.as_str() {
            return Err(DomainError::External {
                service: "edgar",
                reason: format!("{accession} not found for {cik}"),
            });
        }
        let year = 2000 + accession.as_str()[11..13].parse::<i32>().unwrap_or(0);
        let filed_on = NaiveDate::from_ymd_opt(year, 11, 1).ok_or_else(|| {
            DomainError::invalid_value(format!("no filing date for {accession}"))
        })?;
        Ok(FilingMetadata {
            cik: cik.clone(),
            company_name: "Apple Inc.".into(),
            form_type: FormType::TenK,
            accession_number: accession.clone(),
            filed_on,
            sections: vec!["item_1".into(), "item_1a".into(), "item_7".into()],
        })
    }

    async fn fetch_section(&self, accession: &AccessionNumber, section: &str) -> DomainResult<String> {
        Ok(format!(
            "{section} of {accession}: the company faces competition, supply chain \
             constraints and currency risk."
        ))
    }
}

struct KeywordAnalyzer;

#[async_trait]
impl FilingAnalyzer for KeywordAnalyzer {
    async fn analyze(
        &self,
        template: &AnalysisTemplate,
        section: &str,
        content: &str,
    ) -> DomainResult<Value> {
        let hits: Vec<&str> = ["risk", "competition", "supply chain"]
            .into_iter()
            .filter(|kw| content.contains(kw))
            .collect();
        Ok(json!({
            "template": template.name(),
            "section": section,
            "keywords": hits,
        }))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ConfigLoader::load()?;
    telemetry::init(&config.log)?;
    info!(level = %config.log.level, "configuration loaded");

    let service = ApplicationService::builder()
        .filing_repository(Arc::new(InMemoryFilingRepository::new()))
        .template_repository(Arc::new(InMemoryTemplateRepository::new()))
        .analysis_repository(Arc::new(InMemoryAnalysisRepository::new()))
        .edgar_service(Arc::new(FixtureEdgar))
        .analyzer(Arc::new(KeywordAnalyzer))
        .analysis_options(config.analysis)
        .build();

    let envelope = || {
        CommandEnvelope::builder()
            .correlation_id("demo-1".into())
            .user_id("analyst".into())
            .build()
    };

    let mut last_filing = None;
    for acc in ACCESSIONS {
        let id = service
            .execute_command(ImportFiling::new(envelope(), CIK, acc)?)
            .await?;
        last_filing = Some(id);
    }
    let filing_id = last_filing.ok_or_else(|| anyhow::anyhow!("no filing imported"))?;

    let template_id = service
        .execute_command(CreateTemplate::new(
            envelope(),
            "risk-overview",
            Some("risk factors and md&a".into()),
            vec!["item_1a".into(), "item_7".into()],
        )?)
        .await?;

    let analysis_id = service
        .execute_command(RunAnalysis::new(envelope(), filing_id, template_id)?)
        .await?;

    let analysis = service
        .execute_query(GetAnalysis::new(QueryEnvelope::default(), analysis_id)?)
        .await?;
    println!("analysis:\n{}", serde_json::to_string_pretty(&analysis)?);

    let page = QueryEnvelope::builder()
        .pagination(Pagination::new(1, config.default_page_size)?)
        .build();
    let filings = service
        .execute_query(ListCompanyFilings::new(page, CIK)?)
        .await?;
    println!("filings:\n{}", serde_json::to_string_pretty(&filings)?);

    let templates = service
        .execute_query(ListTemplates::new(QueryEnvelope::default())?)
        .await?;
    println!("templates: {}", templates.total);

    Ok(())
}
