//! 申报文件分析：执行与结果查询
//!
//! `RunAnalysis` 依模板顺序逐章节获取正文并交由分析器处理。任一章节失败时，
//! 分析记录被标记为 `Failed` 并持久化，随后原样返回该错误。
//!
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use filings_domain::analysis::{Analysis, AnalysisStatus};
use filings_domain::domain_service::{EdgarService, FilingAnalyzer};
use filings_domain::entity::Entity;
use filings_domain::filing::Filing;
use filings_domain::repository::{AnalysisRepository, FilingRepository, TemplateRepository};
use filings_domain::template::AnalysisTemplate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::keys;
use crate::command::{Command, CommandEnvelope, require_id};
use crate::command_handler::CommandHandler;
use crate::dependencies::{Dependencies, FromDependencies};
use crate::dto::Dto;
use crate::error::AppError;
use crate::query::{Query, QueryEnvelope};
use crate::query_handler::QueryHandler;

/// 分析执行参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    /// 交给分析器的单章节最大字符数，超出部分截断
    pub max_section_chars: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            max_section_chars: 100_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisDto {
    pub id: Uuid,
    pub filing_id: Uuid,
    pub template_id: Uuid,
    pub status: AnalysisStatus,
    pub results: BTreeMap<String, Value>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Dto for AnalysisDto {}

impl From<&Analysis> for AnalysisDto {
    fn from(a: &Analysis) -> Self {
        Self {
            id: *a.id(),
            filing_id: a.filing_id(),
            template_id: a.template_id(),
            status: a.status(),
            results: a.results().clone(),
            error: a.error().map(str::to_owned),
            created_at: *a.created_at(),
            completed_at: a.completed_at().copied(),
        }
    }
}

// ---- RunAnalysis ----

#[derive(Debug)]
pub struct RunAnalysis {
    envelope: CommandEnvelope,
    filing_id: Uuid,
    template_id: Uuid,
}

impl RunAnalysis {
    pub fn new(envelope: CommandEnvelope, filing_id: Uuid, template_id: Uuid) -> Result<Self, AppError> {
        Self {
            envelope,
            filing_id,
            template_id,
        }
        .validated()
    }
}

impl Command for RunAnalysis {
    const NAME: &'static str = "run_analysis";
    type Output = Uuid;

    fn envelope(&self) -> &CommandEnvelope {
        &self.envelope
    }

    fn validate(&self) -> Result<(), AppError> {
        require_id("filing_id", &self.filing_id)?;
        require_id("template_id", &self.template_id)
    }
}

pub struct RunAnalysisHandler {
    filings: Arc<dyn FilingRepository>,
    templates: Arc<dyn TemplateRepository>,
    analyses: Arc<dyn AnalysisRepository>,
    edgar: Arc<dyn EdgarService>,
    analyzer: Arc<dyn FilingAnalyzer>,
    options: AnalysisOptions,
}

impl FromDependencies for RunAnalysisHandler {
    fn from_dependencies(deps: &Dependencies) -> Result<Self, AppError> {
        Ok(Self {
            filings: deps.resolve(keys::FILING_REPOSITORY)?,
            templates: deps.resolve(keys::TEMPLATE_REPOSITORY)?,
            analyses: deps.resolve(keys::ANALYSIS_REPOSITORY)?,
            edgar: deps.resolve(keys::EDGAR_SERVICE)?,
            analyzer: deps.resolve(keys::ANALYZER)?,
            options: deps.resolve_or_else(keys::ANALYSIS_OPTIONS, AnalysisOptions::default),
        })
    }
}

impl RunAnalysisHandler {
    async fn analyze_sections(
        &self,
        filing: &Filing,
        template: &AnalysisTemplate,
        analysis: &mut Analysis,
    ) -> Result<(), AppError> {
        for section in template.sections() {
            let content = self
                .edgar
                .fetch_section(filing.accession_number(), section)
                .await?;
            let content = truncate_chars(&content, self.options.max_section_chars);
            debug!(
                analysis_id = %analysis.id(),
                section = section.as_str(),
                chars = content.chars().count(),
                "analyzing section"
            );
            let result = self.analyzer.analyze(template, section, content).await?;
            analysis.record_section(section.clone(), result)?;
        }
        Ok(())
    }

    /// 标记失败并持久化；此处的错误只记录日志，调用方始终收到分析本身的错误
    async fn record_failure(&self, analysis: &mut Analysis, cause: &AppError) {
        if let Err(err) = analysis.fail(cause.to_string()) {
            error!(analysis_id = %analysis.id(), error = %err, "cannot mark analysis failed");
            return;
        }
        if let Err(err) = self.analyses.save(analysis).await {
            error!(analysis_id = %analysis.id(), error = %err, "failed analysis not persisted");
        }
    }
}

#[async_trait]
impl CommandHandler for RunAnalysisHandler {
    type Command = RunAnalysis;

    async fn handle(&self, cmd: RunAnalysis) -> Result<Uuid, AppError> {
        let filing = self
            .filings
            .get(cmd.filing_id)
            .await?
            .ok_or_else(|| AppError::not_found(Filing::TYPE, cmd.filing_id))?;
        let template = self
            .templates
            .get(cmd.template_id)
            .await?
            .ok_or_else(|| AppError::not_found(AnalysisTemplate::TYPE, cmd.template_id))?;

        let missing: Vec<&str> = template
            .sections()
            .iter()
            .filter(|s| !filing.has_section(s))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(AppError::business_rule(format!(
                "filing {} has no sections [{}] required by template '{}'",
                filing.accession_number(),
                missing.join(", "),
                template.name()
            )));
        }

        let mut analysis = Analysis::new(*filing.id(), *template.id());
        analysis.begin()?;
        self.analyses.save(&analysis).await?;

        if let Err(err) = self.analyze_sections(&filing, &template, &mut analysis).await {
            warn!(analysis_id = %analysis.id(), error = %err, "analysis failed");
            self.record_failure(&mut analysis, &err).await;
            return Err(err);
        }

        analysis.complete()?;
        self.analyses.save(&analysis).await?;
        info!(
            analysis_id = %analysis.id(),
            filing_id = %filing.id(),
            template_id = %template.id(),
            sections = analysis.results().len(),
            "analysis completed"
        );
        Ok(*analysis.id())
    }
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

// ---- GetAnalysis ----

#[derive(Debug)]
pub struct GetAnalysis {
    envelope: QueryEnvelope,
    analysis_id: Uuid,
}

impl GetAnalysis {
    pub fn new(envelope: QueryEnvelope, analysis_id: Uuid) -> Result<Self, AppError> {
        Self {
            envelope,
            analysis_id,
        }
        .validated()
    }
}

impl Query for GetAnalysis {
    const NAME: &'static str = "get_analysis";
    type Output = AnalysisDto;

    fn envelope(&self) -> &QueryEnvelope {
        &self.envelope
    }

    fn validate(&self) -> Result<(), AppError> {
        require_id("analysis_id", &self.analysis_id)
    }
}

pub struct GetAnalysisHandler {
    analyses: Arc<dyn AnalysisRepository>,
}

impl FromDependencies for GetAnalysisHandler {
    fn from_dependencies(deps: &Dependencies) -> Result<Self, AppError> {
        Ok(Self {
            analyses: deps.resolve(keys::ANALYSIS_REPOSITORY)?,
        })
    }
}

#[async_trait]
impl QueryHandler for GetAnalysisHandler {
    type Query = GetAnalysis;

    async fn handle(&self, q: GetAnalysis) -> Result<AnalysisDto, AppError> {
        self.analyses
            .get(q.analysis_id)
            .await?
            .as_ref()
            .map(AnalysisDto::from)
            .ok_or_else(|| AppError::not_found(Analysis::TYPE, q.analysis_id))
    }
}
