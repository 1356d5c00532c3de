//! 分析模板：创建、删除与列表
//!
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use filings_domain::analysis::AnalysisStatus;
use filings_domain::entity::Entity;
use filings_domain::repository::{AnalysisRepository, TemplateRepository};
use filings_domain::template::AnalysisTemplate;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::keys;
use crate::command::{Command, CommandEnvelope, require_id, require_not_blank};
use crate::command_handler::CommandHandler;
use crate::dependencies::{Dependencies, FromDependencies};
use crate::dto::{Dto, PagedResult};
use crate::error::AppError;
use crate::query::{Query, QueryEnvelope};
use crate::query_handler::QueryHandler;

/// 单个模板允许的最大章节数
pub const MAX_TEMPLATE_SECTIONS: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateDto {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub sections: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Dto for TemplateDto {}

impl From<&AnalysisTemplate> for TemplateDto {
    fn from(t: &AnalysisTemplate) -> Self {
        Self {
            id: *t.id(),
            name: t.name().to_string(),
            description: t.description().map(str::to_owned),
            sections: t.sections().to_vec(),
            created_at: *t.created_at(),
        }
    }
}

// ---- CreateTemplate ----

#[derive(Debug)]
pub struct CreateTemplate {
    envelope: CommandEnvelope,
    name: String,
    description: Option<String>,
    sections: Vec<String>,
}

impl CreateTemplate {
    pub fn new(
        envelope: CommandEnvelope,
        name: impl Into<String>,
        description: Option<String>,
        sections: Vec<String>,
    ) -> Result<Self, AppError> {
        Self {
            envelope,
            name: name.into(),
            description,
            sections,
        }
        .validated()
    }
}

impl Command for CreateTemplate {
    const NAME: &'static str = "create_template";
    type Output = Uuid;

    fn envelope(&self) -> &CommandEnvelope {
        &self.envelope
    }

    fn validate(&self) -> Result<(), AppError> {
        require_not_blank("name", &self.name)?;
        if self.sections.is_empty() {
            return Err(AppError::validation("sections must not be empty"));
        }
        if self.sections.len() > MAX_TEMPLATE_SECTIONS {
            return Err(AppError::validation(format!(
                "at most {MAX_TEMPLATE_SECTIONS} sections are allowed, got {}",
                self.sections.len()
            )));
        }
        for section in &self.sections {
            require_not_blank("section", section)?;
        }
        Ok(())
    }
}

pub struct CreateTemplateHandler {
    templates: Arc<dyn TemplateRepository>,
}

impl FromDependencies for CreateTemplateHandler {
    fn from_dependencies(deps: &Dependencies) -> Result<Self, AppError> {
        Ok(Self {
            templates: deps.resolve(keys::TEMPLATE_REPOSITORY)?,
        })
    }
}

#[async_trait]
impl CommandHandler for CreateTemplateHandler {
    type Command = CreateTemplate;

    async fn handle(&self, cmd: CreateTemplate) -> Result<Uuid, AppError> {
        let template = AnalysisTemplate::new(cmd.name, cmd.description, cmd.sections)?;
        self.templates.save(&template).await?;
        info!(template_id = %template.id(), name = template.name(), "template created");
        Ok(*template.id())
    }
}

// ---- DeleteTemplate ----

#[derive(Debug)]
pub struct DeleteTemplate {
    envelope: CommandEnvelope,
    template_id: Uuid,
}

impl DeleteTemplate {
    pub fn new(envelope: CommandEnvelope, template_id: Uuid) -> Result<Self, AppError> {
        Self {
            envelope,
            template_id,
        }
        .validated()
    }
}

impl Command for DeleteTemplate {
    const NAME: &'static str = "delete_template";
    type Output = ();

    fn envelope(&self) -> &CommandEnvelope {
        &self.envelope
    }

    fn validate(&self) -> Result<(), AppError> {
        require_id("template_id", &self.template_id)
    }
}

pub struct DeleteTemplateHandler {
    templates: Arc<dyn TemplateRepository>,
    analyses: Arc<dyn AnalysisRepository>,
}

impl FromDependencies for DeleteTemplateHandler {
    fn from_dependencies(deps: &Dependencies) -> Result<Self, AppError> {
        Ok(Self {
            templates: deps.resolve(keys::TEMPLATE_REPOSITORY)?,
            analyses: deps.resolve(keys::ANALYSIS_REPOSITORY)?,
        })
    }
}

#[async_trait]
impl CommandHandler for DeleteTemplateHandler {
    type Command = DeleteTemplate;

    async fn handle(&self, cmd: DeleteTemplate) -> Result<(), AppError> {
        if self.templates.get(cmd.template_id).await?.is_none() {
            return Err(AppError::not_found(AnalysisTemplate::TYPE, cmd.template_id));
        }

        let in_flight = self
            .analyses
            .list_by_template(cmd.template_id)
            .await?
            .iter()
            .filter(|a| matches!(a.status(), AnalysisStatus::Pending | AnalysisStatus::Processing))
            .count();
        if in_flight > 0 {
            return Err(AppError::business_rule(format!(
                "template {} has {in_flight} analyses in progress",
                cmd.template_id
            )));
        }

        self.templates.delete(cmd.template_id).await?;
        info!(template_id = %cmd.template_id, "template deleted");
        Ok(())
    }
}

// ---- ListTemplates ----

#[derive(Debug)]
pub struct ListTemplates {
    envelope: QueryEnvelope,
}

impl ListTemplates {
    pub fn new(envelope: QueryEnvelope) -> Result<Self, AppError> {
        Self { envelope }.validated()
    }
}

impl Query for ListTemplates {
    const NAME: &'static str = "list_templates";
    type Output = PagedResult<TemplateDto>;

    fn envelope(&self) -> &QueryEnvelope {
        &self.envelope
    }
}

pub struct ListTemplatesHandler {
    templates: Arc<dyn TemplateRepository>,
}

impl FromDependencies for ListTemplatesHandler {
    fn from_dependencies(deps: &Dependencies) -> Result<Self, AppError> {
        Ok(Self {
            templates: deps.resolve(keys::TEMPLATE_REPOSITORY)?,
        })
    }
}

#[async_trait]
impl QueryHandler for ListTemplatesHandler {
    type Query = ListTemplates;

    async fn handle(&self, q: ListTemplates) -> Result<PagedResult<TemplateDto>, AppError> {
        let pagination = q.pagination();
        let (limit, offset) = pagination.limit_offset();
        let total = self.templates.count().await?;
        let items = self
            .templates
            .list(limit, offset)
            .await?
            .iter()
            .map(TemplateDto::from)
            .collect();
        Ok(PagedResult::new(items, total, pagination))
    }
}
