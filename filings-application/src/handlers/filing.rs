//! 申报文件：导入命令与查询
//!
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use filings_domain::domain_service::EdgarService;
use filings_domain::entity::Entity;
use filings_domain::filing::Filing;
use filings_domain::repository::FilingRepository;
use filings_domain::value_object::{AccessionNumber, Cik, ValueObject};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::keys;
use crate::command::{Command, CommandEnvelope, require_id};
use crate::command_handler::CommandHandler;
use crate::dependencies::{Dependencies, FromDependencies};
use crate::dto::{Dto, PagedResult};
use crate::error::AppError;
use crate::query::{Query, QueryEnvelope};
use crate::query_handler::QueryHandler;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilingDto {
    pub id: Uuid,
    pub cik: String,
    pub company_name: String,
    pub form_type: String,
    pub accession_number: String,
    pub filed_on: NaiveDate,
    pub sections: Vec<String>,
    pub imported_at: DateTime<Utc>,
}

impl Dto for FilingDto {}

impl From<&Filing> for FilingDto {
    fn from(f: &Filing) -> Self {
        Self {
            id: *f.id(),
            cik: f.cik().to_string(),
            company_name: f.company_name().to_string(),
            form_type: f.form_type().to_string(),
            accession_number: f.accession_number().to_string(),
            filed_on: f.filed_on(),
            sections: f.sections().to_vec(),
            imported_at: *f.imported_at(),
        }
    }
}

// ---- ImportFiling ----

/// 从 EDGAR 导入一份申报文件
#[derive(Debug)]
pub struct ImportFiling {
    envelope: CommandEnvelope,
    cik: Cik,
    accession_number: AccessionNumber,
}

impl ImportFiling {
    pub fn new(envelope: CommandEnvelope, cik: &str, accession_number: &str) -> Result<Self, AppError> {
        Self {
            envelope,
            cik: cik.parse()?,
            accession_number: accession_number.parse()?,
        }
        .validated()
    }

    pub fn cik(&self) -> &Cik {
        &self.cik
    }

    pub fn accession_number(&self) -> &AccessionNumber {
        &self.accession_number
    }
}

impl Command for ImportFiling {
    const NAME: &'static str = "import_filing";
    type Output = Uuid;

    fn envelope(&self) -> &CommandEnvelope {
        &self.envelope
    }

    fn validate(&self) -> Result<(), AppError> {
        self.cik.validate()?;
        self.accession_number.validate()?;
        Ok(())
    }
}

pub struct ImportFilingHandler {
    filings: Arc<dyn FilingRepository>,
    edgar: Arc<dyn EdgarService>,
}

impl FromDependencies for ImportFilingHandler {
    fn from_dependencies(deps: &Dependencies) -> Result<Self, AppError> {
        Ok(Self {
            filings: deps.resolve(keys::FILING_REPOSITORY)?,
            edgar: deps.resolve(keys::EDGAR_SERVICE)?,
        })
    }
}

#[async_trait]
impl CommandHandler for ImportFilingHandler {
    type Command = ImportFiling;

    async fn handle(&self, cmd: ImportFiling) -> Result<Uuid, AppError> {
        // 快速路径；唯一性最终由 insert_new 保证
        if let Some(existing) = self.filings.find_by_accession(cmd.accession_number()).await? {
            return Err(AppError::business_rule(format!(
                "filing {} already imported as {}",
                cmd.accession_number(),
                existing.id()
            )));
        }

        let meta = self
            .edgar
            .fetch_filing(cmd.cik(), cmd.accession_number())
            .await?;
        if &meta.cik != cmd.cik() {
            return Err(AppError::business_rule(format!(
                "filing {} belongs to cik {}, not {}",
                cmd.accession_number(),
                meta.cik,
                cmd.cik()
            )));
        }
        if &meta.accession_number != cmd.accession_number() {
            return Err(AppError::business_rule(format!(
                "edgar returned filing {} for requested {}",
                meta.accession_number,
                cmd.accession_number()
            )));
        }

        let filing = Filing::builder()
            .cik(meta.cik)
            .company_name(meta.company_name)
            .form_type(meta.form_type)
            .accession_number(meta.accession_number)
            .filed_on(meta.filed_on)
            .sections(meta.sections)
            .build();
        if !self.filings.insert_new(&filing).await? {
            return Err(AppError::business_rule(format!(
                "filing {} already imported",
                cmd.accession_number()
            )));
        }

        info!(
            filing_id = %filing.id(),
            accession_number = %filing.accession_number(),
            form_type = %filing.form_type(),
            "filing imported"
        );
        Ok(*filing.id())
    }
}

// ---- GetFiling ----

#[derive(Debug)]
pub struct GetFiling {
    envelope: QueryEnvelope,
    filing_id: Uuid,
}

impl GetFiling {
    pub fn new(envelope: QueryEnvelope, filing_id: Uuid) -> Result<Self, AppError> {
        Self {
            envelope,
            filing_id,
        }
        .validated()
    }
}

impl Query for GetFiling {
    const NAME: &'static str = "get_filing";
    type Output = FilingDto;

    fn envelope(&self) -> &QueryEnvelope {
        &self.envelope
    }

    fn validate(&self) -> Result<(), AppError> {
        require_id("filing_id", &self.filing_id)
    }
}

pub struct GetFilingHandler {
    filings: Arc<dyn FilingRepository>,
}

impl FromDependencies for GetFilingHandler {
    fn from_dependencies(deps: &Dependencies) -> Result<Self, AppError> {
        Ok(Self {
            filings: deps.resolve(keys::FILING_REPOSITORY)?,
        })
    }
}

#[async_trait]
impl QueryHandler for GetFilingHandler {
    type Query = GetFiling;

    async fn handle(&self, q: GetFiling) -> Result<FilingDto, AppError> {
        self.filings
            .get(q.filing_id)
            .await?
            .as_ref()
            .map(FilingDto::from)
            .ok_or_else(|| AppError::not_found(Filing::TYPE, q.filing_id))
    }
}

// ---- ListCompanyFilings ----

#[derive(Debug)]
pub struct ListCompanyFilings {
    envelope: QueryEnvelope,
    cik: Cik,
}

impl ListCompanyFilings {
    pub fn new(envelope: QueryEnvelope, cik: &str) -> Result<Self, AppError> {
        Self {
            envelope,
            cik: cik.parse()?,
        }
        .validated()
    }
}

impl Query for ListCompanyFilings {
    const NAME: &'static str = "list_company_filings";
    type Output = PagedResult<FilingDto>;

    fn envelope(&self) -> &QueryEnvelope {
        &self.envelope
    }

    fn validate(&self) -> Result<(), AppError> {
        Ok(self.cik.validate()?)
    }
}

pub struct ListCompanyFilingsHandler {
    filings: Arc<dyn FilingRepository>,
}

impl FromDependencies for ListCompanyFilingsHandler {
    fn from_dependencies(deps: &Dependencies) -> Result<Self, AppError> {
        Ok(Self {
            filings: deps.resolve(keys::FILING_REPOSITORY)?,
        })
    }
}

#[async_trait]
impl QueryHandler for ListCompanyFilingsHandler {
    type Query = ListCompanyFilings;

    async fn handle(&self, q: ListCompanyFilings) -> Result<PagedResult<FilingDto>, AppError> {
        let pagination = q.pagination();
        let (limit, offset) = pagination.limit_offset();
        let total = self.filings.count_by_cik(&q.cik).await?;
        let items = self
            .filings
            .list_by_cik(&q.cik, limit, offset)
            .await?
            .iter()
            .map(FilingDto::from)
            .collect();
        Ok(PagedResult::new(items, total, pagination))
    }
}
