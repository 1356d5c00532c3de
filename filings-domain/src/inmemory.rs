//! 基于内存的仓储实现
//!
//! 以 `tokio::sync::RwLock<HashMap<..>>` 存储实体副本，适用于测试与演示装配。
//!
use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::analysis::Analysis;
use crate::entity::Entity;
use crate::error::DomainResult;
use crate::filing::Filing;
use crate::repository::{AnalysisRepository, FilingRepository, TemplateRepository};
use crate::template::AnalysisTemplate;
use crate::value_object::{AccessionNumber, Cik};

#[derive(Default)]
pub struct InMemoryFilingRepository {
    filings: RwLock<HashMap<Uuid, Filing>>,
}

impl InMemoryFilingRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FilingRepository for InMemoryFilingRepository {
    async fn get(&self, id: Uuid) -> DomainResult<Option<Filing>> {
        Ok(self.filings.read().await.get(&id).cloned())
    }

    async fn find_by_accession(
        &self,
        accession: &AccessionNumber,
    ) -> DomainResult<Option<Filing>> {
        let filings = self.filings.read().await;
        Ok(filings
            .values()
            .find(|f| f.accession_number() == accession)
            .cloned())
    }

    async fn list_by_cik(
        &self,
        cik: &Cik,
        limit: usize,
        offset: usize,
    ) -> DomainResult<Vec<Filing>> {
        let filings = self.filings.read().await;
        let mut matched: Vec<&Filing> = filings.values().filter(|f| f.cik() == cik).collect();
        matched.sort_by(|a, b| {
            b.filed_on()
                .cmp(&a.filed_on())
                .then_with(|| a.accession_number().as_str().cmp(b.accession_number().as_str()))
        });
        Ok(matched
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count_by_cik(&self, cik: &Cik) -> DomainResult<usize> {
        let filings = self.filings.read().await;
        Ok(filings.values().filter(|f| f.cik() == cik).count())
    }

    async fn save(&self, filing: &Filing) -> DomainResult<()> {
        self.filings
            .write()
            .await
            .insert(*filing.id(), filing.clone());
        Ok(())
    }

    async fn insert_new(&self, filing: &Filing) -> DomainResult<bool> {
        let mut filings = self.filings.write().await;
        if filings
            .values()
            .any(|f| f.accession_number() == filing.accession_number())
        {
            return Ok(false);
        }
        filings.insert(*filing.id(), filing.clone());
        Ok(true)
    }
}

#[derive(Default)]
pub struct InMemoryTemplateRepository {
    templates: RwLock<HashMap<Uuid, AnalysisTemplate>>,
}

impl InMemoryTemplateRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TemplateRepository for InMemoryTemplateRepository {
    async fn get(&self, id: Uuid) -> DomainResult<Option<AnalysisTemplate>> {
        Ok(self.templates.read().await.get(&id).cloned())
    }

    async fn list(&self, limit: usize, offset: usize) -> DomainResult<Vec<AnalysisTemplate>> {
        let templates = self.templates.read().await;
        let mut all: Vec<&AnalysisTemplate> = templates.values().collect();
        all.sort_by(|a, b| a.name().cmp(b.name()).then_with(|| a.id().cmp(b.id())));
        Ok(all.into_iter().skip(offset).take(limit).cloned().collect())
    }

    async fn count(&self) -> DomainResult<usize> {
        Ok(self.templates.read().await.len())
    }

    async fn save(&self, template: &AnalysisTemplate) -> DomainResult<()> {
        self.templates
            .write()
            .await
            .insert(*template.id(), template.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> DomainResult<bool> {
        Ok(self.templates.write().await.remove(&id).is_some())
    }
}

#[derive(Default)]
pub struct InMemoryAnalysisRepository {
    analyses: RwLock<HashMap<Uuid, Analysis>>,
}

impl InMemoryAnalysisRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AnalysisRepository for InMemoryAnalysisRepository {
    async fn get(&self, id: Uuid) -> DomainResult<Option<Analysis>> {
        Ok(self.analyses.read().await.get(&id).cloned())
    }

    async fn list_by_template(&self, template_id: Uuid) -> DomainResult<Vec<Analysis>> {
        let analyses = self.analyses.read().await;
        Ok(analyses
            .values()
            .filter(|a| a.template_id() == template_id)
            .cloned()
            .collect())
    }

    async fn save(&self, analysis: &Analysis) -> DomainResult<()> {
        self.analyses
            .write()
            .await
            .insert(*analysis.id(), analysis.clone());
        Ok(())
    }
}
