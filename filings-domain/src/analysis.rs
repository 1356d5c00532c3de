//! 申报文件分析（Analysis）
//!
//! 一次“申报文件 × 模板”的分析任务及其逐章节结果。
//!
//! 状态流转：`Pending → Processing → Completed | Failed`，`Pending` 也可直接 `Failed`。
//! 非法流转返回 `DomainError::InvalidState`。
//!
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::entity::Entity;
use crate::error::{DomainError, DomainResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl AnalysisStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisStatus::Completed | AnalysisStatus::Failed)
    }
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AnalysisStatus::Pending => "pending",
            AnalysisStatus::Processing => "processing",
            AnalysisStatus::Completed => "completed",
            AnalysisStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    id: Uuid,
    filing_id: Uuid,
    template_id: Uuid,
    status: AnalysisStatus,
    results: BTreeMap<String, Value>,
    error: Option<String>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl Analysis {
    pub fn new(filing_id: Uuid, template_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            filing_id,
            template_id,
            status: AnalysisStatus::Pending,
            results: BTreeMap::new(),
            error: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn filing_id(&self) -> Uuid {
        self.filing_id
    }

    pub fn template_id(&self) -> Uuid {
        self.template_id
    }

    pub fn status(&self) -> AnalysisStatus {
        self.status
    }

    pub fn results(&self) -> &BTreeMap<String, Value> {
        &self.results
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn created_at(&self) -> &DateTime<Utc> {
        &self.created_at
    }

    pub fn completed_at(&self) -> Option<&DateTime<Utc>> {
        self.completed_at.as_ref()
    }

    pub fn begin(&mut self) -> DomainResult<()> {
        self.transition(AnalysisStatus::Pending, AnalysisStatus::Processing)
    }

    /// 记录单个章节的分析结果，仅在 `Processing` 状态下允许
    pub fn record_section(&mut self, section: impl Into<String>, result: Value) -> DomainResult<()> {
        if self.status != AnalysisStatus::Processing {
            return Err(DomainError::invalid_state(format!(
                "cannot record results while analysis is {}",
                self.status
            )));
        }
        self.results.insert(section.into(), result);
        Ok(())
    }

    pub fn complete(&mut self) -> DomainResult<()> {
        self.transition(AnalysisStatus::Processing, AnalysisStatus::Completed)?;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    pub fn fail(&mut self, reason: impl Into<String>) -> DomainResult<()> {
        if self.status.is_terminal() {
            return Err(DomainError::invalid_state(format!(
                "cannot fail analysis that is already {}",
                self.status
            )));
        }
        self.status = AnalysisStatus::Failed;
        self.error = Some(reason.into());
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    fn transition(&mut self, from: AnalysisStatus, to: AnalysisStatus) -> DomainResult<()> {
        if self.status != from {
            return Err(DomainError::invalid_state(format!(
                "cannot move analysis from {} to {to}",
                self.status
            )));
        }
        self.status = to;
        Ok(())
    }
}

impl Entity for Analysis {
    const TYPE: &'static str = "analysis";
    type Id = Uuid;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
