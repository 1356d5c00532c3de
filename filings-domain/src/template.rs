//! 分析模板（Analysis Template）
//!
//! 描述对一份申报文件需要分析的章节集合。
//!
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::Entity;
use crate::error::{DomainError, DomainResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisTemplate {
    id: Uuid,
    name: String,
    description: Option<String>,
    /// 有序的章节键，分析时按此顺序执行
    sections: Vec<String>,
    created_at: DateTime<Utc>,
}

impl AnalysisTemplate {
    /// 创建模板：名称非空、章节非空且不重复
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        sections: Vec<String>,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::invalid_value("template name must not be empty"));
        }
        if sections.is_empty() {
            return Err(DomainError::invalid_value(
                "template must declare at least one section",
            ));
        }
        let mut seen = HashSet::new();
        for section in &sections {
            if section.trim().is_empty() {
                return Err(DomainError::invalid_value("section key must not be empty"));
            }
            if !seen.insert(section.as_str()) {
                return Err(DomainError::invalid_value(format!(
                    "duplicate section key '{section}'"
                )));
            }
        }

        Ok(Self {
            id: Uuid::new_v4(),
            name,
            description,
            sections,
            created_at: Utc::now(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn sections(&self) -> &[String] {
        &self.sections
    }

    pub fn created_at(&self) -> &DateTime<Utc> {
        &self.created_at
    }
}

impl Entity for AnalysisTemplate {
    const TYPE: &'static str = "template";
    type Id = Uuid;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
