//! 申报文件（Filing）
//!
//! 从 EDGAR 导入的一份申报文件的元数据，以及其中可供分析的章节键。
//!
use std::fmt;
use std::str::FromStr;

use bon::Builder;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::Entity;
use crate::error::DomainError;
use crate::value_object::{AccessionNumber, Cik};

/// 申报表单类型
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FormType {
    /// 年报
    TenK,
    /// 季报
    TenQ,
    /// 重大事项报告
    EightK,
    /// 外国发行人年报
    TwentyF,
    Other(String),
}

impl FormType {
    pub fn as_str(&self) -> &str {
        match self {
            FormType::TenK => "10-K",
            FormType::TenQ => "10-Q",
            FormType::EightK => "8-K",
            FormType::TwentyF => "20-F",
            FormType::Other(s) => s,
        }
    }
}

impl FromStr for FormType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DomainError::invalid_value("form type must not be empty"));
        }
        Ok(match s.to_ascii_uppercase().as_str() {
            "10-K" => FormType::TenK,
            "10-Q" => FormType::TenQ,
            "8-K" => FormType::EightK,
            "20-F" => FormType::TwentyF,
            other => FormType::Other(other.to_string()),
        })
    }
}

impl TryFrom<String> for FormType {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FormType> for String {
    fn from(form: FormType) -> Self {
        form.as_str().to_string()
    }
}

impl fmt::Display for FormType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 已导入的申报文件
#[derive(Builder, Debug, Clone, Serialize, Deserialize)]
pub struct Filing {
    #[builder(default = Uuid::new_v4())]
    id: Uuid,
    cik: Cik,
    #[builder(into)]
    company_name: String,
    form_type: FormType,
    accession_number: AccessionNumber,
    filed_on: NaiveDate,
    /// 可供分析的章节键（如 `item_1a`、`item_7`）
    #[builder(default)]
    sections: Vec<String>,
    #[builder(default = Utc::now())]
    imported_at: DateTime<Utc>,
}

impl Filing {
    pub fn cik(&self) -> &Cik {
        &self.cik
    }

    pub fn company_name(&self) -> &str {
        &self.company_name
    }

    pub fn form_type(&self) -> &FormType {
        &self.form_type
    }

    pub fn accession_number(&self) -> &AccessionNumber {
        &self.accession_number
    }

    pub fn filed_on(&self) -> NaiveDate {
        self.filed_on
    }

    pub fn sections(&self) -> &[String] {
        &self.sections
    }

    pub fn has_section(&self, key: &str) -> bool {
        self.sections.iter().any(|s| s == key)
    }

    pub fn imported_at(&self) -> &DateTime<Utc> {
        &self.imported_at
    }
}

impl Entity for Filing {
    const TYPE: &'static str = "filing";
    type Id = Uuid;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_type_parses_known_and_other() {
        assert_eq!("10-k".parse::<FormType>().unwrap(), FormType::TenK);
        assert_eq!("8-K".parse::<FormType>().unwrap(), FormType::EightK);
        assert_eq!(
            "S-1".parse::<FormType>().unwrap(),
            FormType::Other("S-1".into())
        );
        assert!("  ".parse::<FormType>().is_err());
    }

    #[test]
    fn builder_fills_defaults() {
        let filing = Filing::builder()
            .cik("320193".parse().unwrap())
            .company_name("Apple Inc.")
            .form_type(FormType::TenK)
            .accession_number("0000320193-24-000123".parse().unwrap())
            .filed_on(NaiveDate::from_ymd_opt(2024, 11, 1).unwrap())
            .sections(vec!["item_1a".into()])
            .build();

        assert!(filing.has_section("item_1a"));
        assert!(!filing.has_section("item_7"));
        assert_eq!(filing.form_type().to_string(), "10-K");
        assert!(!filing.id().is_nil());
    }
}
