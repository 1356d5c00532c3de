//! 值对象（Value Object）
//!
//! 无标识、以值相等为准的对象，用于封装不可变的概念性值与校验逻辑。
//!

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// 值对象抽象
pub trait ValueObject {
    /// 业务校验失败时的错误类型
    type Error;

    /// 创建值对象时进行验证
    fn validate(&self) -> Result<(), Self::Error>;
}

/// SEC 公司标识（Central Index Key）
///
/// 统一规范化为 10 位、左侧补零的数字串。
///
/// # 示例
///
/// ```
/// use filings_domain::value_object::Cik;
///
/// let cik: Cik = "320193".parse().unwrap();
/// assert_eq!(cik.as_str(), "0000320193");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cik(String);

impl Cik {
    pub const LEN: usize = 10;

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for Cik {
    type Error = DomainError;

    fn validate(&self) -> Result<(), Self::Error> {
        if self.0.len() != Self::LEN || !self.0.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DomainError::invalid_value(format!(
                "cik must be {} digits, got '{}'",
                Self::LEN,
                self.0
            )));
        }
        Ok(())
    }
}

impl FromStr for Cik {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.len() > Self::LEN {
            return Err(DomainError::invalid_value(format!(
                "cik must be 1..={} digits, got '{s}'",
                Self::LEN
            )));
        }
        let cik = Cik(format!("{trimmed:0>width$}", width = Self::LEN));
        cik.validate()?;
        Ok(cik)
    }
}

impl TryFrom<String> for Cik {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Cik> for String {
    fn from(cik: Cik) -> Self {
        cik.0
    }
}

impl fmt::Display for Cik {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// EDGAR 受理号（Accession Number），形如 `0000320193-24-000123`
///
/// 同时接受不带连字符的 18 位数字形式，统一规范为带连字符的形式。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccessionNumber(String);

impl AccessionNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 受理号前 10 位为提交方（filer agent）的 CIK
    pub fn filer_id(&self) -> &str {
        &self.0[..10]
    }
}

impl ValueObject for AccessionNumber {
    type Error = DomainError;

    fn validate(&self) -> Result<(), Self::Error> {
        let parts: Vec<&str> = self.0.split('-').collect();
        let well_formed = matches!(parts.as_slice(), [a, b, c]
            if a.len() == 10 && b.len() == 2 && c.len() == 6
                && parts.iter().all(|p| p.bytes().all(|x| x.is_ascii_digit())));
        if !well_formed {
            return Err(DomainError::invalid_value(format!(
                "accession number must look like ##########-##-######, got '{}'",
                self.0
            )));
        }
        Ok(())
    }
}

impl FromStr for AccessionNumber {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let normalized = if s.len() == 18 && s.bytes().all(|b| b.is_ascii_digit()) {
            format!("{}-{}-{}", &s[..10], &s[10..12], &s[12..])
        } else {
            s.to_string()
        };
        let accession = AccessionNumber(normalized);
        accession.validate()?;
        Ok(accession)
    }
}

impl TryFrom<String> for AccessionNumber {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AccessionNumber> for String {
    fn from(accession: AccessionNumber) -> Self {
        accession.0
    }
}

impl fmt::Display for AccessionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
