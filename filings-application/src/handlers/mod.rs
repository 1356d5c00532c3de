//! 具体业务处理器
//!
//! 每个子模块包含一组相关的命令/查询、其处理器与输出 DTO。
//! 处理器通过 [`keys`] 中约定的名称从依赖袋解析协作方。
//!
pub mod analysis;
pub mod filing;
pub mod template;

/// 依赖袋中协作方的约定名称
pub mod keys {
    pub const FILING_REPOSITORY: &str = "filing_repository";
    pub const TEMPLATE_REPOSITORY: &str = "template_repository";
    pub const ANALYSIS_REPOSITORY: &str = "analysis_repository";
    pub const EDGAR_SERVICE: &str = "edgar_service";
    pub const ANALYZER: &str = "analyzer";
    pub const ANALYSIS_OPTIONS: &str = "analysis_options";
}
