use std::sync::Arc;

use bon::Builder;
use filings_domain::domain_service::{EdgarService, FilingAnalyzer};
use filings_domain::repository::{AnalysisRepository, FilingRepository, TemplateRepository};

use crate::command::Command;
use crate::dependencies::Dependencies;
use crate::dispatcher::Dispatcher;
use crate::error::AppError;
use crate::handlers::analysis::AnalysisOptions;
use crate::handlers::keys;
use crate::query::Query;
use crate::registry;

/// 应用服务（门面）
///
/// 持有进程内共享的协作方引用，对展示层只暴露 `execute_command` / `execute_query`。
/// 每次调用按 [`keys`] 约定的名称组装依赖袋并交给调度器；不做任何错误转换。
///
/// ```rust,no_run
/// # use std::sync::Arc;
/// # use filings_application::service::ApplicationService;
/// # use filings_domain::inmemory::*;
/// # fn wire(edgar: Arc<dyn filings_domain::domain_service::EdgarService>,
/// #         analyzer: Arc<dyn filings_domain::domain_service::FilingAnalyzer>) {
/// let service = ApplicationService::builder()
///     .filing_repository(Arc::new(InMemoryFilingRepository::new()))
///     .template_repository(Arc::new(InMemoryTemplateRepository::new()))
///     .analysis_repository(Arc::new(InMemoryAnalysisRepository::new()))
///     .edgar_service(edgar)
///     .analyzer(analyzer)
///     .build();
/// # }
/// ```
#[derive(Builder, Clone)]
pub struct ApplicationService {
    #[builder(default = Arc::new(registry::build_dispatcher()))]
    dispatcher: Arc<Dispatcher>,
    filing_repository: Arc<dyn FilingRepository>,
    template_repository: Arc<dyn TemplateRepository>,
    analysis_repository: Arc<dyn AnalysisRepository>,
    edgar_service: Arc<dyn EdgarService>,
    analyzer: Arc<dyn FilingAnalyzer>,
    #[builder(default)]
    analysis_options: AnalysisOptions,
}

impl ApplicationService {
    pub async fn execute_command<C: Command>(&self, cmd: C) -> Result<C::Output, AppError> {
        let deps = self.dependencies();
        self.dispatcher.dispatch_command(cmd, &deps).await
    }

    pub async fn execute_query<Q: Query>(&self, q: Q) -> Result<Q::Output, AppError> {
        let deps = self.dependencies();
        self.dispatcher.dispatch_query(q, &deps).await
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    fn dependencies(&self) -> Dependencies {
        Dependencies::new()
            .with(keys::FILING_REPOSITORY, self.filing_repository.clone())
            .with(keys::TEMPLATE_REPOSITORY, self.template_repository.clone())
            .with(keys::ANALYSIS_REPOSITORY, self.analysis_repository.clone())
            .with(keys::EDGAR_SERVICE, self.edgar_service.clone())
            .with(keys::ANALYZER, self.analyzer.clone())
            .with(keys::ANALYSIS_OPTIONS, self.analysis_options)
    }
}
