//! 处理器注册表
//!
//! 纯装配：枚举全部具体处理器并注册到调度器，先命令后查询。
//!
use crate::dispatcher::Dispatcher;
use crate::handlers::analysis::{GetAnalysisHandler, RunAnalysisHandler};
use crate::handlers::filing::{GetFilingHandler, ImportFilingHandler, ListCompanyFilingsHandler};
use crate::handlers::template::{CreateTemplateHandler, DeleteTemplateHandler, ListTemplatesHandler};

/// 将全部处理器注册到给定调度器
pub fn register_all(dispatcher: &Dispatcher) {
    // commands
    dispatcher.register_command_handler::<ImportFilingHandler>();
    dispatcher.register_command_handler::<CreateTemplateHandler>();
    dispatcher.register_command_handler::<DeleteTemplateHandler>();
    dispatcher.register_command_handler::<RunAnalysisHandler>();

    // queries
    dispatcher.register_query_handler::<GetFilingHandler>();
    dispatcher.register_query_handler::<ListCompanyFilingsHandler>();
    dispatcher.register_query_handler::<ListTemplatesHandler>();
    dispatcher.register_query_handler::<GetAnalysisHandler>();
}

/// 创建已完成注册的调度器
pub fn build_dispatcher() -> Dispatcher {
    let dispatcher = Dispatcher::new();
    register_all(&dispatcher);
    dispatcher
}
