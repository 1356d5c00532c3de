//! SEC 申报分析应用层（filings-application）
//!
//! 以 CQRS 组织全部读写用例：
//! - 命令/查询契约（`command`、`query`），构造即校验；
//! - 处理器接口（`command_handler`、`query_handler`）与处理器工厂（`dependencies`）；
//! - 调度器（`dispatcher`）：路由、处理器实例缓存、结构化日志与错误透传；
//! - 应用服务门面（`service`）与处理器注册表（`registry`）；
//! - 具体业务处理器（`handlers`）；
//! - 配置（`config`）与日志初始化（`telemetry`）。
//!
pub mod command;
pub mod command_handler;
pub mod config;
pub mod dependencies;
pub mod dispatcher;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod query;
pub mod query_handler;
pub mod registry;
pub mod service;
pub mod telemetry;

pub use dispatcher::Dispatcher;
pub use service::ApplicationService;
