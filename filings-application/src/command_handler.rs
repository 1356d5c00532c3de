use crate::{command::Command, error::AppError};
use async_trait::async_trait;

/// 命令处理器
///
/// 通过关联类型 `Command` 声明其负责的唯一命令类型，调度器据此建立路由；
/// 缺少关联类型或 `handle` 的实现无法通过编译。
#[async_trait]
pub trait CommandHandler: Send + Sync + 'static {
    type Command: Command;

    async fn handle(
        &self,
        cmd: Self::Command,
    ) -> Result<<Self::Command as Command>::Output, AppError>;
}
