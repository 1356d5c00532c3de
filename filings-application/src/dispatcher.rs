use crate::{
    command::Command, command_handler::CommandHandler, dependencies::Dependencies,
    dependencies::FromDependencies, error::AppError, query::Query, query_handler::QueryHandler,
};
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::any::{Any, TypeId, type_name};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

type BoxAnySend = Box<dyn Any + Send>;

type SharedHandler = Arc<dyn Any + Send + Sync>;

type HandlerFuture = Pin<Box<dyn Future<Output = Result<BoxAnySend, AppError>> + Send>>;

type InvokeFn = Arc<dyn Fn(SharedHandler, BoxAnySend) -> HandlerFuture + Send + Sync>;

type FactoryFn = fn(&Dependencies) -> Result<SharedHandler, AppError>;

/// 请求类型 → 处理器类型 的路由条目
#[derive(Clone)]
struct Route {
    request: &'static str,
    handler_id: TypeId,
    handler: &'static str,
    factory: FactoryFn,
    invoke: InvokeFn,
}

/// 命令/查询调度器
///
/// - 通过 TypeId 注册请求类型到处理器类型的路由，重复注册时后者覆盖前者；
/// - 处理器实例在首次分发时由依赖袋构造，按处理器类型缓存，同一调度器内只构造一次；
/// - 分发过程输出结构化日志，处理器返回的错误原样向上传递。
#[derive(Default)]
pub struct Dispatcher {
    commands: DashMap<TypeId, Route>,
    queries: DashMap<TypeId, Route>,
    instances: DashMap<TypeId, Arc<OnceCell<SharedHandler>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册命令处理器
    pub fn register_command_handler<H>(&self)
    where
        H: CommandHandler + FromDependencies,
    {
        let route = Route {
            request: <H::Command as Command>::NAME,
            handler_id: TypeId::of::<H>(),
            handler: type_name::<H>(),
            factory: build_handler::<H>,
            invoke: Arc::new(|shared: SharedHandler, boxed_cmd: BoxAnySend| -> HandlerFuture {
                Box::pin(async move {
                    let handler = downcast_handler::<H>(shared)?;
                    // 正常情况下这里的 downcast 永远不会失败（键与闭包同一泛型）
                    let cmd = boxed_cmd.downcast::<H::Command>().map_err(|_| {
                        AppError::TypeMismatch {
                            expected: <H::Command as Command>::NAME,
                            found: "unknown",
                        }
                    })?;
                    let out = handler.handle(*cmd).await?;
                    Ok::<_, AppError>(Box::new(out) as BoxAnySend)
                })
            }),
        };

        debug!(
            request_type = route.request,
            handler = route.handler,
            "command handler registered"
        );
        if let Some(previous) = self.commands.insert(TypeId::of::<H::Command>(), route) {
            warn!(
                request_type = previous.request,
                previous = previous.handler,
                handler = type_name::<H>(),
                "command handler replaced"
            );
        }
    }

    /// 注册查询处理器
    pub fn register_query_handler<H>(&self)
    where
        H: QueryHandler + FromDependencies,
    {
        let route = Route {
            request: <H::Query as Query>::NAME,
            handler_id: TypeId::of::<H>(),
            handler: type_name::<H>(),
            factory: build_handler::<H>,
            invoke: Arc::new(|shared: SharedHandler, boxed_q: BoxAnySend| -> HandlerFuture {
                Box::pin(async move {
                    let handler = downcast_handler::<H>(shared)?;
                    let q = boxed_q
                        .downcast::<H::Query>()
                        .map_err(|_| AppError::TypeMismatch {
                            expected: <H::Query as Query>::NAME,
                            found: "unknown",
                        })?;
                    let dto = handler.handle(*q).await?;
                    Ok::<_, AppError>(Box::new(dto) as BoxAnySend)
                })
            }),
        };

        debug!(
            request_type = route.request,
            handler = route.handler,
            "query handler registered"
        );
        if let Some(previous) = self.queries.insert(TypeId::of::<H::Query>(), route) {
            warn!(
                request_type = previous.request,
                previous = previous.handler,
                handler = type_name::<H>(),
                "query handler replaced"
            );
        }
    }

    /// 分发命令到对应处理器
    pub async fn dispatch_command<C: Command>(
        &self,
        cmd: C,
        deps: &Dependencies,
    ) -> Result<C::Output, AppError> {
        let Some(route) = self.commands.get(&TypeId::of::<C>()).map(|r| r.clone()) else {
            warn!(request_type = C::NAME, "no handler registered for command");
            return Err(AppError::HandlerNotFound(C::NAME));
        };

        let handler = self.resolve_handler(&route, deps)?;

        let envelope = cmd.envelope();
        let request_id = envelope.id();
        let user_id = envelope.user_id().map(str::to_owned);
        let correlation_id = envelope.correlation_id().map(str::to_owned);
        info!(
            %request_id,
            request_type = C::NAME,
            user_id = user_id.as_deref(),
            correlation_id = correlation_id.as_deref(),
            handler = route.handler,
            "dispatching command"
        );

        match (route.invoke)(handler, Box::new(cmd)).await {
            Ok(out) => {
                info!(%request_id, request_type = C::NAME, "command processed successfully");
                downcast_output::<C::Output>(out)
            }
            Err(err) => {
                error!(
                    %request_id,
                    request_type = C::NAME,
                    user_id = user_id.as_deref(),
                    correlation_id = correlation_id.as_deref(),
                    error = %err,
                    "command handler failed"
                );
                Err(err)
            }
        }
    }

    /// 分发查询到对应处理器，返回该查询的 DTO
    pub async fn dispatch_query<Q: Query>(
        &self,
        q: Q,
        deps: &Dependencies,
    ) -> Result<Q::Output, AppError> {
        let Some(route) = self.queries.get(&TypeId::of::<Q>()).map(|r| r.clone()) else {
            warn!(request_type = Q::NAME, "no handler registered for query");
            return Err(AppError::HandlerNotFound(Q::NAME));
        };

        let handler = self.resolve_handler(&route, deps)?;

        let envelope = q.envelope();
        let request_id = envelope.id();
        let user_id = envelope.user_id().map(str::to_owned);
        let pagination = envelope.pagination();
        debug!(
            %request_id,
            request_type = Q::NAME,
            user_id = user_id.as_deref(),
            page = pagination.page(),
            page_size = pagination.page_size(),
            handler = route.handler,
            "dispatching query"
        );

        match (route.invoke)(handler, Box::new(q)).await {
            Ok(out) => {
                debug!(%request_id, request_type = Q::NAME, "query processed successfully");
                downcast_output::<Q::Output>(out)
            }
            Err(err) => {
                error!(
                    %request_id,
                    request_type = Q::NAME,
                    user_id = user_id.as_deref(),
                    page = pagination.page(),
                    page_size = pagination.page_size(),
                    error = %err,
                    "query handler failed"
                );
                Err(err)
            }
        }
    }

    /// 清空处理器实例缓存（路由不受影响）
    pub fn clear_cache(&self) {
        self.instances.clear();
        debug!("handler instance cache cleared");
    }

    /// 获取已缓存的处理器实例
    pub fn cached_handler<H>(&self) -> Option<Arc<H>>
    where
        H: Send + Sync + 'static,
    {
        let cell = self.instances.get(&TypeId::of::<H>())?.value().clone();
        cell.get().cloned()?.downcast::<H>().ok()
    }

    pub fn is_command_registered<C: Command>(&self) -> bool {
        self.commands.contains_key(&TypeId::of::<C>())
    }

    pub fn is_query_registered<Q: Query>(&self) -> bool {
        self.queries.contains_key(&TypeId::of::<Q>())
    }

    /// 获取已注册的命令类型名列表（只读视图）
    pub fn registered_commands(&self) -> Vec<&'static str> {
        self.commands.iter().map(|e| e.value().request).collect()
    }

    /// 获取已注册的查询类型名列表（只读视图）
    pub fn registered_queries(&self) -> Vec<&'static str> {
        self.queries.iter().map(|e| e.value().request).collect()
    }

    /// 解析或构造处理器实例
    ///
    /// 每个处理器类型对应一个 `OnceCell`，并发的首次分发只会构造一次；
    /// 构造失败时单元保持为空，后续分发会重新尝试。
    fn resolve_handler(
        &self,
        route: &Route,
        deps: &Dependencies,
    ) -> Result<SharedHandler, AppError> {
        let cell = self.instances.entry(route.handler_id).or_default().value().clone();

        cell.get_or_try_init(|| {
            debug!(handler = route.handler, dependencies = ?deps, "constructing handler");
            (route.factory)(deps).inspect_err(|err| {
                error!(
                    handler = route.handler,
                    request_type = route.request,
                    error = %err,
                    "handler construction failed"
                );
            })
        })
        .cloned()
    }
}

fn build_handler<H>(deps: &Dependencies) -> Result<SharedHandler, AppError>
where
    H: FromDependencies + Send + Sync + 'static,
{
    Ok(Arc::new(H::from_dependencies(deps)?))
}

fn downcast_handler<H>(shared: SharedHandler) -> Result<Arc<H>, AppError>
where
    H: Send + Sync + 'static,
{
    shared.downcast::<H>().map_err(|_| AppError::TypeMismatch {
        expected: type_name::<H>(),
        found: "unknown",
    })
}

fn downcast_output<R: 'static>(out: BoxAnySend) -> Result<R, AppError> {
    match out.downcast::<R>() {
        Ok(r) => Ok(*r),
        Err(_) => Err(AppError::TypeMismatch {
            expected: type_name::<R>(),
            found: "unknown",
        }),
    }
}
