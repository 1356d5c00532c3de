use async_trait::async_trait;
use filings_application::command::{Command, CommandEnvelope, require_not_blank};
use filings_application::command_handler::CommandHandler;
use filings_application::dependencies::{Dependencies, FromDependencies};
use filings_application::dispatcher::Dispatcher;
use filings_application::dto::{Dto, PagedResult};
use filings_application::error::AppError;
use filings_application::query::{Pagination, Query, QueryEnvelope};
use filings_application::query_handler::QueryHandler;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ---- 测试用仓储 ----

trait WidgetRepository: Send + Sync {
    fn label(&self) -> &str;
    fn create(&self, name: &str) -> usize;
    fn names(&self) -> Vec<String>;
}

struct FakeRepo {
    label: &'static str,
    calls: AtomicUsize,
    names: Mutex<Vec<String>>,
}

impl FakeRepo {
    fn new(label: &'static str) -> Arc<Self> {
        Arc::new(Self {
            label,
            calls: AtomicUsize::new(0),
            names: Mutex::new(Vec::new()),
        })
    }
}

impl WidgetRepository for FakeRepo {
    fn label(&self) -> &str {
        self.label
    }

    fn create(&self, name: &str) -> usize {
        self.names.lock().unwrap().push(name.to_string());
        self.calls.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn names(&self) -> Vec<String> {
        self.names.lock().unwrap().clone()
    }
}

fn repo_dep(repo: &Arc<FakeRepo>) -> Arc<dyn WidgetRepository> {
    repo.clone()
}

// ---- CreateWidget ----

#[derive(Debug)]
struct CreateWidget {
    envelope: CommandEnvelope,
    name: String,
    quantity: i64,
}

impl CreateWidget {
    fn new(name: &str, quantity: i64) -> Result<Self, AppError> {
        Self {
            envelope: CommandEnvelope::builder()
                .correlation_id("cor-1".into())
                .user_id("u-1".into())
                .build(),
            name: name.to_string(),
            quantity,
        }
        .validated()
    }
}

impl Command for CreateWidget {
    const NAME: &'static str = "create_widget";
    type Output = usize;

    fn envelope(&self) -> &CommandEnvelope {
        &self.envelope
    }

    fn validate(&self) -> Result<(), AppError> {
        require_not_blank("name", &self.name)?;
        if self.quantity < 0 {
            return Err(AppError::validation("quantity must not be negative"));
        }
        Ok(())
    }
}

struct CreateWidgetHandler {
    repository: Arc<dyn WidgetRepository>,
    suffix: String,
}

impl FromDependencies for CreateWidgetHandler {
    fn from_dependencies(deps: &Dependencies) -> Result<Self, AppError> {
        Ok(Self {
            repository: deps.resolve("repository")?,
            suffix: deps.resolve_or("suffix", String::new()),
        })
    }
}

#[async_trait]
impl CommandHandler for CreateWidgetHandler {
    type Command = CreateWidget;

    async fn handle(&self, cmd: CreateWidget) -> Result<usize, AppError> {
        let name = format!("{}{}", cmd.name, self.suffix);
        Ok(self.repository.create(&name))
    }
}

// ---- 失败处理器 ----

#[derive(Debug)]
struct Explode {
    envelope: CommandEnvelope,
    error: AppError,
}

impl Command for Explode {
    const NAME: &'static str = "explode";
    type Output = ();

    fn envelope(&self) -> &CommandEnvelope {
        &self.envelope
    }

    fn validate(&self) -> Result<(), AppError> {
        Ok(())
    }
}

struct ExplodeHandler;

impl FromDependencies for ExplodeHandler {
    fn from_dependencies(_deps: &Dependencies) -> Result<Self, AppError> {
        Ok(ExplodeHandler)
    }
}

#[async_trait]
impl CommandHandler for ExplodeHandler {
    type Command = Explode;

    async fn handle(&self, cmd: Explode) -> Result<(), AppError> {
        Err(cmd.error)
    }
}

// ---- ListWidgets ----

#[derive(Debug, Serialize, PartialEq)]
struct WidgetDto {
    name: String,
}

impl Dto for WidgetDto {}

#[derive(Debug)]
struct ListWidgets {
    envelope: QueryEnvelope,
}

impl Query for ListWidgets {
    const NAME: &'static str = "list_widgets";
    type Output = PagedResult<WidgetDto>;

    fn envelope(&self) -> &QueryEnvelope {
        &self.envelope
    }
}

struct ListWidgetsHandler {
    repository: Arc<dyn WidgetRepository>,
}

impl FromDependencies for ListWidgetsHandler {
    fn from_dependencies(deps: &Dependencies) -> Result<Self, AppError> {
        Ok(Self {
            repository: deps.resolve("repository")?,
        })
    }
}

#[async_trait]
impl QueryHandler for ListWidgetsHandler {
    type Query = ListWidgets;

    async fn handle(&self, q: ListWidgets) -> Result<PagedResult<WidgetDto>, AppError> {
        let p = q.pagination();
        let (limit, offset) = p.limit_offset();
        let names = self.repository.names();
        let items = names
            .iter()
            .skip(offset)
            .take(limit)
            .map(|n| WidgetDto { name: n.clone() })
            .collect();
        Ok(PagedResult::new(items, names.len(), p))
    }
}

fn dispatcher() -> Dispatcher {
    let d = Dispatcher::new();
    d.register_command_handler::<CreateWidgetHandler>();
    d.register_command_handler::<ExplodeHandler>();
    d.register_query_handler::<ListWidgetsHandler>();
    d
}

#[tokio::test]
async fn dispatch_routes_to_handler_and_reuses_instance() {
    let d = dispatcher();
    let repo = FakeRepo::new("fake");
    let deps = Dependencies::new().with("repository", repo_dep(&repo));

    let n = d
        .dispatch_command(CreateWidget::new("x", 1).unwrap(), &deps)
        .await
        .unwrap();
    assert_eq!(n, 1);

    let first = d.cached_handler::<CreateWidgetHandler>().unwrap();
    assert_eq!(first.repository.label(), "fake");

    let n = d
        .dispatch_command(CreateWidget::new("y", 2).unwrap(), &deps)
        .await
        .unwrap();
    assert_eq!(n, 2);

    let second = d.cached_handler::<CreateWidgetHandler>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(repo.names(), vec!["x", "y"]);
}

#[tokio::test]
async fn unregistered_request_fails_without_building_handlers() {
    let d = Dispatcher::new();
    let repo = FakeRepo::new("fake");
    let deps = Dependencies::new().with("repository", repo_dep(&repo));

    let err = d
        .dispatch_command(CreateWidget::new("x", 1).unwrap(), &deps)
        .await
        .unwrap_err();
    assert_eq!(err, AppError::HandlerNotFound("create_widget"));

    let err = d
        .dispatch_query(
            ListWidgets {
                envelope: QueryEnvelope::default(),
            },
            &deps,
        )
        .await
        .unwrap_err();
    assert_eq!(err, AppError::HandlerNotFound("list_widgets"));

    assert!(d.cached_handler::<CreateWidgetHandler>().is_none());
    assert!(d.cached_handler::<ListWidgetsHandler>().is_none());
    assert!(repo.names().is_empty());
}

#[tokio::test]
async fn name_match_beats_type_match() {
    let d = dispatcher();
    let decoy = FakeRepo::new("decoy");
    let named = FakeRepo::new("named");
    let deps = Dependencies::new()
        .with("archive", repo_dep(&decoy))
        .with("repository", repo_dep(&named));

    d.dispatch_command(CreateWidget::new("x", 0).unwrap(), &deps)
        .await
        .unwrap();

    let handler = d.cached_handler::<CreateWidgetHandler>().unwrap();
    assert_eq!(handler.repository.label(), "named");
    assert!(decoy.names().is_empty());
}

#[tokio::test]
async fn type_match_is_used_when_name_is_absent() {
    let d = dispatcher();
    let first = FakeRepo::new("first");
    let second = FakeRepo::new("second");
    let deps = Dependencies::new()
        .with("store", repo_dep(&first))
        .with("backup", repo_dep(&second));

    d.dispatch_command(CreateWidget::new("x", 0).unwrap(), &deps)
        .await
        .unwrap();

    let handler = d.cached_handler::<CreateWidgetHandler>().unwrap();
    assert_eq!(handler.repository.label(), "first");
}

#[tokio::test]
async fn default_parameter_applies_when_unresolved() {
    let d = dispatcher();
    let repo = FakeRepo::new("fake");

    let deps = Dependencies::new().with("repository", repo_dep(&repo));
    d.dispatch_command(CreateWidget::new("plain", 0).unwrap(), &deps)
        .await
        .unwrap();
    d.clear_cache();

    let deps = deps.with("suffix", String::from("-v2"));
    d.dispatch_command(CreateWidget::new("tagged", 0).unwrap(), &deps)
        .await
        .unwrap();

    assert_eq!(repo.names(), vec!["plain", "tagged-v2"]);
}

#[tokio::test]
async fn unresolved_dependency_names_parameter_and_caches_nothing() {
    let d = dispatcher();

    let err = d
        .dispatch_command(CreateWidget::new("x", 1).unwrap(), &Dependencies::new())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        AppError::DependencyResolution {
            parameter: "repository".into()
        }
    );
    assert!(d.cached_handler::<CreateWidgetHandler>().is_none());

    // 依赖补齐后可以正常构造
    let repo = FakeRepo::new("late");
    let deps = Dependencies::new().with("repository", repo_dep(&repo));
    assert_eq!(
        d.dispatch_command(CreateWidget::new("x", 1).unwrap(), &deps)
            .await
            .unwrap(),
        1
    );
}

#[tokio::test]
async fn clear_cache_forces_reconstruction() {
    let d = dispatcher();
    let old = FakeRepo::new("old");
    let new = FakeRepo::new("new");

    d.dispatch_command(
        CreateWidget::new("a", 0).unwrap(),
        &Dependencies::new().with("repository", repo_dep(&old)),
    )
    .await
    .unwrap();
    let before = d.cached_handler::<CreateWidgetHandler>().unwrap();

    // 已缓存的实例不会因依赖袋变化而重建
    d.dispatch_command(
        CreateWidget::new("b", 0).unwrap(),
        &Dependencies::new().with("repository", repo_dep(&new)),
    )
    .await
    .unwrap();
    assert_eq!(old.names(), vec!["a", "b"]);

    d.clear_cache();
    assert!(d.cached_handler::<CreateWidgetHandler>().is_none());
    assert!(d.is_command_registered::<CreateWidget>());

    d.dispatch_command(
        CreateWidget::new("c", 0).unwrap(),
        &Dependencies::new().with("repository", repo_dep(&new)),
    )
    .await
    .unwrap();
    let after = d.cached_handler::<CreateWidgetHandler>().unwrap();
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(new.names(), vec!["c"]);
}

#[tokio::test]
async fn handler_errors_propagate_unchanged() {
    let d = dispatcher();
    let deps = Dependencies::new();

    for expected in [
        AppError::business_rule("filing already analyzed"),
        AppError::not_found("filing", "42"),
        AppError::External {
            service: "edgar",
            reason: "503 Service Unavailable".into(),
        },
    ] {
        let err = d
            .dispatch_command(
                Explode {
                    envelope: CommandEnvelope::default(),
                    error: expected.clone(),
                },
                &deps,
            )
            .await
            .unwrap_err();
        assert_eq!(err, expected);
        assert_eq!(err.to_string(), expected.to_string());
    }
}

#[test]
fn invalid_payload_fails_at_construction() {
    assert!(matches!(CreateWidget::new("", 1), Err(AppError::Validation(_))));
    assert!(matches!(CreateWidget::new("x", -1), Err(AppError::Validation(_))));

    let ok = CreateWidget::new("x", 3).unwrap();
    assert_eq!(ok.name, "x");
    assert_eq!(ok.quantity, 3);
    assert_eq!(ok.envelope().correlation_id(), Some("cor-1"));
}

#[tokio::test]
async fn query_uses_pagination_offset() {
    let d = dispatcher();
    let repo = FakeRepo::new("fake");
    for name in ["a", "b", "c", "d", "e"] {
        repo.create(name);
    }
    let deps = Dependencies::new().with("repository", repo_dep(&repo));

    let page = d
        .dispatch_query(
            ListWidgets {
                envelope: QueryEnvelope::builder()
                    .pagination(Pagination::new(2, 2).unwrap())
                    .build(),
            },
            &deps,
        )
        .await
        .unwrap();

    assert_eq!(page.total, 5);
    assert_eq!(page.total_pages, 3);
    assert_eq!(
        page.items,
        vec![
            WidgetDto { name: "c".into() },
            WidgetDto { name: "d".into() }
        ]
    );
}
