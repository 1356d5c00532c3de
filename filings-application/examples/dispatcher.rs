use async_trait::async_trait;
use filings_application::command::{Command, CommandEnvelope, require_not_blank};
use filings_application::command_handler::CommandHandler;
use filings_application::dependencies::{Dependencies, FromDependencies};
use filings_application::dispatcher::Dispatcher;
use filings_application::dto::Dto;
use filings_application::error::AppError;
use filings_application::query::{Query, QueryEnvelope};
use filings_application::query_handler::QueryHandler;
use serde::Serialize;
use std::sync::{Arc, Mutex};

trait UserStore: Send + Sync {
    fn insert(&self, name: &str) -> u32;
    fn names(&self) -> Vec<String>;
}

#[derive(Default)]
struct MemoryStore {
    users: Mutex<Vec<String>>,
}

impl UserStore for MemoryStore {
    fn insert(&self, name: &str) -> u32 {
        let mut users = self.users.lock().unwrap();
        users.push(name.to_string());
        users.len() as u32
    }

    fn names(&self) -> Vec<String> {
        self.users.lock().unwrap().clone()
    }
}

#[derive(Debug)]
struct CreateUser {
    envelope: CommandEnvelope,
    name: String,
}

impl CreateUser {
    fn new(name: &str) -> Result<Self, AppError> {
        Self {
            envelope: CommandEnvelope::builder()
                .correlation_id("cor-1".into())
                .user_id("u-1".into())
                .build(),
            name: name.to_string(),
        }
        .validated()
    }
}

impl Command for CreateUser {
    const NAME: &'static str = "create_user";
    type Output = u32;

    fn envelope(&self) -> &CommandEnvelope {
        &self.envelope
    }

    fn validate(&self) -> Result<(), AppError> {
        require_not_blank("name", &self.name)
    }
}

struct CreateUserHandler {
    store: Arc<dyn UserStore>,
}

impl FromDependencies for CreateUserHandler {
    fn from_dependencies(deps: &Dependencies) -> Result<Self, AppError> {
        Ok(Self {
            store: deps.resolve("store")?,
        })
    }
}

#[async_trait]
impl CommandHandler for CreateUserHandler {
    type Command = CreateUser;

    async fn handle(&self, cmd: CreateUser) -> Result<u32, AppError> {
        println!("CreateUser: name={}", cmd.name);
        Ok(self.store.insert(&cmd.name))
    }
}

#[derive(Debug, Serialize)]
struct UserNames(Vec<String>);

impl Dto for UserNames {}

#[derive(Debug, Default)]
struct ListUsers {
    envelope: QueryEnvelope,
}

impl Query for ListUsers {
    const NAME: &'static str = "list_users";
    type Output = UserNames;

    fn envelope(&self) -> &QueryEnvelope {
        &self.envelope
    }
}

struct ListUsersHandler {
    store: Arc<dyn UserStore>,
}

impl FromDependencies for ListUsersHandler {
    fn from_dependencies(deps: &Dependencies) -> Result<Self, AppError> {
        Ok(Self {
            store: deps.resolve("store")?,
        })
    }
}

#[async_trait]
impl QueryHandler for ListUsersHandler {
    type Query = ListUsers;

    async fn handle(&self, _q: ListUsers) -> Result<UserNames, AppError> {
        Ok(UserNames(self.store.names()))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dispatcher = Dispatcher::new();
    dispatcher.register_command_handler::<CreateUserHandler>();
    dispatcher.register_query_handler::<ListUsersHandler>();

    let store: Arc<dyn UserStore> = Arc::new(MemoryStore::default());
    let deps = Dependencies::new().with("store", store);

    let n = dispatcher.dispatch_command(CreateUser::new("Alice")?, &deps).await?;
    println!("users after first insert: {n}");
    let n = dispatcher.dispatch_command(CreateUser::new("Bob")?, &deps).await?;
    println!("users after second insert: {n}");

    let names = dispatcher.dispatch_query(ListUsers::default(), &deps).await?;
    println!("ListUsers -> {}", serde_json::to_string(&names)?);

    // 空名称在构造时即被拒绝
    if let Err(e) = CreateUser::new("  ") {
        println!("rejected: {e}");
    }

    // 依赖袋缺少 store 时，首次构造处理器失败
    dispatcher.clear_cache();
    match dispatcher
        .dispatch_query(ListUsers::default(), &Dependencies::new())
        .await
    {
        Err(e) => println!("expected error: {e}"),
        Ok(_) => println!("unexpected success"),
    }

    Ok(())
}
