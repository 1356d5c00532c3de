//! 依赖袋（Dependencies）与处理器工厂（FromDependencies）
//!
//! 依赖袋按插入顺序保存“名称 → 值”，值以类型擦除方式存放。处理器在首次分发时
//! 通过 [`FromDependencies`] 从依赖袋中解析构造参数，解析顺序固定为：
//! 1. 名称完全匹配且类型一致的条目；
//! 2. 否则按插入顺序取第一个类型一致的条目；
//! 3. 否则使用参数默认值（[`Dependencies::resolve_or`]），没有默认值则返回
//!    `AppError::DependencyResolution`。
//!
//! ```rust
//! use std::sync::Arc;
//! use filings_application::dependencies::Dependencies;
//!
//! let deps = Dependencies::new()
//!     .with("primary", Arc::new(String::from("db-a")))
//!     .with("replica", Arc::new(String::from("db-b")));
//!
//! // 名称匹配优先
//! let replica: Arc<String> = deps.resolve("replica").unwrap();
//! assert_eq!(replica.as_str(), "db-b");
//! // 名称未命中时取第一个类型匹配的条目
//! let any: Arc<String> = deps.resolve("store").unwrap();
//! assert_eq!(any.as_str(), "db-a");
//! ```
use std::any::{Any, type_name};
use std::fmt;

use tracing::trace;

use crate::error::AppError;

struct Entry {
    name: String,
    type_name: &'static str,
    value: Box<dyn Any + Send + Sync>,
}

#[derive(Default)]
pub struct Dependencies {
    entries: Vec<Entry>,
}

impl Dependencies {
    pub fn new() -> Self {
        Self::default()
    }

    /// 链式插入
    pub fn with<T>(mut self, name: impl Into<String>, value: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        self.insert(name, value);
        self
    }

    /// 插入依赖；同名条目原位替换，保持其插入顺序
    pub fn insert<T>(&mut self, name: impl Into<String>, value: T)
    where
        T: Clone + Send + Sync + 'static,
    {
        let name = name.into();
        let entry = Entry {
            name,
            type_name: type_name::<T>(),
            value: Box::new(value),
        };
        match self.entries.iter_mut().find(|e| e.name == entry.name) {
            Some(slot) => *slot = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 解析必填参数
    pub fn resolve<T>(&self, parameter: &str) -> Result<T, AppError>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.lookup(parameter)
            .ok_or_else(|| AppError::DependencyResolution {
                parameter: parameter.to_string(),
            })
    }

    /// 解析带默认值的参数
    pub fn resolve_or<T>(&self, parameter: &str, default: T) -> T
    where
        T: Clone + Send + Sync + 'static,
    {
        self.lookup(parameter).unwrap_or(default)
    }

    pub fn resolve_or_else<T, F>(&self, parameter: &str, default: F) -> T
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        self.lookup(parameter).unwrap_or_else(default)
    }

    fn lookup<T>(&self, parameter: &str) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let by_name = self
            .entries
            .iter()
            .filter(|e| e.name == parameter)
            .find_map(|e| e.value.downcast_ref::<T>());
        if let Some(value) = by_name {
            trace!(parameter, "dependency resolved by name");
            return Some(value.clone());
        }

        let by_type = self
            .entries
            .iter()
            .find_map(|e| e.value.downcast_ref::<T>().map(|v| (e.name.as_str(), v)));
        if let Some((name, value)) = by_type {
            trace!(parameter, matched = name, "dependency resolved by type");
            return Some(value.clone());
        }

        None
    }
}

impl fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|e| (&e.name, e.type_name)))
            .finish()
    }
}

/// 处理器工厂：由依赖袋构造处理器实例
///
/// 每个处理器类型显式声明其构造参数的解析方式，替代运行期的构造函数签名反射。
pub trait FromDependencies: Sized {
    fn from_dependencies(deps: &Dependencies) -> Result<Self, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    trait Store: Send + Sync + fmt::Debug {
        fn label(&self) -> &str;
    }

    #[derive(Debug)]
    struct Named(&'static str);

    impl Store for Named {
        fn label(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn name_match_beats_type_match() {
        let a: Arc<dyn Store> = Arc::new(Named("a"));
        let b: Arc<dyn Store> = Arc::new(Named("b"));
        let deps = Dependencies::new().with("first", a).with("store", b);

        let store: Arc<dyn Store> = deps.resolve("store").unwrap();
        assert_eq!(store.label(), "b");
    }

    #[test]
    fn first_type_match_in_insertion_order_wins() {
        let a: Arc<dyn Store> = Arc::new(Named("a"));
        let b: Arc<dyn Store> = Arc::new(Named("b"));
        let deps = Dependencies::new().with("zeta", a).with("alpha", b);

        let store: Arc<dyn Store> = deps.resolve("repository").unwrap();
        assert_eq!(store.label(), "a");
    }

    #[test]
    fn name_match_with_other_type_falls_back_to_type() {
        let s: Arc<dyn Store> = Arc::new(Named("typed"));
        let deps = Dependencies::new()
            .with("store", 42u32)
            .with("backing", s);

        let store: Arc<dyn Store> = deps.resolve("store").unwrap();
        assert_eq!(store.label(), "typed");
        assert_eq!(deps.resolve::<u32>("store").unwrap(), 42);
    }

    #[test]
    fn unresolved_parameter_is_named_in_error() {
        let deps = Dependencies::new().with("limit", 10usize);
        let err = deps.resolve::<Arc<dyn Store>>("store").unwrap_err();
        assert_eq!(
            err,
            AppError::DependencyResolution {
                parameter: "store".into()
            }
        );
    }

    #[test]
    fn defaults_apply_only_when_unresolved() {
        let deps = Dependencies::new().with("limit", 10usize);
        assert_eq!(deps.resolve_or("limit", 1usize), 10);
        assert_eq!(deps.resolve_or("retries", 3u8), 3);
        assert_eq!(deps.resolve_or_else("name", || "x".to_string()), "x");
    }

    #[test]
    fn reinsert_replaces_in_place() {
        let mut deps = Dependencies::new().with("a", 1u8).with("b", 2u8);
        deps.insert("a", 3u8);
        assert_eq!(deps.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(deps.resolve::<u8>("x").unwrap(), 3);
        assert_eq!(deps.len(), 2);
        assert!(deps.contains("b"));
        assert!(format!("{deps:?}").contains("u8"));
    }
}
