//! SEC 申报分析领域层（filings-domain）
//!
//! 提供申报分析系统的领域模型与端口定义：
//! - 申报文件（`filing`）、分析模板（`template`）与分析任务（`analysis`）
//! - 值对象（`value_object`）：CIK、受理号等带校验的概念性值
//! - 仓储端口（`repository`）与外部服务端口（`domain_service`）
//! - 统一错误类型（`error`）
//!
//! 本 crate 与存储、传输实现解耦；`inmemory` 特性提供基于内存的仓储实现，
//! 便于测试与演示装配。
//!
pub mod analysis;
pub mod domain_service;
pub mod entity;
pub mod error;
pub mod filing;
#[cfg(feature = "inmemory")]
pub mod inmemory;
pub mod repository;
pub mod template;
pub mod value_object;
