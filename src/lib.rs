//! Peer Assess - 同伴互评分配与工作流引擎
//!
//! 基于 Actix Web 与 SeaORM 构建，负责互评提交的分配、评分聚合以及提交工作流的推进。
//!
//! # 架构
//! - `config`: 配置管理
//! - `entity`: SeaORM 数据库实体
//! - `errors`: 统一错误处理
//! - `models`: 数据模型定义
//! - `routes`: API 路由层
//! - `runtime`: 运行时生命周期管理
//! - `scoring`: 评分聚合（中位数）
//! - `services`: 业务逻辑层
//! - `storage`: 数据存储层（SeaORM）
//! - `utils`: 工具函数
//! - `validation`: 评分标准、步骤与日期配置校验

pub mod config;
pub mod entity;
pub mod errors;
pub mod models;
pub mod routes;
pub mod runtime;
pub mod scoring;
pub mod services;
pub mod storage;
pub mod utils;
pub mod validation;
