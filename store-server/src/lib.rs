//! Bookstore backend server
//!
//! # 模块结构
//!
//! ```text
//! store-server/src/
//! ├── core/          # 配置、状态
//! ├── db/            # 存储层公共部分 (redb)
//! ├── accounts/      # 用户账户与余额
//! ├── catalog/       # 店铺、书目与库存
//! ├── orders/        # 订单生命周期引擎
//! └── utils/         # 工具函数
//! ```
//!
//! # Architecture
//!
//! The order lifecycle engine ([`OrderEngine`]) is the core of the backend.
//! It orchestrates two collaborators — [`AccountService`] (identity +
//! ledger) and [`CatalogService`] (stores + inventory) — plus its own order
//! stores and a keyed expiry scheduler:
//!
//! ```text
//! new_order ──► reserve stock (saga) ──► order + history (one txn) ──► arm timer
//! payment ────► debit ──► claim order (arbiter) ──► credit seller ──► history: paid
//! cancel ─────► claim order (arbiter) ──► history: cancelled ──► restore stock
//! ship/receive ► history status CAS
//! ```
//!
//! Every conditional update runs inside a single redb write transaction;
//! whichever of {payment, explicit cancel, expiry cancel} claims the order
//! record first wins, the losers observe a typed error.

pub mod accounts;
pub mod catalog;
pub mod core;
pub mod db;
pub mod orders;
pub mod utils;

// Re-export 公共类型
pub use crate::accounts::AccountService;
pub use crate::catalog::CatalogService;
pub use crate::core::{Config, ServerState};
pub use crate::orders::{OrderEngine, OrderStorage};

// Re-export unified error types from shared
pub use shared::error::{AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};
