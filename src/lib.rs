//! 食事する哲学者の問題
//!
//! 円卓に座った N 人の哲学者が、隣人と共有するフォークを両方そろえて食事する。
//! 全員の状態を1つのモニタに集め、「空腹で、両隣が食事中でない」ときだけ食べさせることで
//! 隣同士の同時食事とデッドロックを防ぐ

pub mod async_monitor;
pub mod config;
pub mod error;
pub mod monitor;
pub mod observer;
pub mod philosopher;
pub mod ring;
pub mod table;

pub use async_monitor::AsyncMonitor;
pub use error::{ConfigError, MonitorError, SimError};
pub use monitor::Monitor;
pub use table::{Policy, Status};
