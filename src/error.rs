use thiserror::Error;

use crate::table::Status;

/// モニタの呼び出し規約違反
///
/// どれも呼び出し側のバグで、返すときにテーブルの状態は一切変更していない
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MonitorError {
    #[error("a table needs at least one seat")]
    EmptyTable,

    #[error("philosopher {index} does not exist at a table of {seats}")]
    OutOfRange { index: usize, seats: usize },

    // acquire は Thinking の状態からしか呼べない
    #[error("philosopher {index} is already {status} and cannot acquire again")]
    AlreadySeated { index: usize, status: Status },

    // release は acquire に成功した後に1回だけ
    #[error("philosopher {index} is {status}, release requires a successful acquire")]
    NotEating { index: usize, status: Status },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("at least 2 philosophers are needed, got {0}")]
    TooFewPhilosophers(usize),

    #[error("invalid {phase} delay '{input}', expected MIN..MAX in milliseconds")]
    MalformedRange { phase: &'static str, input: String },

    #[error("{phase} delay {min}..{max} is empty")]
    EmptyRange {
        phase: &'static str,
        min: u64,
        max: u64,
    },
}

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Monitor(#[from] MonitorError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("philosopher {0} panicked")]
    Panicked(usize),

    #[error("philosopher task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0} mutual exclusion violations observed")]
    Unsafe(usize),
}
