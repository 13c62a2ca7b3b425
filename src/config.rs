use std::ops::RangeInclusive;

use clap::{Parser, ValueEnum};

use crate::{error::ConfigError, table::Policy};

/// 哲学者をどう走らせるか
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Runtime {
    /// One OS thread per philosopher
    #[default]
    Threads,
    /// One tokio task per philosopher
    Tokio,
}

/// Dining philosophers around a single arbitration monitor
#[derive(Parser, Debug)]
#[command(name = "dining")]
#[command(about = "Dining philosophers around a single arbitration monitor")]
pub struct Args {
    /// Number of philosophers (and forks) at the table
    #[arg(short = 'n', long, default_value_t = 5)]
    pub philosophers: usize,

    /// Meals per philosopher; runs until interrupted when omitted
    #[arg(short, long)]
    pub rounds: Option<u64>,

    /// Thinking time bounds in milliseconds, MIN..MAX
    #[arg(long, value_name = "MIN..MAX", default_value = "10..50")]
    pub think_ms: String,

    /// Eating time bounds in milliseconds, MIN..MAX
    #[arg(long, value_name = "MIN..MAX", default_value = "10..50")]
    pub eat_ms: String,

    /// Admission policy for hungry philosophers
    #[arg(long, value_enum, default_value_t = Policy::Greedy)]
    pub policy: Policy,

    /// Run philosophers on OS threads or tokio tasks
    #[arg(long, value_enum, default_value_t = Runtime::Threads)]
    pub runtime: Runtime,

    /// Seed for the delay generator
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log every status transition
    #[arg(short, long)]
    pub verbose: bool,
}

// 検証済みの設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    pub philosophers: usize,
    pub rounds: Option<u64>,
    pub think_ms: RangeInclusive<u64>,
    pub eat_ms: RangeInclusive<u64>,
    pub policy: Policy,
    pub runtime: Runtime,
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            philosophers: 5,
            rounds: None,
            think_ms: 10..=50,
            eat_ms: 10..=50,
            policy: Policy::Greedy,
            runtime: Runtime::Threads,
            seed: None,
        }
    }
}

impl SimConfig {
    // フィールドは公開なので、走らせる前にもう一度確かめる
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.philosophers < 2 {
            return Err(ConfigError::TooFewPhilosophers(self.philosophers));
        }
        for (phase, range) in [("think", &self.think_ms), ("eat", &self.eat_ms)] {
            if range.is_empty() {
                return Err(ConfigError::EmptyRange {
                    phase,
                    min: *range.start(),
                    max: *range.end(),
                });
            }
        }
        Ok(())
    }
}

impl TryFrom<&Args> for SimConfig {
    type Error = ConfigError;

    fn try_from(args: &Args) -> Result<Self, Self::Error> {
        let config = SimConfig {
            philosophers: args.philosophers,
            rounds: args.rounds,
            think_ms: parse_range("think", &args.think_ms)?,
            eat_ms: parse_range("eat", &args.eat_ms)?,
            policy: args.policy,
            runtime: args.runtime,
            seed: args.seed,
        };
        config.validate()?;
        Ok(config)
    }
}

// "MIN..MAX" (両端を含む) か、単一の値
fn parse_range(phase: &'static str, input: &str) -> Result<RangeInclusive<u64>, ConfigError> {
    let malformed = || ConfigError::MalformedRange {
        phase,
        input: input.to_string(),
    };

    let (min, max) = match input.split_once("..") {
        Some((min, max)) => {
            let max = max.strip_prefix('=').unwrap_or(max);
            (min.trim(), max.trim())
        }
        None => (input.trim(), input.trim()),
    };
    let min: u64 = min.parse().map_err(|_| malformed())?;
    let max: u64 = max.parse().map_err(|_| malformed())?;

    if min > max {
        return Err(ConfigError::EmptyRange { phase, min, max });
    }
    Ok(min..=max)
}
