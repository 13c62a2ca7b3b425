use std::{
    ops::RangeInclusive,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, info};

use crate::{
    async_monitor::AsyncMonitor,
    config::{Runtime, SimConfig},
    error::{MonitorError, SimError},
    monitor::Monitor,
    observer::{Summary, Tally, Trace},
};

/// シミュレーション1回分の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    // 各哲学者が自分で数えた食事回数
    pub meals: Vec<u64>,
    // モニタ側で観測した集計
    pub summary: Summary,
}

// 考える時間と食べる時間を決める
struct Delays {
    rng: StdRng,
    think_ms: RangeInclusive<u64>,
    eat_ms: RangeInclusive<u64>,
}

impl Delays {
    fn new(config: &SimConfig, i: usize) -> Self {
        // seed があれば哲学者ごとにずらして再現可能にする
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(i as u64)),
            None => StdRng::from_entropy(),
        };
        Delays {
            rng,
            think_ms: config.think_ms.clone(),
            eat_ms: config.eat_ms.clone(),
        }
    }

    fn think(&mut self) -> Duration {
        Duration::from_millis(self.rng.gen_range(self.think_ms.clone()))
    }

    fn eat(&mut self) -> Duration {
        Duration::from_millis(self.rng.gen_range(self.eat_ms.clone()))
    }
}

fn keep_going(meals: u64, rounds: Option<u64>, stop: &AtomicBool) -> bool {
    !stop.load(Ordering::Relaxed) && rounds.map_or(true, |r| meals < r)
}

/// 設定に従って全員を食卓につかせ、終わるまで待つ
///
/// `stop` が立つと、各哲学者は今の食事を終えたところで席を立つ
pub fn run(config: &SimConfig, stop: Arc<AtomicBool>) -> Result<Report, SimError> {
    config.validate()?;
    let tally = Arc::new(Tally::new(config.philosophers));
    let observer = (tally.clone(), Trace);

    info!(
        philosophers = config.philosophers,
        rounds = ?config.rounds,
        policy = ?config.policy,
        runtime = ?config.runtime,
        "dinner starts"
    );

    let meals = match config.runtime {
        Runtime::Threads => {
            let monitor = Monitor::with_observer(config.philosophers, config.policy, observer)?;
            run_threads(&monitor, config, stop)?
        }
        Runtime::Tokio => {
            let monitor =
                AsyncMonitor::with_observer(config.philosophers, config.policy, observer)?;
            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            rt.block_on(run_tasks(&monitor, config, stop))?
        }
    };

    Ok(Report {
        meals,
        summary: tally.summary(),
    })
}

/// 1人1スレッドで走らせる
pub fn run_threads(
    monitor: &Monitor,
    config: &SimConfig,
    stop: Arc<AtomicBool>,
) -> Result<Vec<u64>, SimError> {
    let mut v = Vec::new();
    for i in 0..monitor.seats() {
        let monitor = monitor.clone();
        let stop = stop.clone();
        let mut delays = Delays::new(config, i);
        let rounds = config.rounds;
        let t = thread::spawn(move || dine(&monitor, i, &mut delays, rounds, &stop));
        v.push(t);
    }

    let mut meals = Vec::with_capacity(v.len());
    for (i, t) in v.into_iter().enumerate() {
        let n = t.join().map_err(|_| SimError::Panicked(i))??;
        meals.push(n);
    }
    Ok(meals)
}

fn dine(
    monitor: &Monitor,
    i: usize,
    delays: &mut Delays,
    rounds: Option<u64>,
    stop: &AtomicBool,
) -> Result<u64, MonitorError> {
    let mut meals = 0;
    while keep_going(meals, rounds, stop) {
        debug!(philosopher = i, round = meals, "thinking");
        thread::sleep(delays.think());

        monitor.acquire(i)?;
        debug!(philosopher = i, round = meals, "eating");
        thread::sleep(delays.eat());
        monitor.release(i)?;

        meals += 1;
    }
    debug!(philosopher = i, meals, "leaves the table");
    Ok(meals)
}

/// 1人1タスクで走らせる
pub async fn run_tasks(
    monitor: &AsyncMonitor,
    config: &SimConfig,
    stop: Arc<AtomicBool>,
) -> Result<Vec<u64>, SimError> {
    let tasks = (0..monitor.seats()).map(|i| {
        let monitor = monitor.clone();
        let stop = stop.clone();
        let mut delays = Delays::new(config, i);
        let rounds = config.rounds;
        tokio::spawn(async move {
            let mut meals = 0;
            while keep_going(meals, rounds, &stop) {
                debug!(philosopher = i, round = meals, "thinking");
                tokio::time::sleep(delays.think()).await;

                monitor.acquire(i).await?;
                debug!(philosopher = i, round = meals, "eating");
                tokio::time::sleep(delays.eat()).await;
                monitor.release(i)?;

                meals += 1;
            }
            debug!(philosopher = i, meals, "leaves the table");
            Ok::<_, MonitorError>(meals)
        })
    });

    let mut meals = Vec::new();
    for r in futures::future::join_all(tasks).await {
        meals.push(r??);
    }
    Ok(meals)
}
