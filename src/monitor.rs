use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::{
    error::MonitorError,
    observer::{Observer, Silent},
    table::{Policy, Status, Table, Transition},
};

struct Inner {
    table: Mutex<Table>,
    // 哲学者ごとの条件変数
    // j の条件変数を起こしても j 以外は起きない
    can_eat: Box<[Condvar]>,
    observer: Box<dyn Observer>,
}

/// フォークの取得と返却を仲介するモニタ
///
/// 全員の状態を1つのロックで守り、両方のフォークを同時に渡すか何も渡さないかのどちらかにする。
/// 片方だけ持って待つことがないので、循環待ちによるデッドロックは起きない
#[derive(Clone)]
pub struct Monitor {
    inner: Arc<Inner>,
}

impl Monitor {
    pub fn new(seats: usize, policy: Policy) -> Result<Self, MonitorError> {
        Self::with_observer(seats, policy, Silent)
    }

    pub fn with_observer(
        seats: usize,
        policy: Policy,
        observer: impl Observer + 'static,
    ) -> Result<Self, MonitorError> {
        let table = Table::new(seats, policy)?;
        let can_eat = (0..seats).map(|_| Condvar::new()).collect();
        Ok(Monitor {
            inner: Arc::new(Inner {
                table: Mutex::new(table),
                can_eat,
                observer: Box::new(observer),
            }),
        })
    }

    pub fn seats(&self) -> usize {
        self.inner.can_eat.len()
    }

    // ロックを取った時点の全員の状態のコピー
    pub fn statuses(&self) -> Vec<Status> {
        self.inner.table.lock().statuses().to_vec()
    }

    pub fn status(&self, i: usize) -> Result<Status, MonitorError> {
        let table = self.inner.table.lock();
        table.check(i)?;
        Ok(table.status(i))
    }

    /// 両方のフォークが手に入るまでブロックする
    pub fn acquire(&self, i: usize) -> Result<(), MonitorError> {
        let mut table = self.seat(i)?;
        // 条件変数は偽の起床があり得るので、毎回自分の状態を見直す
        while table.status(i) != Status::Eating {
            self.inner.can_eat[i].wait(&mut table);
        }
        Ok(())
    }

    /// acquire と同じだが、timeout までに食べられなければ諦めて Thinking に戻り false を返す
    pub fn try_acquire_for(&self, i: usize, timeout: Duration) -> Result<bool, MonitorError> {
        let deadline = Instant::now() + timeout;
        let mut table = self.seat(i)?;
        while table.status(i) != Status::Eating {
            let res = self.inner.can_eat[i].wait_until(&mut table, deadline);
            if res.timed_out() && table.status(i) != Status::Eating {
                if let Some(t) = table.give_up(i) {
                    self.report(&table, &t);
                }
                // Fair では空腹の自分が隣を止めていた可能性がある
                self.serve_neighbors(&mut table, i);
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// フォークを返し、食べられるようになった隣人を起こす
    pub fn release(&self, i: usize) -> Result<(), MonitorError> {
        let mut table = self.inner.table.lock();
        let t = table.stand_up(i)?;
        self.report(&table, &t);
        self.serve_neighbors(&mut table, i);
        Ok(())
    }

    // Hungry にして、すぐ食べられるならそのまま Eating にする
    fn seat(&self, i: usize) -> Result<MutexGuard<'_, Table>, MonitorError> {
        let mut table = self.inner.table.lock();
        let t = table.sit_down(i)?;
        self.report(&table, &t);
        if let Some(t) = table.try_serve(i) {
            self.report(&table, &t);
        }
        Ok(table)
    }

    // i の状態が変わったので、影響を受ける両隣だけ見直す
    fn serve_neighbors(&self, table: &mut Table, i: usize) {
        for j in table.neighbors(i) {
            if let Some(t) = table.try_serve(j) {
                self.report(table, &t);
                self.inner.can_eat[j].notify_one();
            }
        }
    }

    fn report(&self, table: &Table, t: &Transition) {
        self.inner.observer.transition(t, table.statuses());
    }
}
