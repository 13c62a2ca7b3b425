use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::{
    error::MonitorError,
    observer::{Observer, Silent},
    table::{Policy, Status, Table, Transition},
};

struct Inner {
    // await をまたいでロックを持たないので同期版の Mutex で足りる
    table: Mutex<Table>,
    can_eat: Box<[Notify]>,
    observer: Box<dyn Observer>,
}

/// tokio のタスク向けのモニタ
///
/// 規則は [`crate::monitor::Monitor`] と同じで、待ち方だけが違う
#[derive(Clone)]
pub struct AsyncMonitor {
    inner: Arc<Inner>,
}

impl AsyncMonitor {
    pub fn new(seats: usize, policy: Policy) -> Result<Self, MonitorError> {
        Self::with_observer(seats, policy, Silent)
    }

    pub fn with_observer(
        seats: usize,
        policy: Policy,
        observer: impl Observer + 'static,
    ) -> Result<Self, MonitorError> {
        let table = Table::new(seats, policy)?;
        let can_eat = (0..seats).map(|_| Notify::new()).collect();
        Ok(AsyncMonitor {
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

    pub fn statuses(&self) -> Vec<Status> {
        self.inner.table.lock().statuses().to_vec()
    }

    pub fn status(&self, i: usize) -> Result<Status, MonitorError> {
        let table = self.inner.table.lock();
        table.check(i)?;
        Ok(table.status(i))
    }

    /// 両方のフォークが手に入るまで待つ
    ///
    /// 待っている途中で future が捨てられた場合 (timeout など) は席を立った扱いにする
    pub async fn acquire(&self, i: usize) -> Result<(), MonitorError> {
        {
            let mut table = self.inner.table.lock();
            let t = table.sit_down(i)?;
            self.report(&table, &t);
            if let Some(t) = table.try_serve(i) {
                self.report(&table, &t);
                return Ok(());
            }
        }

        let mut seat = Seat {
            monitor: self,
            i,
            armed: true,
        };

        // ロックを放してから notified() するまでの間に起こされても、
        // notify_one は許可を1つ残すので取りこぼさない
        loop {
            self.inner.can_eat[i].notified().await;
            if self.inner.table.lock().status(i) == Status::Eating {
                seat.armed = false;
                return Ok(());
            }
        }
    }

    pub fn release(&self, i: usize) -> Result<(), MonitorError> {
        let mut table = self.inner.table.lock();
        let t = table.stand_up(i)?;
        self.report(&table, &t);
        self.serve_neighbors(&mut table, i);
        Ok(())
    }

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

// 待機中の acquire が捨てられたときの後片付け
// Hungry のままなら諦め、すでに Eating を渡されていたら返す
struct Seat<'a> {
    monitor: &'a AsyncMonitor,
    i: usize,
    armed: bool,
}

impl Drop for Seat<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut table = self.monitor.inner.table.lock();
        let t = match table.status(self.i) {
            Status::Hungry => table.give_up(self.i),
            Status::Eating => table.stand_up(self.i).ok(),
            Status::Thinking => None,
        };
        if let Some(t) = t {
            self.monitor.report(&table, &t);
        }
        self.monitor.serve_neighbors(&mut table, self.i);
    }
}
