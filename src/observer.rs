use parking_lot::Mutex;
use tracing::{trace, warn};

use crate::table::{self, Status, Transition};

/// 状態遷移の通知先
///
/// モニタのロックを持ったまま呼ばれるので、通知の順番は遷移の順番と一致する。
/// 重い処理やモニタの再呼び出しはしないこと
pub trait Observer: Send + Sync {
    fn transition(&self, change: &Transition, table: &[Status]);
}

// 何もしない
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Observer for Silent {
    fn transition(&self, _change: &Transition, _table: &[Status]) {}
}

// tracing に流す
#[derive(Debug, Default, Clone, Copy)]
pub struct Trace;

impl Observer for Trace {
    fn transition(&self, change: &Transition, _table: &[Status]) {
        trace!(
            philosopher = change.philosopher,
            from = %change.from,
            to = %change.to,
            "status changed"
        );
    }
}

// 2つの通知先に順に流す
impl<A: Observer, B: Observer> Observer for (A, B) {
    fn transition(&self, change: &Transition, table: &[Status]) {
        self.0.transition(change, table);
        self.1.transition(change, table);
    }
}

impl<O: Observer + ?Sized> Observer for std::sync::Arc<O> {
    fn transition(&self, change: &Transition, table: &[Status]) {
        (**self).transition(change, table);
    }
}

/// 集計結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    // 哲学者ごとの食事回数
    pub meals: Vec<u64>,
    // 同時に食事していた人数の最大値
    pub peak_eaters: usize,
    // 隣同士が同時に食事していた、またはフォークが2人に使われていた回数
    pub violations: usize,
    pub transitions: u64,
}

/// 遷移のたびに表全体を検査して集計する
#[derive(Debug)]
pub struct Tally {
    inner: Mutex<Summary>,
}

impl Tally {
    pub fn new(seats: usize) -> Self {
        Tally {
            inner: Mutex::new(Summary {
                meals: vec![0; seats],
                ..Summary::default()
            }),
        }
    }

    pub fn summary(&self) -> Summary {
        self.inner.lock().clone()
    }
}

impl Observer for Tally {
    fn transition(&self, change: &Transition, table: &[Status]) {
        let mut s = self.inner.lock();
        s.transitions += 1;
        if change.to == Status::Eating {
            s.meals[change.philosopher] += 1;
        }

        let eaters = table.iter().filter(|st| **st == Status::Eating).count();
        s.peak_eaters = s.peak_eaters.max(eaters);

        if !table::is_safe(table) || table::contested_forks(table) > 0 {
            s.violations += 1;
            warn!(?table, philosopher = change.philosopher, "neighbors eating together");
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use Status::*;

    fn change(philosopher: usize, from: Status, to: Status) -> Transition {
        Transition {
            philosopher,
            from,
            to,
        }
    }

    #[test]
    fn test_tally_counts_meals_and_peak() {
        let tally = Tally::new(5);
        tally.transition(
            &change(0, Hungry, Eating),
            &[Eating, Thinking, Thinking, Thinking, Thinking],
        );
        tally.transition(
            &change(2, Hungry, Eating),
            &[Eating, Thinking, Eating, Thinking, Thinking],
        );
        tally.transition(
            &change(0, Eating, Thinking),
            &[Thinking, Thinking, Eating, Thinking, Thinking],
        );

        let s = tally.summary();
        assert_eq!(s.meals, vec![1, 0, 1, 0, 0]);
        assert_eq!(s.peak_eaters, 2);
        assert_eq!(s.violations, 0);
        assert_eq!(s.transitions, 3);
    }

    #[test]
    fn test_tally_flags_neighbors() {
        let tally = Tally::new(3);
        tally.transition(&change(1, Hungry, Eating), &[Eating, Eating, Thinking]);
        assert_eq!(tally.summary().violations, 1);
    }

    #[test]
    fn test_pair_forwards_to_both() {
        let a = std::sync::Arc::new(Tally::new(2));
        let b = std::sync::Arc::new(Tally::new(2));
        let pair = (a.clone(), b.clone());
        pair.transition(&change(1, Hungry, Eating), &[Thinking, Eating]);
        assert_eq!(a.summary().meals, vec![0, 1]);
        assert_eq!(b.summary().meals, vec![0, 1]);
    }
}
