use std::fmt;

use crate::{error::MonitorError, ring};

// 哲学者の状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Thinking,
    Hungry,
    Eating,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Thinking => "thinking",
            Status::Hungry => "hungry",
            Status::Eating => "eating",
        };
        f.write_str(s)
    }
}

/// 空腹の哲学者をいつ食べさせるかの方針
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Policy {
    /// Eat as soon as neither neighbor is eating
    #[default]
    Greedy,
    /// Also yield to a neighbor that has been hungry longer
    Fair,
}

// 状態遷移1回分
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub philosopher: usize,
    pub from: Status,
    pub to: Status,
}

/// 全員の状態と遷移規則
///
/// ロックは持たないので、モニタがロックの内側でだけ操作する
#[derive(Debug)]
pub struct Table {
    status: Vec<Status>,
    // 空腹になった順番 (Fair のときだけ見る)
    tickets: Vec<u64>,
    next_ticket: u64,
    policy: Policy,
}

impl Table {
    pub fn new(seats: usize, policy: Policy) -> Result<Self, MonitorError> {
        if seats == 0 {
            return Err(MonitorError::EmptyTable);
        }
        Ok(Table {
            status: vec![Status::Thinking; seats],
            tickets: vec![0; seats],
            next_ticket: 0,
            policy,
        })
    }

    pub fn seats(&self) -> usize {
        self.status.len()
    }

    pub fn status(&self, i: usize) -> Status {
        self.status[i]
    }

    pub fn statuses(&self) -> &[Status] {
        &self.status
    }

    pub fn check(&self, i: usize) -> Result<(), MonitorError> {
        if i < self.seats() {
            Ok(())
        } else {
            Err(MonitorError::OutOfRange {
                index: i,
                seats: self.seats(),
            })
        }
    }

    // 左右の隣人
    pub fn neighbors(&self, i: usize) -> [usize; 2] {
        let n = self.seats();
        [ring::left(i, n), ring::right(i, n)]
    }

    // 哲学者 i が今すぐ食べ始めてよいか
    // 空腹で、両隣のどちらも食事中でないこと
    pub fn can_eat(&self, i: usize) -> bool {
        if self.status[i] != Status::Hungry {
            return false;
        }
        let neighbors = self.neighbors(i);
        if neighbors.iter().any(|&j| self.status[j] == Status::Eating) {
            return false;
        }
        match self.policy {
            Policy::Greedy => true,
            // 自分より前から待っている隣人がいたら譲る
            Policy::Fair => neighbors.iter().all(|&j| {
                j == i || self.status[j] != Status::Hungry || self.tickets[j] > self.tickets[i]
            }),
        }
    }

    // Thinking -> Hungry
    pub fn sit_down(&mut self, i: usize) -> Result<Transition, MonitorError> {
        self.check(i)?;
        if self.status[i] != Status::Thinking {
            return Err(MonitorError::AlreadySeated {
                index: i,
                status: self.status[i],
            });
        }
        self.tickets[i] = self.next_ticket;
        self.next_ticket += 1;
        Ok(self.set(i, Status::Hungry))
    }

    // Hungry -> Eating (can_eat が成り立つときだけ)
    pub fn try_serve(&mut self, i: usize) -> Option<Transition> {
        if self.can_eat(i) {
            Some(self.set(i, Status::Eating))
        } else {
            None
        }
    }

    // Eating -> Thinking
    pub fn stand_up(&mut self, i: usize) -> Result<Transition, MonitorError> {
        self.check(i)?;
        if self.status[i] != Status::Eating {
            return Err(MonitorError::NotEating {
                index: i,
                status: self.status[i],
            });
        }
        Ok(self.set(i, Status::Thinking))
    }

    // Hungry -> Thinking
    // 時間切れで待つのを諦めたときだけ使う
    pub fn give_up(&mut self, i: usize) -> Option<Transition> {
        if self.status[i] == Status::Hungry {
            Some(self.set(i, Status::Thinking))
        } else {
            None
        }
    }

    fn set(&mut self, i: usize, to: Status) -> Transition {
        let from = self.status[i];
        self.status[i] = to;
        debug_assert!(is_safe(&self.status), "unsafe table: {:?}", self.status);
        Transition {
            philosopher: i,
            from,
            to,
        }
    }
}

// 隣り合う2人が同時に食事していないか
pub fn is_safe(status: &[Status]) -> bool {
    let n = status.len();
    (0..n).all(|i| {
        let j = ring::right(i, n);
        i == j || !(status[i] == Status::Eating && status[j] == Status::Eating)
    })
}

// 2人に同時に使われているフォークの数
pub fn contested_forks(status: &[Status]) -> usize {
    let n = status.len();
    let mut holders = vec![0usize; n];
    for i in (0..n).filter(|&i| status[i] == Status::Eating) {
        let (r, l) = (ring::right_fork(i), ring::left_fork(i, n));
        holders[r] += 1;
        // 1人の席では左右が同じフォーク
        if l != r {
            holders[l] += 1;
        }
    }
    holders.iter().filter(|&&c| c > 1).count()
}

#[cfg(test)]
mod test {
    use super::*;

    fn table(seats: usize, policy: Policy) -> Table {
        Table::new(seats, policy).unwrap()
    }

    #[test]
    fn test_empty_table() {
        assert_eq!(
            Table::new(0, Policy::Greedy).unwrap_err(),
            MonitorError::EmptyTable
        );
    }

    #[test]
    fn test_starts_thinking() {
        let t = table(5, Policy::Greedy);
        assert!(t.statuses().iter().all(|s| *s == Status::Thinking));
    }

    #[test]
    fn test_can_eat() {
        let mut t = table(5, Policy::Greedy);
        // 空腹でなければ食べられない
        assert!(!t.can_eat(2));

        t.sit_down(2).unwrap();
        assert!(t.can_eat(2));
        t.try_serve(2).unwrap();

        // 2 が食事中なので 1 と 3 は食べられない
        t.sit_down(1).unwrap();
        t.sit_down(3).unwrap();
        assert!(!t.can_eat(1));
        assert!(!t.can_eat(3));
        assert_eq!(t.try_serve(1), None);

        // 4 の隣は 3 (空腹) と 0 (考え中) なので食べられる
        t.sit_down(4).unwrap();
        assert!(t.can_eat(4));
    }

    #[test]
    fn test_transitions() {
        let mut t = table(3, Policy::Greedy);
        let a = t.sit_down(0).unwrap();
        assert_eq!((a.from, a.to), (Status::Thinking, Status::Hungry));
        let b = t.try_serve(0).unwrap();
        assert_eq!((b.from, b.to), (Status::Hungry, Status::Eating));
        let c = t.stand_up(0).unwrap();
        assert_eq!((c.from, c.to), (Status::Eating, Status::Thinking));
        assert_eq!(c.philosopher, 0);
    }

    #[test]
    fn test_contract_violations() {
        let mut t = table(3, Policy::Greedy);
        assert_eq!(
            t.stand_up(1).unwrap_err(),
            MonitorError::NotEating {
                index: 1,
                status: Status::Thinking
            }
        );
        t.sit_down(1).unwrap();
        assert_eq!(
            t.sit_down(1).unwrap_err(),
            MonitorError::AlreadySeated {
                index: 1,
                status: Status::Hungry
            }
        );
        assert_eq!(
            t.sit_down(3).unwrap_err(),
            MonitorError::OutOfRange { index: 3, seats: 3 }
        );
        // 失敗しても状態は変わらない
        assert_eq!(
            t.statuses(),
            &[Status::Thinking, Status::Hungry, Status::Thinking]
        );
    }

    #[test]
    fn test_single_seat() {
        // 1人なら自分自身が隣人になるが、それでも食べられる
        let mut t = table(1, Policy::Fair);
        t.sit_down(0).unwrap();
        assert!(t.try_serve(0).is_some());
        assert!(is_safe(t.statuses()));
        assert_eq!(contested_forks(t.statuses()), 0);
    }

    #[test]
    fn test_fair_waits_for_older_neighbor() {
        let mut t = table(5, Policy::Fair);
        // 0 が食事中、1 が先に空腹になる
        t.sit_down(0).unwrap();
        t.try_serve(0).unwrap();
        t.sit_down(1).unwrap();
        assert!(!t.can_eat(1));

        // 2 は両隣が食事中でないが、1 のほうが先に待っている
        t.sit_down(2).unwrap();
        assert!(!t.can_eat(2));

        // Greedy なら 2 はすぐ食べられる
        let mut g = table(5, Policy::Greedy);
        g.sit_down(0).unwrap();
        g.try_serve(0).unwrap();
        g.sit_down(1).unwrap();
        g.sit_down(2).unwrap();
        assert!(g.can_eat(2));

        // 0 が食べ終わると古い順に 1 が食べられる
        t.stand_up(0).unwrap();
        assert!(t.can_eat(1));
        t.try_serve(1).unwrap();
        assert!(!t.can_eat(2));
    }

    #[test]
    fn test_give_up() {
        let mut t = table(3, Policy::Greedy);
        assert_eq!(t.give_up(0), None);
        t.sit_down(0).unwrap();
        let g = t.give_up(0).unwrap();
        assert_eq!((g.from, g.to), (Status::Hungry, Status::Thinking));
    }

    #[test]
    fn test_is_safe() {
        use Status::*;
        assert!(is_safe(&[Eating, Thinking, Eating, Thinking, Hungry]));
        assert!(!is_safe(&[Eating, Eating, Thinking, Thinking, Thinking]));
        // 0 と 4 も隣同士
        assert!(!is_safe(&[Eating, Thinking, Thinking, Thinking, Eating]));
        assert_eq!(
            contested_forks(&[Eating, Thinking, Thinking, Thinking, Eating]),
            1
        );
        assert_eq!(contested_forks(&[Eating, Hungry, Eating, Hungry, Hungry]), 0);
    }
}
