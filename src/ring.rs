// 円卓の席の計算
// 哲学者 i の右にはフォーク i、左にはフォーク i + 1 があり、
// 各フォークはちょうど隣り合う2人に共有される

// 左隣の哲学者
pub fn left(i: usize, n: usize) -> usize {
    (i + n - 1) % n
}

// 右隣の哲学者
pub fn right(i: usize, n: usize) -> usize {
    (i + 1) % n
}

pub fn right_fork(i: usize) -> usize {
    i
}

pub fn left_fork(i: usize, n: usize) -> usize {
    (i + 1) % n
}

// フォーク k を使う2人 (右のフォークとして使う人, 左のフォークとして使う人)
pub fn fork_users(k: usize, n: usize) -> [usize; 2] {
    [k, (k + n - 1) % n]
}
