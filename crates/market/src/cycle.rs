//! # 轮询周期序号器
//!
//! 前端按固定间隔轮询，慢请求可能晚于后发请求完成。序号器给每个
//! 轮询周期发放单调递增序号，提交时只接受比已提交水位更新的周期，
//! 过期结果直接丢弃。

use std::sync::atomic::{AtomicU64, Ordering};

/// # Summary
/// 单调周期序号器。
///
/// # Invariants
/// - `begin` 返回的序号严格递增，并发调用不重复。
/// - `try_commit` 只接受高于当前水位的序号；接受即推进水位。
/// - 全程无锁，提交采用 `fetch_max`，并发提交时最大序号胜出。
#[derive(Debug, Default)]
pub struct PollSequencer {
    // 下一个待发放的序号
    next: AtomicU64,
    // 已提交的最高序号（水位）
    committed: AtomicU64,
}

impl PollSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Summary
    /// 开始一个新周期，返回其序号（从 1 起）。
    pub fn begin(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// # Summary
    /// 尝试提交某周期的结果。
    ///
    /// # Returns
    /// `true` 表示该周期比水位新，结果应被采纳；
    /// `false` 表示已有更新的周期提交过，结果应丢弃。
    pub fn try_commit(&self, cycle: u64) -> bool {
        let prev = self.committed.fetch_max(cycle, Ordering::AcqRel);
        prev < cycle
    }

    /// 当前已提交的水位（0 表示尚无提交）
    pub fn watermark(&self) -> u64 {
        self.committed.load(Ordering::Acquire)
    }
}
