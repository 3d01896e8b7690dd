//! 互斥域 - 基础设施层
//!
//! 一个 `LockDomain` 保护一组字段。同步模式下进入临界区会等待
//! 异步互斥锁；非同步模式下直接放行，用来复现竞争条件。
//!
//! 两种模式都会统计同时持有者数量：同一时刻有第二个持有者进入即记为
//! 一次重叠（overlap）。同步模式下重叠次数恒为 0。

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::{Mutex, MutexGuard};

/// 同步策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// 所有共享字段的读写都在对应互斥域内进行
    Synchronized,
    /// 绕过互斥域（保留竞争条件，用于对比演示）
    Unsynchronized,
}

impl SyncMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SyncMode::Synchronized => "synchronized",
            SyncMode::Unsynchronized => "unsynchronized",
        }
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "synchronized" | "sync" => Ok(SyncMode::Synchronized),
            "unsynchronized" | "unsync" => Ok(SyncMode::Unsynchronized),
            other => Err(format!("未知的同步模式: {}", other)),
        }
    }
}

/// 互斥域统计
#[derive(Debug, Clone, Serialize)]
pub struct LockStats {
    pub name: &'static str,
    /// 进入临界区次数
    pub entries: u64,
    /// 与其他持有者重叠的次数
    pub overlaps: u64,
}

/// 互斥域
pub struct LockDomain {
    name: &'static str,
    mode: SyncMode,
    mutex: Mutex<()>,
    holders: AtomicUsize,
    entries: AtomicU64,
    overlaps: AtomicU64,
}

impl LockDomain {
    pub fn new(name: &'static str, mode: SyncMode) -> Self {
        Self {
            name,
            mode,
            mutex: Mutex::new(()),
            holders: AtomicUsize::new(0),
            entries: AtomicU64::new(0),
            overlaps: AtomicU64::new(0),
        }
    }

    pub fn mode(&self) -> SyncMode {
        self.mode
    }

    /// 进入临界区
    ///
    /// 同步模式下阻塞直到没有其他持有者；唤醒顺序由 tokio 互斥锁决定
    /// （FIFO，尽力而为，不作公平性保证）。返回的守卫离开作用域即释放。
    pub async fn enter(&self) -> CriticalSection<'_> {
        let guard = match self.mode {
            SyncMode::Synchronized => Some(self.mutex.lock().await),
            SyncMode::Unsynchronized => None,
        };

        if self.holders.fetch_add(1, Ordering::SeqCst) > 0 {
            self.overlaps.fetch_add(1, Ordering::Relaxed);
        }
        self.entries.fetch_add(1, Ordering::Relaxed);

        CriticalSection {
            domain: self,
            guard,
        }
    }

    pub fn stats(&self) -> LockStats {
        LockStats {
            name: self.name,
            entries: self.entries.load(Ordering::Relaxed),
            overlaps: self.overlaps.load(Ordering::Relaxed),
        }
    }
}

impl fmt::Debug for LockDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockDomain")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("holders", &self.holders.load(Ordering::Relaxed))
            .finish()
    }
}

/// 临界区守卫
///
/// 持有者计数先于互斥锁释放递减
pub struct CriticalSection<'a> {
    domain: &'a LockDomain,
    guard: Option<MutexGuard<'a, ()>>,
}

impl CriticalSection<'_> {
    /// 本守卫是否真正持有互斥锁
    pub fn is_exclusive(&self) -> bool {
        self.guard.is_some()
    }
}

impl Drop for CriticalSection<'_> {
    fn drop(&mut self) {
        self.domain.holders.fetch_sub(1, Ordering::SeqCst);
    }
}
