//! 单字原子槽位：`BundleSource` 唯一的共享可变位置。
//!
//! # 设计背景（Why）
//! - 读者之间不应互相串行化，Bundle 又是不可变值，因此采用 RCU 式“整体替换指针”而非互斥锁；
//! - 常规构建使用 [`arc_swap::ArcSwap`]：读写都是常数时间、无锁，`store` 与 `load` 之间具备
//!   Release/Acquire 语义，读者看到新指针时必然也看到 Bundle 的全部内部状态；
//! - Loom 无法建模 `arc-swap` 的内部原子序列，因此在 `--cfg spark_loom` + `loom-model` 下切换为
//!   `loom::sync::RwLock<Arc<T>>`，让模型检查器穷举“发布/读取”交错，接口保持一致。
//!
//! # 契约（What）
//! - 槽位从构造起就持有一个 `Arc<T>`，不存在空状态；
//! - `compare_and_swap` 以指针身份（`Arc::ptr_eq`）判断是否命中预期值。

use std::sync::Arc;

#[cfg(not(all(feature = "loom-model", any(loom, spark_loom))))]
mod imp {
    use std::sync::Arc;

    use arc_swap::ArcSwap;

    pub(crate) struct Slot<T> {
        inner: ArcSwap<T>,
    }

    impl<T> Slot<T> {
        pub(crate) fn new(initial: Arc<T>) -> Self {
            Self {
                inner: ArcSwap::new(initial),
            }
        }

        #[inline]
        pub(crate) fn load_full(&self) -> Arc<T> {
            self.inner.load_full()
        }

        #[inline]
        pub(crate) fn store(&self, next: Arc<T>) {
            self.inner.store(next);
        }

        #[inline]
        pub(crate) fn swap(&self, next: Arc<T>) -> Arc<T> {
            self.inner.swap(next)
        }

        #[inline]
        pub(crate) fn compare_and_swap(&self, expected: &Arc<T>, next: Arc<T>) -> Arc<T> {
            let previous = self.inner.compare_and_swap(expected, next);
            Arc::clone(&*previous)
        }
    }
}

#[cfg(all(feature = "loom-model", any(loom, spark_loom)))]
mod imp {
    use std::sync::{Arc, PoisonError};

    use loom::sync::RwLock;

    pub(crate) struct Slot<T> {
        inner: RwLock<Arc<T>>,
    }

    impl<T> Slot<T> {
        pub(crate) fn new(initial: Arc<T>) -> Self {
            Self {
                inner: RwLock::new(initial),
            }
        }

        pub(crate) fn load_full(&self) -> Arc<T> {
            let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(&*guard)
        }

        pub(crate) fn store(&self, next: Arc<T>) {
            drop(self.swap(next));
        }

        pub(crate) fn swap(&self, next: Arc<T>) -> Arc<T> {
            let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *guard, next)
        }

        pub(crate) fn compare_and_swap(&self, expected: &Arc<T>, next: Arc<T>) -> Arc<T> {
            let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
            if Arc::ptr_eq(&*guard, expected) {
                std::mem::replace(&mut *guard, next)
            } else {
                Arc::clone(&*guard)
            }
        }
    }
}

/// 持有 `Arc<T>` 的原子槽位。
pub(crate) struct BundleSlot<T> {
    imp: imp::Slot<T>,
}

impl<T> BundleSlot<T> {
    /// 以初始值构造槽位。
    pub(crate) fn new(initial: Arc<T>) -> Self {
        Self {
            imp: imp::Slot::new(initial),
        }
    }

    /// 读取当前值的强引用，调用方持有期间该值不会被回收。
    #[inline]
    pub(crate) fn load_full(&self) -> Arc<T> {
        self.imp.load_full()
    }

    /// 原子替换当前值，旧值在最后一个持有者释放后回收。
    #[inline]
    pub(crate) fn store(&self, next: Arc<T>) {
        self.imp.store(next);
    }

    /// 原子替换当前值并返回旧值。
    #[inline]
    pub(crate) fn swap(&self, next: Arc<T>) -> Arc<T> {
        self.imp.swap(next)
    }

    /// 仅当槽位仍持有 `expected`（指针相等）时写入 `next`。
    ///
    /// 成功返回 `Ok(旧值)`；失败返回 `Err(实际当前值)`，此时 `next` 被丢弃。
    pub(crate) fn compare_and_swap(
        &self,
        expected: &Arc<T>,
        next: Arc<T>,
    ) -> Result<Arc<T>, Arc<T>> {
        let previous = self.imp.compare_and_swap(expected, next);
        if Arc::ptr_eq(&previous, expected) {
            Ok(previous)
        } else {
            Err(previous)
        }
    }
}
