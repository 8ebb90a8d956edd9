//! `BundleSource`：当前通道配置 Bundle 的原子发布点。

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use tracing::debug;

use crate::bundle::Bundle;
use crate::components::{
    ApplicationConfig, ChannelConfig, ConfigtxManager, ConsortiumsConfig, MspManager,
    OrdererConfig, PolicyManager,
};
use crate::error::BundleError;
use crate::slot::BundleSlot;

/// 通道配置的热更新容器。
///
/// # 设计动机（Why）
/// - **一致性目标**：读者常需要组合多个派生事实（先查排序组织，再用 MSP 校验这些组织），
///   若两次查询之间发生更新，组合结果可能从未是一个合法配置；
/// - **模式选择**：内部仅有一个原子槽位保存 `Arc<Bundle>`，写者整体替换、读者一次取用，
///   读路径无锁且互不阻塞，写路径常数时间，经典 RCU 式配置广播；
/// - **架构角色**：位于重配置触发方与各业务读者之间，自身不负责构建或校验 Bundle。
///
/// # 核心契约（What）
/// - **不变量**：槽位自构造起始终持有一个完整 Bundle，不存在空状态；
/// - **读取**：[`Self::stable_bundle`] 执行唯一一次原子读取，返回的 [`StableBundle`] 在整个
///   生命周期内指向同一个 Bundle，之后的所有派生查询都应基于它；
/// - **写入**：[`Self::update`] 原子替换，多个写者并发时后写者生效，不保证写者之间的先后顺序；
///   单个 `update` 返回后，随后调用 `stable_bundle` 的线程必然看到该 Bundle 或更新的 Bundle。
///
/// # 风险提示（Trade-offs & Gotchas）
/// - 便捷访问器（[`Self::policy_manager`]、[`Self::orderer_config`] 等）**各自**读取一次槽位，
///   连续调用两个便捷访问器不保证来自同一 Bundle；需要跨字段一致性时请先取 `StableBundle`；
/// - 高频更新时多个旧 Bundle 可能被在途读者同时持有，内存峰值取决于读者持有时长。
#[derive(Clone)]
pub struct BundleSource {
    /// 共享槽位；克隆 `BundleSource` 只复制外层 `Arc`，所有克隆观察同一个槽位。
    inner: Arc<BundleSlot<Bundle>>,
}

impl BundleSource {
    /// 以初始 Bundle 构造容器。
    ///
    /// `Arc<Bundle>` 参数在类型层面排除了“没有初始 Bundle”的情况，因此本函数不会失败。
    pub fn new(initial: Arc<Bundle>) -> Self {
        debug!(
            channel_id = initial.channel_id(),
            sequence = initial.sequence(),
            "bundle source initialised"
        );
        Self {
            inner: Arc::new(BundleSlot::new(initial)),
        }
    }

    /// 以值语义构造容器，语义与 [`Self::new`] 等价。
    #[inline]
    pub fn from_bundle(initial: Bundle) -> Self {
        Self::new(Arc::new(initial))
    }

    /// 面向“Bundle 可能缺失”的调用方的构造入口。
    ///
    /// # 契约（What）
    /// - `initial` 为 `None` 时立即返回 [`BundleError::MissingBundle`]，而不是推迟到首次读取；
    /// - 其余情况等价于 [`Self::new`]。
    pub fn try_new(initial: Option<Arc<Bundle>>) -> crate::Result<Self> {
        initial.map(Self::new).ok_or(BundleError::MissingBundle {
            operation: "BundleSource::try_new",
        })
    }

    /// 原子发布新的 Bundle。
    ///
    /// # 契约（What）
    /// - 可与任意数量的读取、其他更新并发调用；不阻塞、不失败、无返回值；
    /// - 返回后，任何随后调用 [`Self::stable_bundle`] 的线程都能看到 `next` 或更新的 Bundle；
    /// - 已被读者持有的 [`StableBundle`] 不受影响。
    pub fn update(&self, next: Arc<Bundle>) {
        let published = Arc::clone(&next);
        self.inner.store(next);
        debug!(
            channel_id = published.channel_id(),
            sequence = published.sequence(),
            "bundle published"
        );
    }

    /// `update` 的可失败版本：`next` 为 `None` 时返回 [`BundleError::MissingBundle`]，槽位保持不变。
    pub fn try_update(&self, next: Option<Arc<Bundle>>) -> crate::Result<()> {
        let next = next.ok_or(BundleError::MissingBundle {
            operation: "BundleSource::try_update",
        })?;
        self.update(next);
        Ok(())
    }

    /// 原子替换并返回被替换下来的 Bundle，便于调用方审计或延迟回收。
    pub fn replace(&self, next: Arc<Bundle>) -> Arc<Bundle> {
        let published = Arc::clone(&next);
        let previous = self.inner.swap(next);
        debug!(
            channel_id = published.channel_id(),
            sequence = published.sequence(),
            previous_sequence = previous.sequence(),
            "bundle replaced"
        );
        previous
    }

    /// 仅当槽位仍持有 `expected` 时发布 `next`。
    ///
    /// # 契约（What）
    /// - 以 Bundle 身份（指针）而非内容比较；
    /// - 成功返回被替换的旧 Bundle；失败返回当前实际生效的 Bundle，`next` 被丢弃。
    ///
    /// # 使用场景（How）
    /// - 重配置触发方“读取当前 → 构建候选 → 发布”三步之间可能有其他写者插入，
    ///   通过 CAS 把第三步变成条件发布，避免覆盖掉更新的配置。
    pub fn compare_and_swap(
        &self,
        expected: &StableBundle,
        next: Arc<Bundle>,
    ) -> Result<StableBundle, StableBundle> {
        let sequence = next.sequence();
        match self.inner.compare_and_swap(&expected.0, next) {
            Ok(previous) => {
                debug!(
                    channel_id = previous.channel_id(),
                    sequence,
                    previous_sequence = previous.sequence(),
                    "bundle published via compare-and-swap"
                );
                Ok(StableBundle(previous))
            }
            Err(actual) => Err(StableBundle(actual)),
        }
    }

    /// 获取当前 Bundle 的稳定句柄。
    ///
    /// # 契约（What）
    /// - 恰好一次原子读取；返回的句柄此后始终指向同一个 Bundle，即便其他线程随后调用 `update`；
    /// - 需要关联多次查询时，只应调用一次本方法，然后在句柄上完成全部查询。
    #[inline]
    pub fn stable_bundle(&self) -> StableBundle {
        StableBundle(self.inner.load_full())
    }

    /// [`Self::stable_bundle`] 的别名。
    #[inline]
    pub fn current(&self) -> StableBundle {
        self.stable_bundle()
    }

    // 以下便捷访问器各自执行一次独立读取，彼此之间不保证来自同一 Bundle。

    /// 当前 Bundle 的策略管理器。
    pub fn policy_manager(&self) -> Arc<dyn PolicyManager> {
        Arc::clone(self.stable_bundle().policy_manager())
    }

    /// 当前 Bundle 的 MSP 管理器。
    pub fn msp_manager(&self) -> Arc<dyn MspManager> {
        Arc::clone(self.stable_bundle().msp_manager())
    }

    /// 当前 Bundle 的通道通用参数。
    pub fn channel_config(&self) -> Arc<dyn ChannelConfig> {
        Arc::clone(self.stable_bundle().channel_config())
    }

    /// 当前 Bundle 的排序服务视图；`None` 表示该通道没有排序服务配置。
    pub fn orderer_config(&self) -> Option<Arc<dyn OrdererConfig>> {
        self.stable_bundle().orderer_config().cloned()
    }

    /// 当前 Bundle 的联盟视图；`None` 表示该通道没有联盟配置。
    pub fn consortiums_config(&self) -> Option<Arc<dyn ConsortiumsConfig>> {
        self.stable_bundle().consortiums_config().cloned()
    }

    /// 当前 Bundle 的应用视图；`None` 表示该通道没有应用配置。
    pub fn application_config(&self) -> Option<Arc<dyn ApplicationConfig>> {
        self.stable_bundle().application_config().cloned()
    }

    /// 当前 Bundle 的配置交易管理器。
    pub fn configtx_manager(&self) -> Arc<dyn ConfigtxManager> {
        Arc::clone(self.stable_bundle().configtx_manager())
    }
}

impl fmt::Debug for BundleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BundleSource").finish_non_exhaustive()
    }
}

/// 一次读取得到的稳定 Bundle 句柄。
///
/// - 通过 `Deref` 直接调用 [`Bundle`] 的全部访问器，所有结果都来自同一次构建；
/// - 克隆仅增加引用计数，句柄存活期间对应 Bundle 不会被回收；
/// - 句柄本身不会感知后续更新，需要最新配置时重新调用 [`BundleSource::stable_bundle`]。
#[derive(Clone)]
pub struct StableBundle(Arc<Bundle>);

impl StableBundle {
    /// 两个句柄是否指向同一个 Bundle 实例。
    #[inline]
    pub fn same_bundle(&self, other: &StableBundle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// 取出内部的 `Arc<Bundle>`。
    #[inline]
    pub fn into_inner(self) -> Arc<Bundle> {
        self.0
    }
}

impl Deref for StableBundle {
    type Target = Bundle;

    #[inline]
    fn deref(&self) -> &Bundle {
        &self.0
    }
}

impl AsRef<Bundle> for StableBundle {
    fn as_ref(&self) -> &Bundle {
        &self.0
    }
}

impl From<Arc<Bundle>> for StableBundle {
    fn from(bundle: Arc<Bundle>) -> Self {
        Self(bundle)
    }
}

impl From<StableBundle> for Arc<Bundle> {
    fn from(handle: StableBundle) -> Self {
        handle.0
    }
}

impl fmt::Debug for StableBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StableBundle").field(&*self.0).finish()
    }
}
