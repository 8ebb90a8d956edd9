//! 重配置触发方：构建候选 Bundle、做发布前检查、条件发布。
//!
//! # 设计背景（Why）
//! - `BundleSource` 只负责原子发布，不校验内容；“候选配置是否可以替换当前配置”属于触发方职责；
//! - 候选构建失败或检查不通过时，当前 Bundle 保持生效，错误原样返回给调用方，是否重试由调用方决定。
//!
//! # 流程（How）
//! 1. 读取一次当前 Bundle（稳定句柄）；
//! 2. 构建候选 Bundle；
//! 3. 检查通道 ID 一致、序号严格递增；
//! 4. 以第 1 步的句柄为预期值执行 CAS 发布；若期间已有其他写者发布，返回
//!    [`BundleError::ConcurrentUpdate`]。

use std::sync::Arc;

use tracing::{info, warn};

use crate::builder::BundleBuilder;
use crate::error::BundleError;
use crate::source::{BundleSource, StableBundle};

/// 把 [`BundleBuilder`] 与 [`BundleSource`] 串联起来的重配置入口。
#[derive(Debug)]
pub struct Reconfigurator<B> {
    source: BundleSource,
    builder: B,
}

impl<B: BundleBuilder> Reconfigurator<B> {
    /// 用已有的容器和构建方组装触发方。
    pub fn new(source: BundleSource, builder: B) -> Self {
        Self { source, builder }
    }

    /// 从初始定义构建第一个 Bundle 并创建容器。
    pub fn bootstrap(builder: B, definition: &B::Definition) -> crate::Result<Self> {
        let bundle = builder.build(definition)?;
        info!(
            channel_id = bundle.channel_id(),
            sequence = bundle.sequence(),
            "channel config bootstrapped"
        );
        Ok(Self::new(BundleSource::from_bundle(bundle), builder))
    }

    /// 读者使用的容器；克隆后可分发到各个线程。
    pub fn source(&self) -> &BundleSource {
        &self.source
    }

    /// 构建方。
    pub fn builder(&self) -> &B {
        &self.builder
    }

    /// 构建并发布新配置，成功时返回新发布的 Bundle 句柄。
    ///
    /// # 契约（What）
    /// - 失败时槽位不变；
    /// - 错误：构建错误原样返回；[`BundleError::ChannelMismatch`]、[`BundleError::StaleSequence`]、
    ///   [`BundleError::ConcurrentUpdate`] 见模块说明。
    pub fn apply(&self, definition: &B::Definition) -> crate::Result<StableBundle> {
        let current = self.source.stable_bundle();
        let result = self
            .build_candidate(&current, definition)
            .and_then(|candidate| self.publish(&current, candidate));
        if let Err(err) = &result {
            warn!(
                channel_id = current.channel_id(),
                sequence = current.sequence(),
                error = %err,
                "channel config update rejected"
            );
        }
        result
    }

    fn build_candidate(
        &self,
        current: &StableBundle,
        definition: &B::Definition,
    ) -> crate::Result<Arc<crate::Bundle>> {
        let candidate = self.builder.build(definition)?;
        if candidate.channel_id() != current.channel_id() {
            return Err(BundleError::ChannelMismatch {
                current: current.channel_id().to_owned(),
                proposed: candidate.channel_id().to_owned(),
            });
        }
        if candidate.sequence() <= current.sequence() {
            return Err(BundleError::StaleSequence {
                current: current.sequence(),
                proposed: candidate.sequence(),
            });
        }
        Ok(Arc::new(candidate))
    }

    fn publish(
        &self,
        current: &StableBundle,
        candidate: Arc<crate::Bundle>,
    ) -> crate::Result<StableBundle> {
        let published = StableBundle::from(Arc::clone(&candidate));
        self.source
            .compare_and_swap(current, candidate)
            .map_err(|_| BundleError::ConcurrentUpdate)?;
        info!(
            channel_id = published.channel_id(),
            sequence = published.sequence(),
            previous_sequence = current.sequence(),
            "channel config updated"
        );
        Ok(published)
    }
}
