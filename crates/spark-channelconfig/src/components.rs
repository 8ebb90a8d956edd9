//! Bundle 聚合的子组件契约。
//!
//! # 模块定位（Why）
//! - Bundle 只负责“把同一次构建产出的组件绑在一起”，组件本身如何求值策略、校验成员、解析参数
//!   由外部构建方决定；此处仅以 trait 描述读者可以依赖的查询面；
//! - 所有 trait 均要求 `Send + Sync`，组件以 `Arc<dyn Trait>` 形式被 Bundle 独占持有，
//!   发布后可在任意线程无同步读取。
//!
//! # 契约说明（What）
//! - 实现必须是**不可变**的：构造完成后任何查询都返回同一结果，不允许惰性计算后回写；
//! - 可选视图（排序服务、联盟、应用）由 [`RootConfig`] 以 `Option` 表达，缺失属于合法领域状态。

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// 策略求值结果。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolicyDecision {
    /// 签名集合满足策略。
    Granted,
    /// 签名集合不足，`satisfied` 为已满足的签名方数量。
    Denied {
        /// 已满足的签名方数量。
        satisfied: usize,
        /// 策略要求的签名方数量。
        required: usize,
    },
    /// 策略不存在。
    Unknown,
}

impl PolicyDecision {
    /// 是否放行。
    pub fn is_granted(&self) -> bool {
        matches!(self, PolicyDecision::Granted)
    }
}

/// 策略管理组件。
pub trait PolicyManager: Send + Sync {
    /// 当前配置下定义的全部策略名，按字典序返回。
    fn policy_names(&self) -> Vec<&str>;

    /// 是否定义了名为 `name` 的策略。
    fn contains(&self, name: &str) -> bool;

    /// 以签名方（MSP ID）集合对策略 `name` 求值。
    fn evaluate(&self, name: &str, signers: &[&str]) -> PolicyDecision;
}

/// 成员/身份管理组件。
pub trait MspManager: Send + Sync {
    /// 通道内登记的全部 MSP ID，按字典序返回。
    fn msp_ids(&self) -> Vec<&str>;

    /// `msp_id` 是否为通道成员。
    fn is_member(&self, msp_id: &str) -> bool;
}

/// 区块数据哈希算法。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HashingAlgorithm {
    /// SHA-256。
    #[default]
    Sha256,
    /// SHA3-256。
    #[serde(rename = "SHA3_256")]
    Sha3_256,
}

/// 通道级通用参数视图。
pub trait ChannelConfig: Send + Sync {
    /// 区块数据使用的哈希算法。
    fn hashing_algorithm(&self) -> HashingAlgorithm;

    /// 区块数据哈希结构的宽度。
    fn block_data_hashing_structure_width(&self) -> u32;

    /// 排序服务节点地址。
    fn orderer_addresses(&self) -> &[String];
}

/// 出块批次的大小约束。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSize {
    /// 单批最多消息数。
    pub max_message_count: u32,
    /// 单批字节数的硬上限。
    pub absolute_max_bytes: u32,
    /// 单批字节数的期望值。
    pub preferred_max_bytes: u32,
}

/// 排序服务视图。仅排序相关通道具备。
pub trait OrdererConfig: Send + Sync {
    /// 共识类型，例如 `solo`、`etcdraft`。
    fn consensus_type(&self) -> &str;

    /// 出块批次约束。
    fn batch_size(&self) -> BatchSize;

    /// 出块超时。
    fn batch_timeout(&self) -> Duration;

    /// 排序服务组织的 MSP ID。
    fn organizations(&self) -> &[String];
}

/// 联盟视图。仅系统通道具备。
pub trait ConsortiumsConfig: Send + Sync {
    /// 全部联盟名，按字典序返回。
    fn consortium_names(&self) -> Vec<&str>;

    /// 联盟 `name` 的成员组织；联盟不存在时返回 `None`。
    fn members(&self, name: &str) -> Option<&[String]>;
}

/// 应用视图。仅应用通道具备。
pub trait ApplicationConfig: Send + Sync {
    /// 应用组织的 MSP ID。
    fn organizations(&self) -> &[String];
}

/// 配置交易管理组件。
pub trait ConfigtxManager: Send + Sync {
    /// 通道 ID。
    fn channel_id(&self) -> &str;

    /// 当前配置序号，每次配置更新单调递增。
    fn sequence(&self) -> u64;
}

/// 根配置：通道通用参数加上三个可选子视图。
///
/// # 契约（What）
/// - `channel` 必然存在；
/// - `orderer`/`consortiums`/`application` 依通道角色可能缺失，读取方必须对 `None` 分支处理；
/// - 构造后不可变，`Clone` 只复制 `Arc` 引用。
#[derive(Clone)]
pub struct RootConfig {
    channel: Arc<dyn ChannelConfig>,
    orderer: Option<Arc<dyn OrdererConfig>>,
    consortiums: Option<Arc<dyn ConsortiumsConfig>>,
    application: Option<Arc<dyn ApplicationConfig>>,
}

impl RootConfig {
    /// 以通道参数构造根配置，三个可选视图初始为空。
    pub fn new(channel: Arc<dyn ChannelConfig>) -> Self {
        Self {
            channel,
            orderer: None,
            consortiums: None,
            application: None,
        }
    }

    /// 附加排序服务视图。
    pub fn with_orderer(mut self, orderer: Arc<dyn OrdererConfig>) -> Self {
        self.orderer = Some(orderer);
        self
    }

    /// 附加联盟视图。
    pub fn with_consortiums(mut self, consortiums: Arc<dyn ConsortiumsConfig>) -> Self {
        self.consortiums = Some(consortiums);
        self
    }

    /// 附加应用视图。
    pub fn with_application(mut self, application: Arc<dyn ApplicationConfig>) -> Self {
        self.application = Some(application);
        self
    }

    /// 通道通用参数。
    pub fn channel(&self) -> &Arc<dyn ChannelConfig> {
        &self.channel
    }

    /// 排序服务视图。
    pub fn orderer(&self) -> Option<&Arc<dyn OrdererConfig>> {
        self.orderer.as_ref()
    }

    /// 联盟视图。
    pub fn consortiums(&self) -> Option<&Arc<dyn ConsortiumsConfig>> {
        self.consortiums.as_ref()
    }

    /// 应用视图。
    pub fn application(&self) -> Option<&Arc<dyn ApplicationConfig>> {
        self.application.as_ref()
    }
}

impl fmt::Debug for RootConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootConfig")
            .field("has_orderer", &self.orderer.is_some())
            .field("has_consortiums", &self.consortiums.is_some())
            .field("has_application", &self.application.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedChannel;

    impl ChannelConfig for FixedChannel {
        fn hashing_algorithm(&self) -> HashingAlgorithm {
            HashingAlgorithm::Sha256
        }

        fn block_data_hashing_structure_width(&self) -> u32 {
            u32::MAX
        }

        fn orderer_addresses(&self) -> &[String] {
            &[]
        }
    }

    struct NoApps;

    impl ApplicationConfig for NoApps {
        fn organizations(&self) -> &[String] {
            &[]
        }
    }

    #[test]
    fn optional_views_default_to_absent() {
        let root = RootConfig::new(Arc::new(FixedChannel));
        assert!(root.orderer().is_none());
        assert!(root.consortiums().is_none());
        assert!(root.application().is_none());
        assert_eq!(root.channel().block_data_hashing_structure_width(), u32::MAX);
    }

    #[test]
    fn with_application_only_sets_application() {
        let root = RootConfig::new(Arc::new(FixedChannel)).with_application(Arc::new(NoApps));
        assert!(root.application().is_some());
        assert!(root.orderer().is_none());
        assert!(format!("{root:?}").contains("has_application: true"));
    }

    #[test]
    fn hashing_algorithm_uses_upper_case_names() {
        #[derive(Deserialize)]
        struct Holder {
            algo: HashingAlgorithm,
        }
        let holder: Holder = toml::from_str("algo = \"SHA3_256\"").unwrap();
        assert_eq!(holder.algo, HashingAlgorithm::Sha3_256);
        let holder: Holder = toml::from_str("algo = \"SHA256\"").unwrap();
        assert_eq!(holder.algo, HashingAlgorithm::Sha256);
    }
}
