//! 基于内存数据的不可变组件实现。
//!
//! [`DefinitionBundleBuilder`](crate::builder::DefinitionBundleBuilder) 用这些类型把
//! `ChannelDefinition` 装配成 Bundle；测试与嵌入场景也可以直接构造它们。
//! 所有类型在构造时一次性排序/去重，查询期间只读。

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use crate::components::{
    ApplicationConfig, BatchSize, ChannelConfig, ConfigtxManager, ConsortiumsConfig,
    HashingAlgorithm, MspManager, OrdererConfig, PolicyDecision, PolicyManager,
};

/// “至少 `threshold` 个组织签名”形式的签名策略。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignaturePolicy {
    organizations: BTreeSet<String>,
    threshold: usize,
}

impl SignaturePolicy {
    /// 构造签名策略；`threshold` 的合法性由调用方（通常是定义校验）保证。
    pub fn new<I, S>(organizations: I, threshold: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            organizations: organizations.into_iter().map(Into::into).collect(),
            threshold,
        }
    }

    /// 参与策略的组织。
    pub fn organizations(&self) -> impl Iterator<Item = &str> {
        self.organizations.iter().map(String::as_str)
    }

    /// 所需签名组织数。
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    fn evaluate(&self, signers: &[&str]) -> PolicyDecision {
        // 同一组织重复签名只计一次。
        let satisfied = self
            .organizations
            .iter()
            .filter(|org| signers.contains(&org.as_str()))
            .count();
        if satisfied >= self.threshold {
            PolicyDecision::Granted
        } else {
            PolicyDecision::Denied {
                satisfied,
                required: self.threshold,
            }
        }
    }
}

/// 以名称索引签名策略的策略管理器。
#[derive(Clone, Debug, Default)]
pub struct StaticPolicyManager {
    policies: BTreeMap<String, SignaturePolicy>,
}

impl StaticPolicyManager {
    /// 由 `(名称, 策略)` 集合构造；重名时后者覆盖前者。
    pub fn new<I, S>(policies: I) -> Self
    where
        I: IntoIterator<Item = (S, SignaturePolicy)>,
        S: Into<String>,
    {
        Self {
            policies: policies
                .into_iter()
                .map(|(name, policy)| (name.into(), policy))
                .collect(),
        }
    }

    /// 按名称取策略定义。
    pub fn policy(&self, name: &str) -> Option<&SignaturePolicy> {
        self.policies.get(name)
    }
}

impl PolicyManager for StaticPolicyManager {
    fn policy_names(&self) -> Vec<&str> {
        self.policies.keys().map(String::as_str).collect()
    }

    fn contains(&self, name: &str) -> bool {
        self.policies.contains_key(name)
    }

    fn evaluate(&self, name: &str, signers: &[&str]) -> PolicyDecision {
        self.policies
            .get(name)
            .map_or(PolicyDecision::Unknown, |policy| policy.evaluate(signers))
    }
}

/// 以 MSP ID 集合表示的成员管理器。
#[derive(Clone, Debug, Default)]
pub struct StaticMspManager {
    msp_ids: BTreeSet<String>,
}

impl StaticMspManager {
    /// 由 MSP ID 集合构造。
    pub fn new<I, S>(msp_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            msp_ids: msp_ids.into_iter().map(Into::into).collect(),
        }
    }
}

impl MspManager for StaticMspManager {
    fn msp_ids(&self) -> Vec<&str> {
        self.msp_ids.iter().map(String::as_str).collect()
    }

    fn is_member(&self, msp_id: &str) -> bool {
        self.msp_ids.contains(msp_id)
    }
}

/// 通道通用参数。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaticChannelConfig {
    hashing_algorithm: HashingAlgorithm,
    block_data_hashing_structure_width: u32,
    orderer_addresses: Vec<String>,
}

impl StaticChannelConfig {
    /// 构造通道参数。
    pub fn new(
        hashing_algorithm: HashingAlgorithm,
        block_data_hashing_structure_width: u32,
        orderer_addresses: Vec<String>,
    ) -> Self {
        Self {
            hashing_algorithm,
            block_data_hashing_structure_width,
            orderer_addresses,
        }
    }
}

impl Default for StaticChannelConfig {
    fn default() -> Self {
        Self::new(HashingAlgorithm::Sha256, u32::MAX, Vec::new())
    }
}

impl ChannelConfig for StaticChannelConfig {
    fn hashing_algorithm(&self) -> HashingAlgorithm {
        self.hashing_algorithm
    }

    fn block_data_hashing_structure_width(&self) -> u32 {
        self.block_data_hashing_structure_width
    }

    fn orderer_addresses(&self) -> &[String] {
        &self.orderer_addresses
    }
}

/// 排序服务参数。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaticOrdererConfig {
    consensus_type: String,
    batch_size: BatchSize,
    batch_timeout: Duration,
    organizations: Vec<String>,
}

impl StaticOrdererConfig {
    /// 构造排序服务参数。
    pub fn new(
        consensus_type: impl Into<String>,
        batch_size: BatchSize,
        batch_timeout: Duration,
        organizations: Vec<String>,
    ) -> Self {
        Self {
            consensus_type: consensus_type.into(),
            batch_size,
            batch_timeout,
            organizations,
        }
    }
}

impl OrdererConfig for StaticOrdererConfig {
    fn consensus_type(&self) -> &str {
        &self.consensus_type
    }

    fn batch_size(&self) -> BatchSize {
        self.batch_size
    }

    fn batch_timeout(&self) -> Duration {
        self.batch_timeout
    }

    fn organizations(&self) -> &[String] {
        &self.organizations
    }
}

/// 联盟名到成员组织的映射。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StaticConsortiumsConfig {
    consortiums: BTreeMap<String, Vec<String>>,
}

impl StaticConsortiumsConfig {
    /// 由 `(联盟名, 成员组织)` 集合构造。
    pub fn new<I, S>(consortiums: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<String>)>,
        S: Into<String>,
    {
        Self {
            consortiums: consortiums
                .into_iter()
                .map(|(name, members)| (name.into(), members))
                .collect(),
        }
    }
}

impl ConsortiumsConfig for StaticConsortiumsConfig {
    fn consortium_names(&self) -> Vec<&str> {
        self.consortiums.keys().map(String::as_str).collect()
    }

    fn members(&self, name: &str) -> Option<&[String]> {
        self.consortiums.get(name).map(Vec::as_slice)
    }
}

/// 应用组织列表。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StaticApplicationConfig {
    organizations: Vec<String>,
}

impl StaticApplicationConfig {
    /// 由应用组织列表构造。
    pub fn new(organizations: Vec<String>) -> Self {
        Self { organizations }
    }
}

impl ApplicationConfig for StaticApplicationConfig {
    fn organizations(&self) -> &[String] {
        &self.organizations
    }
}

/// 只记录通道 ID 与序号的配置交易管理器。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaticConfigtxManager {
    channel_id: String,
    sequence: u64,
}

impl StaticConfigtxManager {
    /// 构造配置交易管理器。
    pub fn new(channel_id: impl Into<String>, sequence: u64) -> Self {
        Self {
            channel_id: channel_id.into(),
            sequence,
        }
    }
}

impl ConfigtxManager for StaticConfigtxManager {
    fn channel_id(&self) -> &str {
        &self.channel_id
    }

    fn sequence(&self) -> u64 {
        self.sequence
    }
}
