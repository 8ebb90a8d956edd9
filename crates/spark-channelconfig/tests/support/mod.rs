//! 集成测试共享的“带标签”组件替身。
//!
//! 每个替身把构造时的标签写进自己的查询结果，测试可以据此判断某次查询来自哪一个 Bundle。

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use spark_channelconfig::{
    ApplicationConfig, BatchSize, Bundle, ChannelConfig, ConfigtxManager, ConsortiumsConfig,
    HashingAlgorithm, MspManager, OrdererConfig, PolicyDecision, PolicyManager, RootConfig,
};

pub const CHANNEL_ID: &str = "tagged";

struct Tag {
    value: String,
    list: Vec<String>,
}

impl Tag {
    fn new(value: &str) -> Self {
        Self {
            value: value.to_owned(),
            list: vec![value.to_owned()],
        }
    }
}

struct TaggedPolicies(Tag);

impl PolicyManager for TaggedPolicies {
    fn policy_names(&self) -> Vec<&str> {
        vec![self.0.value.as_str()]
    }

    fn contains(&self, name: &str) -> bool {
        name == self.0.value
    }

    fn evaluate(&self, name: &str, _signers: &[&str]) -> PolicyDecision {
        if self.contains(name) {
            PolicyDecision::Granted
        } else {
            PolicyDecision::Unknown
        }
    }
}

struct TaggedMsps(Tag);

impl MspManager for TaggedMsps {
    fn msp_ids(&self) -> Vec<&str> {
        vec![self.0.value.as_str()]
    }

    fn is_member(&self, msp_id: &str) -> bool {
        msp_id == self.0.value
    }
}

struct TaggedChannel(Tag);

impl ChannelConfig for TaggedChannel {
    fn hashing_algorithm(&self) -> HashingAlgorithm {
        HashingAlgorithm::Sha256
    }

    fn block_data_hashing_structure_width(&self) -> u32 {
        u32::MAX
    }

    fn orderer_addresses(&self) -> &[String] {
        &self.0.list
    }
}

struct TaggedOrderer(Tag);

impl OrdererConfig for TaggedOrderer {
    fn consensus_type(&self) -> &str {
        &self.0.value
    }

    fn batch_size(&self) -> BatchSize {
        BatchSize {
            max_message_count: 1,
            absolute_max_bytes: 1,
            preferred_max_bytes: 1,
        }
    }

    fn batch_timeout(&self) -> Duration {
        Duration::from_millis(1)
    }

    fn organizations(&self) -> &[String] {
        &self.0.list
    }
}

struct TaggedConsortiums(Tag);

impl ConsortiumsConfig for TaggedConsortiums {
    fn consortium_names(&self) -> Vec<&str> {
        vec![self.0.value.as_str()]
    }

    fn members(&self, name: &str) -> Option<&[String]> {
        (name == self.0.value).then_some(self.0.list.as_slice())
    }
}

struct TaggedApplication(Tag);

impl ApplicationConfig for TaggedApplication {
    fn organizations(&self) -> &[String] {
        &self.0.list
    }
}

struct TaggedConfigtx {
    sequence: u64,
}

impl ConfigtxManager for TaggedConfigtx {
    fn channel_id(&self) -> &str {
        CHANNEL_ID
    }

    fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// 构造带标签 Bundle 的小型 builder。
pub struct TaggedBundle {
    tag: String,
    sequence: u64,
    orderer: bool,
    consortiums: bool,
    application: bool,
}

impl TaggedBundle {
    /// 默认只带通道参数，三个可选视图都缺失。
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_owned(),
            sequence: 0,
            orderer: false,
            consortiums: false,
            application: false,
        }
    }

    pub fn sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn orderer(mut self, present: bool) -> Self {
        self.orderer = present;
        self
    }

    pub fn consortiums(mut self, present: bool) -> Self {
        self.consortiums = present;
        self
    }

    pub fn application(mut self, present: bool) -> Self {
        self.application = present;
        self
    }

    /// 三个可选视图全部具备。
    pub fn full(self) -> Self {
        self.orderer(true).consortiums(true).application(true)
    }

    pub fn build(self) -> Arc<Bundle> {
        let tag = || Tag::new(&self.tag);
        let mut root = RootConfig::new(Arc::new(TaggedChannel(tag())));
        if self.orderer {
            root = root.with_orderer(Arc::new(TaggedOrderer(tag())));
        }
        if self.consortiums {
            root = root.with_consortiums(Arc::new(TaggedConsortiums(tag())));
        }
        if self.application {
            root = root.with_application(Arc::new(TaggedApplication(tag())));
        }
        Arc::new(Bundle::new(
            Arc::new(TaggedPolicies(tag())),
            Arc::new(TaggedMsps(tag())),
            root,
            Arc::new(TaggedConfigtx {
                sequence: self.sequence,
            }),
        ))
    }
}

/// 收集 Bundle 上每个组件报告的标签（缺失的可选视图跳过）。
pub fn tags_of(bundle: &Bundle) -> Vec<String> {
    let mut tags = vec![
        bundle.policy_manager().policy_names()[0].to_owned(),
        bundle.msp_manager().msp_ids()[0].to_owned(),
        bundle.channel_config().orderer_addresses()[0].clone(),
    ];
    if let Some(orderer) = bundle.orderer_config() {
        tags.push(orderer.consensus_type().to_owned());
    }
    if let Some(consortiums) = bundle.consortiums_config() {
        tags.push(consortiums.consortium_names()[0].to_owned());
    }
    if let Some(application) = bundle.application_config() {
        tags.push(application.organizations()[0].clone());
    }
    tags
}

/// 单个 Bundle 内所有组件的标签是否一致，并返回该标签。
pub fn single_tag(bundle: &Bundle) -> Option<String> {
    let tags = tags_of(bundle);
    let first = tags.first()?.clone();
    tags.iter().all(|tag| *tag == first).then_some(first)
}
