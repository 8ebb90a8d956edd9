//! Bundle 构建方契约与基于 [`ChannelDefinition`] 的默认实现。

use std::sync::Arc;

use crate::bundle::Bundle;
use crate::components::RootConfig;
use crate::definition::ChannelDefinition;
use crate::static_components::{
    SignaturePolicy, StaticApplicationConfig, StaticChannelConfig, StaticConfigtxManager,
    StaticConsortiumsConfig, StaticMspManager, StaticOrdererConfig, StaticPolicyManager,
};

/// `BundleBuilder` 把一份已校验的配置定义装配为完整的 [`Bundle`]。
///
/// # 契约说明（What）
/// - **输入**：`definition` 为构建方认可的定义类型；
/// - **输出**：要么返回完整、不可变的 Bundle，要么返回构建错误，不存在“半成品”；
/// - **线程安全**：实现需 `Send + Sync`，重配置触发方可能在任意线程调用。
///
/// # 风险提示（Trade-offs）
/// - 构建可能较重（解析证书、编译策略），应在发布前完成，发布本身只是一次指针替换。
pub trait BundleBuilder: Send + Sync {
    /// 构建输入。
    type Definition: ?Sized;

    /// 构建 Bundle。
    fn build(&self, definition: &Self::Definition) -> crate::Result<Bundle>;
}

/// 以 [`ChannelDefinition`] 为输入、以 `Static*` 组件为产物的构建方。
#[derive(Clone, Copy, Debug, Default)]
pub struct DefinitionBundleBuilder;

impl DefinitionBundleBuilder {
    /// 构造构建方。
    pub fn new() -> Self {
        Self
    }
}

impl BundleBuilder for DefinitionBundleBuilder {
    type Definition = ChannelDefinition;

    fn build(&self, definition: &ChannelDefinition) -> crate::Result<Bundle> {
        // 定义可能由调用方手工拼装，构建前重新校验一次。
        definition.validate()?;

        let policy_manager = StaticPolicyManager::new(definition.policies.iter().map(
            |(name, policy)| {
                (
                    name.clone(),
                    SignaturePolicy::new(policy.organizations.iter().cloned(), policy.threshold),
                )
            },
        ));
        let msp_manager = StaticMspManager::new(definition.organizations.iter().cloned());

        let mut root = RootConfig::new(Arc::new(StaticChannelConfig::new(
            definition.hashing_algorithm,
            definition.block_data_hashing_structure_width,
            definition.orderer_addresses.clone(),
        )));
        if let Some(orderer) = &definition.orderer {
            root = root.with_orderer(Arc::new(StaticOrdererConfig::new(
                orderer.consensus_type.clone(),
                orderer.batch_size,
                orderer.batch_timeout(),
                orderer.organizations.clone(),
            )));
        }
        if let Some(consortiums) = &definition.consortiums {
            root = root.with_consortiums(Arc::new(StaticConsortiumsConfig::new(
                consortiums
                    .iter()
                    .map(|(name, consortium)| (name.clone(), consortium.organizations.clone())),
            )));
        }
        if let Some(application) = &definition.application {
            root = root.with_application(Arc::new(StaticApplicationConfig::new(
                application.organizations.clone(),
            )));
        }

        Ok(Bundle::new(
            Arc::new(policy_manager),
            Arc::new(msp_manager),
            root,
            Arc::new(StaticConfigtxManager::new(
                definition.channel_id.clone(),
                definition.sequence,
            )),
        ))
    }
}
