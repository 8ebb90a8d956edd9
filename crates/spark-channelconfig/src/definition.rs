//! 通道配置定义：Bundle 构建方的输入。
//!
//! # 设计背景（Why）
//! - Bundle 必须从“已校验的配置定义”一次性构建；定义本身是普通数据，可以来自 TOML 文件、
//!   控制面推送或测试代码；
//! - 本模块只负责反序列化与语义校验，不持有任何运行期状态。
//!
//! # 格式示例（What）
//! ```toml
//! channel_id = "mychannel"
//! sequence = 3
//! hashing_algorithm = "SHA256"
//! organizations = ["OrdererMSP", "Org1MSP", "Org2MSP"]
//!
//! [policies.Admins]
//! organizations = ["Org1MSP", "Org2MSP"]
//! threshold = 2
//!
//! [orderer]
//! consensus_type = "etcdraft"
//! batch_timeout_ms = 2000
//! organizations = ["OrdererMSP"]
//! batch_size = { max_message_count = 500, absolute_max_bytes = 10485760, preferred_max_bytes = 2097152 }
//!
//! [application]
//! organizations = ["Org1MSP", "Org2MSP"]
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::components::{BatchSize, HashingAlgorithm};
use crate::error::BundleError;

const MAX_CHANNEL_ID_LEN: usize = 249;

fn default_hashing_width() -> u32 {
    u32::MAX
}

fn default_consensus_type() -> String {
    String::from("solo")
}

/// 一个通道的完整配置定义。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelDefinition {
    /// 通道 ID，形如 `[a-z][a-z0-9.-]*`。
    pub channel_id: String,
    /// 配置序号。
    #[serde(default)]
    pub sequence: u64,
    /// 区块数据哈希算法。
    #[serde(default)]
    pub hashing_algorithm: HashingAlgorithm,
    /// 区块数据哈希结构宽度。
    #[serde(default = "default_hashing_width")]
    pub block_data_hashing_structure_width: u32,
    /// 排序服务节点地址。
    #[serde(default)]
    pub orderer_addresses: Vec<String>,
    /// 通道内登记的全部组织（MSP ID）。
    #[serde(default)]
    pub organizations: Vec<String>,
    /// 签名策略，键为策略名。
    #[serde(default)]
    pub policies: BTreeMap<String, PolicyDefinition>,
    /// 排序服务参数。
    #[serde(default)]
    pub orderer: Option<OrdererDefinition>,
    /// 联盟定义，键为联盟名。
    #[serde(default)]
    pub consortiums: Option<BTreeMap<String, ConsortiumDefinition>>,
    /// 应用参数。
    #[serde(default)]
    pub application: Option<ApplicationDefinition>,
}

/// 签名策略定义。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyDefinition {
    /// 参与策略的组织。
    pub organizations: Vec<String>,
    /// 所需签名组织数。
    pub threshold: usize,
}

/// 排序服务定义。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrdererDefinition {
    /// 共识类型。
    #[serde(default = "default_consensus_type")]
    pub consensus_type: String,
    /// 出块批次约束。
    pub batch_size: BatchSize,
    /// 出块超时（毫秒）。
    pub batch_timeout_ms: u64,
    /// 排序服务组织。
    #[serde(default)]
    pub organizations: Vec<String>,
}

impl OrdererDefinition {
    /// 出块超时。
    pub fn batch_timeout(&self) -> Duration {
        Duration::from_millis(self.batch_timeout_ms)
    }
}

/// 联盟定义。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsortiumDefinition {
    /// 成员组织。
    pub organizations: Vec<String>,
}

/// 应用定义。
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApplicationDefinition {
    /// 应用组织。
    pub organizations: Vec<String>,
}

impl ChannelDefinition {
    /// 解析 TOML 文本并校验。
    pub fn from_toml_str(text: &str) -> crate::Result<Self> {
        let definition: ChannelDefinition = toml::from_str(text)?;
        definition.validate()?;
        Ok(definition)
    }

    /// 读取 TOML 文件并校验。
    pub fn from_path(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| BundleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// 语义校验。
    ///
    /// # 校验项（What）
    /// - 通道 ID 非空、长度受限、只含小写字母数字与 `.`/`-`，且以字母开头；
    /// - 哈希结构宽度大于 0；
    /// - 组织列表无空值、无重复；策略、排序服务、联盟、应用引用的组织都必须已登记；
    /// - 策略阈值位于 `1..=组织数`；
    /// - 排序服务的批次约束与超时为正，且 `preferred_max_bytes <= absolute_max_bytes`。
    ///
    /// 返回遇到的第一个错误，字段路径写入 [`BundleError::InvalidDefinition::field`]。
    pub fn validate(&self) -> crate::Result<()> {
        validate_channel_id(&self.channel_id)?;

        if self.block_data_hashing_structure_width == 0 {
            return Err(BundleError::invalid(
                "block_data_hashing_structure_width",
                "必须大于 0",
            ));
        }

        let mut declared = BTreeSet::new();
        for org in &self.organizations {
            if org.is_empty() {
                return Err(BundleError::invalid("organizations", "组织 ID 不能为空"));
            }
            if !declared.insert(org.as_str()) {
                return Err(BundleError::invalid(
                    "organizations",
                    format!("组织 `{org}` 重复登记"),
                ));
            }
        }
        let check_declared = |field: String, orgs: &[String]| -> crate::Result<()> {
            match orgs.iter().find(|org| !declared.contains(org.as_str())) {
                Some(org) => Err(BundleError::invalid(field, format!("组织 `{org}` 未登记"))),
                None => Ok(()),
            }
        };

        for (name, policy) in &self.policies {
            check_declared(format!("policies.{name}.organizations"), &policy.organizations)?;
            let distinct: BTreeSet<&str> =
                policy.organizations.iter().map(String::as_str).collect();
            if policy.threshold == 0 || policy.threshold > distinct.len() {
                return Err(BundleError::invalid(
                    format!("policies.{name}.threshold"),
                    format!(
                        "阈值 {} 必须位于 1..={}",
                        policy.threshold,
                        distinct.len()
                    ),
                ));
            }
        }

        if let Some(orderer) = &self.orderer {
            if orderer.consensus_type.is_empty() {
                return Err(BundleError::invalid("orderer.consensus_type", "不能为空"));
            }
            let batch = orderer.batch_size;
            if batch.max_message_count == 0 {
                return Err(BundleError::invalid(
                    "orderer.batch_size.max_message_count",
                    "必须大于 0",
                ));
            }
            if batch.absolute_max_bytes == 0 {
                return Err(BundleError::invalid(
                    "orderer.batch_size.absolute_max_bytes",
                    "必须大于 0",
                ));
            }
            if batch.preferred_max_bytes > batch.absolute_max_bytes {
                return Err(BundleError::invalid(
                    "orderer.batch_size.preferred_max_bytes",
                    format!(
                        "{} 超过 absolute_max_bytes {}",
                        batch.preferred_max_bytes, batch.absolute_max_bytes
                    ),
                ));
            }
            if orderer.batch_timeout_ms == 0 {
                return Err(BundleError::invalid("orderer.batch_timeout_ms", "必须大于 0"));
            }
            check_declared(String::from("orderer.organizations"), &orderer.organizations)?;
        }

        if let Some(consortiums) = &self.consortiums {
            for (name, consortium) in consortiums {
                check_declared(
                    format!("consortiums.{name}.organizations"),
                    &consortium.organizations,
                )?;
            }
        }

        if let Some(application) = &self.application {
            check_declared(
                String::from("application.organizations"),
                &application.organizations,
            )?;
        }

        Ok(())
    }
}

fn validate_channel_id(channel_id: &str) -> crate::Result<()> {
    let mut chars = channel_id.chars();
    let Some(first) = chars.next() else {
        return Err(BundleError::invalid("channel_id", "不能为空"));
    };
    if channel_id.len() > MAX_CHANNEL_ID_LEN {
        return Err(BundleError::invalid(
            "channel_id",
            format!("长度超过 {MAX_CHANNEL_ID_LEN}"),
        ));
    }
    if !first.is_ascii_lowercase() {
        return Err(BundleError::invalid("channel_id", "必须以小写字母开头"));
    }
    if let Some(bad) =
        chars.find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '.' || *c == '-'))
    {
        return Err(BundleError::invalid(
            "channel_id",
            format!("包含非法字符 `{bad}`"),
        ));
    }
    Ok(())
}
