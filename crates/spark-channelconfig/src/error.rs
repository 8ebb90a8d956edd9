//! 通道配置 Bundle 相关的错误类型。
//!
//! # 设计背景（Why）
//! - `BundleSource` 的稳态读路径没有任何错误分支：槽位自构造起始终持有完整 Bundle；
//! - 失败只会出现在“边界”上：构造/更新时缺少 Bundle、配置定义无法加载或校验、
//!   重配置触发方提交了过期或冲突的候选 Bundle；
//! - 统一收敛为 [`BundleError`]，调用方可以直接 `?` 传播，也可以按变体分支处理。
//!
//! # 契约说明（What）
//! - 所有变体均实现 [`std::error::Error`]，底层 IO/解析错误通过 `source()` 暴露；
//! - 错误一律“立即返回”，本 crate 内部不做重试，候选配置的重试策略由外部触发方决定。

use std::path::PathBuf;

use thiserror::Error;

/// 本 crate 的统一错误类型。
#[derive(Debug, Error)]
pub enum BundleError {
    /// 构造或更新 `BundleSource` 时未提供 Bundle。
    ///
    /// `operation` 标识触发位置（如 `"BundleSource::try_new"`），便于日志定位。
    #[error("{operation} 需要一个完整的 Bundle，但调用方未提供")]
    MissingBundle {
        /// 触发错误的操作名。
        operation: &'static str,
    },

    /// 读取配置定义文件失败。
    #[error("读取通道配置定义 `{}` 失败: {source}", .path.display())]
    Io {
        /// 定义文件路径。
        path: PathBuf,
        /// 底层 IO 错误。
        source: std::io::Error,
    },

    /// 配置定义不是合法的 TOML 或字段类型不匹配。
    #[error("解析通道配置定义失败: {source}")]
    Parse {
        /// `toml` 反序列化错误。
        #[from]
        source: toml::de::Error,
    },

    /// 配置定义语法合法，但违反了语义约束。
    #[error("通道配置定义字段 `{field}` 非法: {reason}")]
    InvalidDefinition {
        /// 出错字段的路径，例如 `orderer.batch_size.max_message_count`。
        field: String,
        /// 人类可读的原因。
        reason: String,
    },

    /// 候选 Bundle 的序号没有超过当前生效的序号。
    #[error("候选配置序号 {proposed} 不大于当前序号 {current}")]
    StaleSequence {
        /// 当前生效 Bundle 的序号。
        current: u64,
        /// 候选 Bundle 的序号。
        proposed: u64,
    },

    /// 候选 Bundle 属于另一个通道。
    #[error("候选配置属于通道 `{proposed}`，当前通道为 `{current}`")]
    ChannelMismatch {
        /// 当前通道 ID。
        current: String,
        /// 候选配置声明的通道 ID。
        proposed: String,
    },

    /// 构建候选 Bundle 期间，槽位已被其他写者替换。
    #[error("构建候选配置期间当前 Bundle 已被并发替换")]
    ConcurrentUpdate,
}

impl BundleError {
    /// 便捷构造 [`BundleError::InvalidDefinition`]。
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        BundleError::InvalidDefinition {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
