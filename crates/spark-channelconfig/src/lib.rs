#![deny(unsafe_code)]
#![doc = "spark-channelconfig: 通道配置快照（Bundle）的原子发布与稳定读取。"]
#![doc = ""]
#![doc = "== 一致性契约 =="]
#![doc = "1. 写者通过 `BundleSource::update` 整体替换 Bundle，读写均不阻塞。"]
#![doc = "2. 读者在一次逻辑操作开始时调用一次 `BundleSource::stable_bundle`，之后的全部派生查询都在返回的 `StableBundle` 上完成。"]
#![doc = "3. `BundleSource` 上的便捷访问器各自独立读取，连续调用不保证来自同一 Bundle。"]
#![doc = ""]
#![doc = "== Loom 模型 =="]
#![doc = "`RUSTFLAGS=\"--cfg spark_loom\" cargo test -p spark-channelconfig --features loom-model --test loom_bundle_source` 会把原子槽位切换到 Loom 实现并运行模型测试。"]

//! # 模块结构
//! - [`bundle`]：不可变的配置快照 [`Bundle`]；
//! - [`components`]：Bundle 聚合的子组件契约与 [`RootConfig`]；
//! - [`source`]：原子发布点 [`BundleSource`] 与稳定句柄 [`StableBundle`]；
//! - [`definition`]、[`builder`]、[`static_components`]：从配置定义构建 Bundle；
//! - [`reconfigure`]：构建、检查并条件发布新配置的触发方 [`Reconfigurator`]；
//! - [`error`]：统一错误类型 [`BundleError`]。
//!
//! # 示例
//! ```
//! use spark_channelconfig::{
//!     BundleBuilder, BundleSource, ChannelDefinition, DefinitionBundleBuilder,
//! };
//!
//! let definition = ChannelDefinition::from_toml_str(
//!     r#"
//!     channel_id = "mychannel"
//!     sequence = 1
//!     organizations = ["Org1MSP"]
//!     [application]
//!     organizations = ["Org1MSP"]
//!     "#,
//! )?;
//! let source = BundleSource::from_bundle(DefinitionBundleBuilder::new().build(&definition)?);
//!
//! // 一次读取，多次查询：两次查询必然来自同一 Bundle。
//! let bundle = source.stable_bundle();
//! if let Some(application) = bundle.application_config() {
//!     for org in application.organizations() {
//!         assert!(bundle.msp_manager().is_member(org));
//!     }
//! }
//! # Ok::<(), spark_channelconfig::BundleError>(())
//! ```

pub mod builder;
pub mod bundle;
pub mod components;
pub mod definition;
pub mod error;
pub mod reconfigure;
mod slot;
pub mod source;
pub mod static_components;

pub use builder::{BundleBuilder, DefinitionBundleBuilder};
pub use bundle::Bundle;
pub use components::{
    ApplicationConfig, BatchSize, ChannelConfig, ConfigtxManager, ConsortiumsConfig,
    HashingAlgorithm, MspManager, OrdererConfig, PolicyDecision, PolicyManager, RootConfig,
};
pub use definition::{
    ApplicationDefinition, ChannelDefinition, ConsortiumDefinition, OrdererDefinition,
    PolicyDefinition,
};
pub use error::BundleError;
pub use reconfigure::Reconfigurator;
pub use source::{BundleSource, StableBundle};

/// 本 crate 的结果类型别名，错误默认为 [`BundleError`]。
pub type Result<T, E = BundleError> = core::result::Result<T, E>;
