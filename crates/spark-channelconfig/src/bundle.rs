use std::fmt;
use std::sync::Arc;

use crate::components::{
    ApplicationConfig, ChannelConfig, ConfigtxManager, ConsortiumsConfig, MspManager,
    OrdererConfig, PolicyManager, RootConfig,
};

/// `Bundle` 是一次通道配置构建的不可变产物。
///
/// # 设计动机（Why）
/// - 策略、成员、通道参数与配置交易管理器必须来自**同一次**构建，否则读者可能拼出从未存在过的
///   配置组合；Bundle 把它们绑定为一个值，整体发布、整体替换；
/// - 发布后由 `Arc<Bundle>` 共享所有权，旧 Bundle 在最后一个持有者释放时回收。
///
/// # 契约（What）
/// - 字段全部私有且无可变访问器，构造后不可修改；
/// - 每个访问器都直接返回构造时写入的引用，不做惰性计算。
pub struct Bundle {
    policy_manager: Arc<dyn PolicyManager>,
    msp_manager: Arc<dyn MspManager>,
    root_config: RootConfig,
    configtx_manager: Arc<dyn ConfigtxManager>,
}

impl Bundle {
    /// 由外部构建方组装 Bundle。
    pub fn new(
        policy_manager: Arc<dyn PolicyManager>,
        msp_manager: Arc<dyn MspManager>,
        root_config: RootConfig,
        configtx_manager: Arc<dyn ConfigtxManager>,
    ) -> Self {
        Self {
            policy_manager,
            msp_manager,
            root_config,
            configtx_manager,
        }
    }

    /// 策略管理器。
    pub fn policy_manager(&self) -> &Arc<dyn PolicyManager> {
        &self.policy_manager
    }

    /// MSP 管理器。
    pub fn msp_manager(&self) -> &Arc<dyn MspManager> {
        &self.msp_manager
    }

    /// 根配置。
    pub fn root_config(&self) -> &RootConfig {
        &self.root_config
    }

    /// 通道通用参数。
    pub fn channel_config(&self) -> &Arc<dyn ChannelConfig> {
        self.root_config.channel()
    }

    /// 排序服务视图；非排序相关通道返回 `None`。
    pub fn orderer_config(&self) -> Option<&Arc<dyn OrdererConfig>> {
        self.root_config.orderer()
    }

    /// 联盟视图；非系统通道返回 `None`。
    pub fn consortiums_config(&self) -> Option<&Arc<dyn ConsortiumsConfig>> {
        self.root_config.consortiums()
    }

    /// 应用视图；非应用通道返回 `None`。
    pub fn application_config(&self) -> Option<&Arc<dyn ApplicationConfig>> {
        self.root_config.application()
    }

    /// 配置交易管理器。
    pub fn configtx_manager(&self) -> &Arc<dyn ConfigtxManager> {
        &self.configtx_manager
    }

    /// 通道 ID，取自配置交易管理器。
    pub fn channel_id(&self) -> &str {
        self.configtx_manager.channel_id()
    }

    /// 配置序号，取自配置交易管理器。
    pub fn sequence(&self) -> u64 {
        self.configtx_manager.sequence()
    }
}

impl fmt::Debug for Bundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bundle")
            .field("channel_id", &self.channel_id())
            .field("sequence", &self.sequence())
            .field("root_config", &self.root_config)
            .finish_non_exhaustive()
    }
}
