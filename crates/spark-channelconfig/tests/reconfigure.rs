//! 重配置触发方的端到端测试：TOML 定义 → 构建 → 检查 → 条件发布。
//!
//! - **Why**：候选配置被拒绝时，当前 Bundle 必须保持生效，且拒绝原因要进入日志；
//! - **How**：用 [`Reconfigurator`] 驱动 [`DefinitionBundleBuilder`]，通过 `#[traced_test]` 捕获日志；
//! - **What**：覆盖正常升级、过期序号、通道不一致、非法定义、并发写者冲突与文件加载。

#![cfg(not(all(feature = "loom-model", any(loom, spark_loom))))]

use std::sync::Arc;

use spark_channelconfig::{
    BundleBuilder, BundleError, ChannelDefinition, DefinitionBundleBuilder, PolicyDecision,
    Reconfigurator,
};
use tracing_test::traced_test;

fn definition(channel_id: &str, sequence: u64, with_orderer: bool) -> ChannelDefinition {
    let mut text = format!(
        r#"
channel_id = "{channel_id}"
sequence = {sequence}
organizations = ["OrdererMSP", "Org1MSP", "Org2MSP"]

[policies.Writers]
organizations = ["Org1MSP", "Org2MSP"]
threshold = 1

[application]
organizations = ["Org1MSP", "Org2MSP"]
"#
    );
    if with_orderer {
        text.push_str(
            r#"
[orderer]
consensus_type = "etcdraft"
batch_timeout_ms = 2000
organizations = ["OrdererMSP"]
batch_size = { max_message_count = 500, absolute_max_bytes = 10485760, preferred_max_bytes = 2097152 }
"#,
        );
    }
    ChannelDefinition::from_toml_str(&text).expect("测试定义必须合法")
}

fn bootstrap(sequence: u64) -> Reconfigurator<DefinitionBundleBuilder> {
    Reconfigurator::bootstrap(
        DefinitionBundleBuilder::new(),
        &definition("mychannel", sequence, true),
    )
    .expect("初始定义必须能构建")
}

#[traced_test]
#[test]
fn newer_definition_is_published() {
    let reconfigurator = bootstrap(1);
    let source = reconfigurator.source().clone();
    let before = source.stable_bundle();
    assert!(before.orderer_config().is_some());

    let published = reconfigurator
        .apply(&definition("mychannel", 2, false))
        .expect("序号递增的定义应被发布");

    assert!(published.same_bundle(&source.stable_bundle()));
    assert_eq!(source.configtx_manager().sequence(), 2);
    assert!(source.orderer_config().is_none());
    // 旧句柄保持原样。
    assert_eq!(before.sequence(), 1);
    assert!(before.orderer_config().is_some());
    assert!(logs_contain("channel config updated"));
}

#[traced_test]
#[test]
fn stale_sequence_is_rejected_and_logged() {
    let reconfigurator = bootstrap(5);
    let before = reconfigurator.source().stable_bundle();

    let err = reconfigurator
        .apply(&definition("mychannel", 3, true))
        .unwrap_err();

    assert!(matches!(
        err,
        BundleError::StaleSequence {
            current: 5,
            proposed: 3
        }
    ));
    assert!(reconfigurator.source().stable_bundle().same_bundle(&before));
    assert!(logs_contain("channel config update rejected"));
}

#[test]
fn channel_mismatch_is_rejected() {
    let reconfigurator = bootstrap(1);
    let err = reconfigurator
        .apply(&definition("otherchannel", 2, true))
        .unwrap_err();
    assert!(matches!(err, BundleError::ChannelMismatch { .. }));
    assert_eq!(reconfigurator.source().stable_bundle().channel_id(), "mychannel");
}

#[test]
fn invalid_candidate_never_reaches_the_source() {
    let reconfigurator = bootstrap(1);
    let mut candidate = definition("mychannel", 2, true);
    candidate
        .policies
        .get_mut("Writers")
        .expect("测试定义包含 Writers 策略")
        .threshold = 0;

    let err = reconfigurator.apply(&candidate).unwrap_err();
    assert!(matches!(err, BundleError::InvalidDefinition { .. }));
    assert_eq!(reconfigurator.source().stable_bundle().sequence(), 1);
}

/// 构建期间另一个写者抢先发布：CAS 失败，抢先者的 Bundle 保留。
#[test]
fn concurrent_writer_wins_over_slow_candidate() {
    struct InterleavingBuilder {
        inner: DefinitionBundleBuilder,
        racer: std::sync::Mutex<Option<Box<dyn FnOnce() + Send>>>,
    }

    impl BundleBuilder for InterleavingBuilder {
        type Definition = ChannelDefinition;

        fn build(
            &self,
            definition: &ChannelDefinition,
        ) -> spark_channelconfig::Result<spark_channelconfig::Bundle> {
            if let Some(race) = self.racer.lock().unwrap().take() {
                race();
            }
            self.inner.build(definition)
        }
    }

    let initial = DefinitionBundleBuilder::new()
        .build(&definition("mychannel", 1, true))
        .unwrap();
    let source = spark_channelconfig::BundleSource::from_bundle(initial);
    let racer_source = source.clone();
    let racer_bundle = Arc::new(
        DefinitionBundleBuilder::new()
            .build(&definition("mychannel", 9, false))
            .unwrap(),
    );
    let racer_copy = Arc::clone(&racer_bundle);
    let builder = InterleavingBuilder {
        inner: DefinitionBundleBuilder::new(),
        racer: std::sync::Mutex::new(Some(Box::new(move || racer_source.update(racer_copy)))),
    };
    let reconfigurator = Reconfigurator::new(source.clone(), builder);

    let err = reconfigurator
        .apply(&definition("mychannel", 2, true))
        .unwrap_err();

    assert!(matches!(err, BundleError::ConcurrentUpdate));
    assert!(Arc::ptr_eq(&source.stable_bundle().into_inner(), &racer_bundle));
}

#[test]
fn policies_from_definition_are_evaluated_on_the_handle() {
    let reconfigurator = bootstrap(1);
    let bundle = reconfigurator.source().stable_bundle();
    let policies = bundle.policy_manager();

    assert!(policies.evaluate("Writers", &["Org2MSP"]).is_granted());
    assert_eq!(
        policies.evaluate("Writers", &["OrdererMSP"]),
        PolicyDecision::Denied {
            satisfied: 0,
            required: 1
        }
    );
    // 应用组织必须都是通道成员：同一句柄上的两次查询来自同一 Bundle。
    let application = bundle.application_config().expect("应用通道应有应用视图");
    assert!(
        application
            .organizations()
            .iter()
            .all(|org| bundle.msp_manager().is_member(org))
    );
}

#[test]
fn definition_loads_from_file() {
    let path = std::env::temp_dir().join(format!(
        "spark-channelconfig-{}-definition.toml",
        std::process::id()
    ));
    std::fs::write(
        &path,
        "channel_id = \"filechannel\"\nsequence = 4\norganizations = [\"Org1MSP\"]\n",
    )
    .unwrap();

    let loaded = ChannelDefinition::from_path(&path);
    std::fs::remove_file(&path).ok();

    let definition = loaded.unwrap();
    let reconfigurator =
        Reconfigurator::bootstrap(DefinitionBundleBuilder::new(), &definition).unwrap();
    let bundle = reconfigurator.source().stable_bundle();
    assert_eq!(bundle.channel_id(), "filechannel");
    assert_eq!(bundle.sequence(), 4);
    assert!(bundle.orderer_config().is_none());
    assert!(bundle.consortiums_config().is_none());
    assert!(bundle.application_config().is_none());
}
