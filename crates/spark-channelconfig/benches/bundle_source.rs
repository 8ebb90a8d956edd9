use std::hint::black_box;
use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};
use spark_channelconfig::{
    Bundle, BundleBuilder, BundleSource, ChannelDefinition, DefinitionBundleBuilder,
};

fn bundle(sequence: u64) -> Arc<Bundle> {
    let definition = ChannelDefinition::from_toml_str(&format!(
        "channel_id = \"bench\"\nsequence = {sequence}\norganizations = [\"Org1MSP\"]\n\
         [application]\norganizations = [\"Org1MSP\"]\n"
    ))
    .expect("基准定义必须合法");
    Arc::new(
        DefinitionBundleBuilder::new()
            .build(&definition)
            .expect("基准定义必须能构建"),
    )
}

/// 读路径与写路径的常数时间基准。
///
/// # 设计目的（Why）
/// - `stable_bundle` 是所有读者的热路径，应保持在一次原子读取加一次引用计数的量级；
/// - `update` 只替换指针，成本不应随 Bundle 大小增长；Bundle 在循环外预先构建。
///
/// # 风险提示（Trade-offs）
/// - 单线程基准不反映读者竞争下的缓存行争用，仅用于发现回归。
fn bench_bundle_source(c: &mut Criterion) {
    let source = BundleSource::new(bundle(0));
    let next = bundle(1);

    c.bench_function("stable_bundle", |b| {
        b.iter(|| black_box(source.stable_bundle()))
    });

    c.bench_function("stable_bundle_then_two_queries", |b| {
        b.iter(|| {
            let handle = source.stable_bundle();
            black_box(handle.application_config().is_some() && handle.sequence() > 0)
        })
    });

    c.bench_function("update", |b| b.iter(|| source.update(Arc::clone(&next))));
}

criterion_group!(channelconfig_benches, bench_bundle_source);
criterion_main!(channelconfig_benches);
