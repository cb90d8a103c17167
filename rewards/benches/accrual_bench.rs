use criterion::{black_box, criterion_group, criterion_main, Criterion};

use stakeclaim_rewards::accrue;
use stakeclaim_store::StakeAsset;
use stakeclaim_types::{AssetId, Timestamp};

fn bench_accrue(c: &mut Criterion) {
    let asset = StakeAsset {
        asset_id: AssetId::new("p.01"),
        project: "proj".into(),
        name: "Asset".into(),
        image: String::new(),
        active: true,
        last_claim: Timestamp::new(1_600_000_000),
        reward_amount_per_day: 1_000_000,
        maximum_reward: Some(90_000_000),
        reward: AssetId::new("r.00"),
        total_claims: 0,
        total_claimed_amount: 0,
    };
    let now = Timestamp::new(1_700_000_000);

    c.bench_function("accrue", |b| {
        b.iter(|| black_box(accrue(black_box(&asset), black_box(now))))
    });
}

criterion_group!(benches, bench_accrue);
criterion_main!(benches);
