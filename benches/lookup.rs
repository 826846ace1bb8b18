use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use netban::{ManualClock, NetAddr, NetBan, NetRange};
use rand::Rng;
use std::hint::black_box;
use std::net::Ipv4Addr;

// Fills both pools to capacity so every probe walks realistic chains.

fn full_netban() -> NetBan<ManualClock> {
    let mut rng = rand::thread_rng();
    let mut nb = NetBan::new(ManualClock::new(1_700_000_000));

    while nb.addr_bans().len() < nb.addr_bans().capacity() {
        let addr = NetAddr::from(Ipv4Addr::from(rng.r#gen::<u32>()));
        let _ = nb.ban_addr(&addr, None, "bench");
    }
    while nb.range_bans().len() < nb.range_bans().capacity() {
        let base = rng.r#gen::<u32>() & 0xffff_ff00;
        let range = NetRange::new(
            Ipv4Addr::from(base).into(),
            Ipv4Addr::from(base | 0xff).into(),
        );
        if let Ok(range) = range {
            let _ = nb.ban_range(&range, None, "bench");
        }
    }
    nb
}

fn is_banned_benchmark(c: &mut Criterion) {
    let nb = full_netban();
    let mut group = c.benchmark_group("is_banned");
    group.throughput(Throughput::Elements(1));

    let hit = nb
        .addr_bans()
        .iter()
        .next()
        .map(|(_, ban)| *ban.data())
        .unwrap_or_else(NetAddr::localhost_v4);
    group.bench_function("address_hit", |b| b.iter(|| nb.is_banned(black_box(&hit))));

    let miss: NetAddr = "2001:db8::1".parse().unwrap();
    group.bench_function("v6_miss", |b| b.iter(|| nb.is_banned(black_box(&miss))));

    let mut rng = rand::thread_rng();
    let probes: Vec<NetAddr> = (0..1024)
        .map(|_| NetAddr::from(Ipv4Addr::from(rng.r#gen::<u32>())))
        .collect();
    group.bench_function("random_v4", |b| {
        let mut i = 0;
        b.iter(|| {
            i = (i + 1) % probes.len();
            nb.is_banned(black_box(&probes[i]))
        })
    });

    group.finish();
}

criterion_group!(benches, is_banned_benchmark);
criterion_main!(benches);
