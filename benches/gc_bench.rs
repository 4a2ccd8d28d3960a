//! Broader scenario benchmarks: sustained allocation throughput under a
//! fixture small enough to force repeated young GCs, and full-cycle cost
//! under deliberate tenure pressure.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use vmgc::{GcConfig, Value, Vm};

fn churn_config() -> GcConfig {
    GcConfig {
        nursery_size: 64 * 1024,
        graduate_size: 64 * 1024,
        tenure_size: 4 * 1024 * 1024,
        lop_threshold: 2048,
        ..GcConfig::default()
    }
}

fn bench_sustained_array_allocation(c: &mut Criterion) {
    let mut group = c.benchmark_group("sustained_allocation");
    group.throughput(Throughput::Elements(1));
    group.bench_function("array_under_nursery_pressure", |b| {
        let mut vm = Vm::new(churn_config()).unwrap();
        b.iter(|| black_box(vm.make_empty_array().unwrap()))
    });
    group.finish();
}

fn bench_dict_growth_under_pressure(c: &mut Criterion) {
    c.bench_function("dict_growth_200_keys", |b| {
        b.iter_batched(
            || Vm::new(churn_config()).unwrap(),
            |mut vm| {
                let mut dict = vm.make_empty_dict().unwrap();
                for i in 0..200u32 {
                    let key = format!("key-{i}");
                    vm.dict_set_elem(&mut dict, key.as_bytes(), Value::Int(i as i64)).unwrap();
                }
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

fn bench_rooted_string_survives_many_young_gcs(c: &mut Criterion) {
    c.bench_function("rooted_string_through_2000_allocations", |b| {
        b.iter_batched(
            || {
                let mut vm = Vm::new(churn_config()).unwrap();
                let s = vm.make_string(b"long-lived", 0).unwrap();
                vm.set_global("root", s);
                vm
            },
            |mut vm| {
                for _ in 0..2000 {
                    vm.make_empty_array().unwrap();
                }
                black_box(vm.get_global("root").unwrap());
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    bench_sustained_array_allocation,
    bench_dict_growth_under_pressure,
    bench_rooted_string_survives_many_young_gcs
);
criterion_main!(benches);
