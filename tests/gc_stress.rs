//! High allocation volume and long-running loops: the fixture heap is
//! small enough that these tests drive many young GCs (and, with a large
//! enough count, old/compaction cycles) per run.

mod common;

use common::VmFixture;
use vmgc::Value;

#[test]
fn tens_of_thousands_of_short_lived_allocations_never_fail() {
    let mut f = VmFixture::small();
    for i in 0..20_000u32 {
        let arr = f.vm.make_empty_array().unwrap();
        let _ = f.vm.array_get_size(arr).unwrap();
        let _ = i;
    }
    assert!(f.vm.gc().stats().total_cycles() >= 1);
}

#[test]
fn a_growing_dict_under_sustained_churn_keeps_every_live_key_correct() {
    let mut f = VmFixture::small();
    let mut dict = f.vm.make_empty_dict().unwrap();
    for i in 0..5000u32 {
        let key = format!("k{}", i % 500);
        f.vm.dict_set_elem(&mut dict, key.as_bytes(), Value::Int(i as i64)).unwrap();
    }
    for i in 0..500u32 {
        let key = format!("k{i}");
        assert!(f.vm.dict_has_key(dict, key.as_bytes()).unwrap());
    }
}

#[test]
fn a_long_lived_array_chain_survives_thousands_of_young_gcs() {
    let mut f = VmFixture::small();
    let mut head = f.vm.make_empty_array().unwrap();
    f.vm.array_set_elem(&mut head, 0, Value::Int(0)).unwrap();
    f.vm.set_global("head", head);

    for round in 0..10_000u32 {
        let mut rooted = f.vm.get_global("head").unwrap();
        f.vm.array_set_elem(&mut rooted, 0, Value::Int(round as i64)).unwrap();
        f.vm.set_global("head", rooted);
        if round % 1000 == 0 {
            f.vm.make_empty_array().unwrap();
        }
    }

    let rooted = f.vm.get_global("head").unwrap();
    assert_eq!(f.vm.array_get_size(rooted).unwrap(), 1);
}

#[test]
fn repeated_string_interning_style_allocation_does_not_corrupt_the_heap() {
    let mut f = VmFixture::small();
    for i in 0..10_000u32 {
        let data = format!("str-{i}");
        let s = f.vm.make_string(data.as_bytes(), 0).unwrap();
        match s {
            Value::Str(h) => unsafe {
                assert_eq!(vmgc::object::StringObj::as_bytes(h as *mut _), data.as_bytes());
            },
            other => panic!("expected a string, got {other:?}"),
        }
    }
}
