//! End-to-end scenarios exercising the full allocation → collection →
//! (optional) compaction pipeline together, rather than one mechanism in
//! isolation.

mod common;

use common::VmFixture;
use vmgc::{GcConfig, Value};

#[test]
fn a_call_frame_of_temporaries_and_pins_survives_a_full_gc_cycle() {
    let mut f = VmFixture::small();
    let temp = f.vm.make_string(b"temp", 0).unwrap();
    {
        let env = f.vm.env(f.env).unwrap();
        env.current_frame().unwrap().push_temporary(temp).unwrap();
    }
    let pinned = f.vm.make_string(b"pin", 0).unwrap();
    f.vm.pin_local(f.env, pinned).unwrap();

    for _ in 0..3000 {
        f.vm.make_empty_array().unwrap();
    }

    let env = f.vm.env(f.env).unwrap();
    let roots: Vec<Value> = env.current_frame().unwrap().roots().collect();
    assert_eq!(roots.len(), 2);
}

#[test]
fn dict_of_arrays_of_strings_round_trips_through_several_gcs() {
    let mut f = VmFixture::small();
    let mut dict = f.vm.make_empty_dict().unwrap();
    for i in 0..16u32 {
        let s = f.vm.make_string(format!("value-{i}").as_bytes(), 0).unwrap();
        let mut arr = f.vm.make_empty_array().unwrap();
        f.vm.array_set_elem(&mut arr, 0, s).unwrap();
        let key = format!("k{i}");
        f.vm.dict_set_elem(&mut dict, key.as_bytes(), arr).unwrap();
    }
    f.vm.set_global("root", dict);

    for _ in 0..3000 {
        f.vm.make_empty_array().unwrap();
    }

    let rooted = f.vm.get_global("root").unwrap();
    for i in 0..16u32 {
        let key = format!("k{i}");
        let arr = f.vm.dict_get_elem(rooted, key.as_bytes()).unwrap();
        let s = f.vm.array_get_elem(arr, 0).unwrap();
        match s {
            Value::Str(h) => unsafe {
                assert_eq!(
                    vmgc::object::StringObj::as_bytes(h as *mut _),
                    format!("value-{i}").as_bytes()
                );
            },
            other => panic!("expected a string, got {other:?}"),
        }
    }
}

#[test]
fn large_object_allocation_triggers_old_gc_and_then_compaction_under_pressure() {
    let mut f = VmFixture::with_config(GcConfig {
        nursery_size: 4096,
        graduate_size: 4096,
        tenure_size: 64 * 1024,
        lop_threshold: 256,
        ..GcConfig::default()
    });

    // Fill tenure with unrooted large strings, forcing old GC (and
    // eventually compaction) to reclaim space for later allocations.
    for _ in 0..200 {
        let data = vec![b'y'; 300];
        let _ = f.vm.make_string(&data, 0);
    }
    assert!(f.vm.gc().stats().total_cycles() >= 1);
}

#[test]
fn array_and_dict_shallow_copies_are_independent() {
    let mut f = VmFixture::small();
    let mut arr = f.vm.make_empty_array().unwrap();
    f.vm.array_set_elem(&mut arr, 0, Value::Int(1)).unwrap();
    let arr_copy = f.vm.array_shallow_copy(arr).unwrap();

    let mut dict = f.vm.make_empty_dict().unwrap();
    f.vm.dict_set_elem(&mut dict, b"k", Value::Int(1)).unwrap();
    let dict_copy = f.vm.dict_shallow_copy(dict).unwrap();

    f.vm.array_set_elem(&mut arr, 0, Value::Int(99)).unwrap();
    f.vm.dict_set_elem(&mut dict, b"k", Value::Int(99)).unwrap();

    assert_eq!(f.vm.array_get_elem(arr_copy, 0).unwrap(), Value::Int(1));
    assert_eq!(f.vm.dict_get_elem(dict_copy, b"k").unwrap(), Value::Int(1));
}
