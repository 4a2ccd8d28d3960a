//! Shared fixture for the integration suites: a one-call `Vm` builder with
//! a heap small enough to exercise nursery exhaustion and tenure growth
//! inside ordinary test loops, plus a couple of assertion helpers used
//! across several files.

#![allow(dead_code)]

use vmgc::{EnvHandle, GcConfig, Vm};

pub const SMALL_NURSERY: usize = 4 * 1024;
pub const SMALL_GRADUATE: usize = 4 * 1024;
pub const SMALL_TENURE: usize = 256 * 1024;

/// A `Vm` sized to make a handful of allocations trigger a young GC, with
/// one environment already registered and carrying an active call frame
/// (so pin/root operations in tests don't need to set that up themselves).
pub struct VmFixture {
    pub vm: Vm,
    pub env: EnvHandle,
}

impl VmFixture {
    pub fn small() -> Self {
        Self::with_config(GcConfig {
            nursery_size: SMALL_NURSERY,
            graduate_size: SMALL_GRADUATE,
            tenure_size: SMALL_TENURE,
            lop_threshold: 512,
            ..GcConfig::default()
        })
    }

    pub fn with_config(config: GcConfig) -> Self {
        let mut vm = Vm::new(config).expect("vm construction with a valid config must succeed");
        let env = vm.create_env();
        vm.env(env).unwrap().push_frame();
        Self { vm, env }
    }
}

/// Every value in `values` differs pairwise by its header pointer, for
/// heap-referencing `Value` variants.
pub fn assert_all_headers_distinct(values: &[vmgc::Value]) {
    for i in 0..values.len() {
        for j in (i + 1)..values.len() {
            assert_ne!(
                values[i].header_ptr(),
                values[j].header_ptr(),
                "values at index {i} and {j} share a header pointer"
            );
        }
    }
}
