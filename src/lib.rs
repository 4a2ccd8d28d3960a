//! # vmgc — a three-region generational, moving garbage collector
//!
//! `vmgc` is the memory manager for an embedded bytecode interpreter's
//! tagged-union value model (`Int`/`Float`/`String`/`Array`/`Dict`/`Func`).
//! It owns allocation and collection only: the lexer, parser, bytecode
//! compiler/interpreter, and any FFI surface built on top of it are
//! external collaborators, not part of this crate.
//!
//! ## Overview
//!
//! Objects pass through three regions as they age:
//!
//! - **Nursery**: a single bump arena. Every small allocation starts here.
//! - **Graduate**: two bump semi-spaces. A young GC copies nursery
//!   survivors here; survivors that outlive `promotion_threshold` young
//!   GCs are promoted to tenure instead of copied again.
//! - **Tenure**: a free-list region, collected by mark-sweep
//!   ([`gc::old`]) with optional slide compaction ([`gc::compact`]) when
//!   fragmentation — not exhaustion — is the problem.
//!
//! Resizable containers (`Array`/`Dict`) never grow in place: growing one
//! allocates a new, larger container and leaves a forwarding pointer
//! (`newer`) on the old one (see [`forwarding`]). A write barrier
//! ([`barrier`]) tracks the one case that threatens the young collector's
//! soundness — a tenured container taking on a reference to a
//! non-tenured object — via the heap's remembered set, so a young GC can
//! find those containers as extra roots without scanning all of tenure.
//!
//! ## Quick start
//!
//! ```rust
//! use vmgc::{GcConfig, Vm};
//!
//! fn main() -> Result<(), vmgc::GcError> {
//!     let mut vm = Vm::new(GcConfig::default())?;
//!     let env = vm.create_env();
//!     vm.env(env)?.push_frame();
//!
//!     let s = vm.make_string(b"hello", 0)?;
//!     vm.set_global("greeting", s);
//!     assert!(vm.check_global("greeting"));
//!
//!     let mut arr = vm.make_empty_array()?;
//!     vm.array_set_elem(&mut arr, 0, s)?;
//!     assert_eq!(vm.array_get_size(arr)?, 1);
//!     Ok(())
//! }
//! ```
//!
//! ## Using `Runtime`
//!
//! [`Runtime`] wraps [`Vm`] with an embedder-visible lifecycle
//! (initialized/running/stopped) and the multi-threaded safepoint
//! coordinator:
//!
//! ```rust
//! use vmgc::{Runtime, GcConfig};
//!
//! fn main() -> Result<(), vmgc::GcError> {
//!     let runtime = Runtime::new(GcConfig::default())?;
//!     runtime.start()?;
//!     // runtime.vm_mut() drives allocation and mutation.
//!     runtime.stop()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`allocator`]: the nursery/graduate bump arena and the tenure free list.
//! - [`barrier`]: write barriers and the remembered set.
//! - [`config`]: `GcConfig` and its validation.
//! - [`error`]: `GcError` and the crate's `Result` alias.
//! - [`forwarding`]: the `newer` forwarding-pointer protocol.
//! - [`gc`]: allocation dispatch and the three collection tiers.
//! - [`heap`]: the three regions and their intrusive live lists.
//! - [`logging`]: the leveled `GcEvent` log.
//! - [`object`]: the object header and `String`/`Array`/`Dict` layouts.
//! - [`roots`]: root enumeration over globals, frames, and pins.
//! - [`runtime`]: per-thread environments, globals, pinning, safepoints.
//! - [`stats`]: cycle counters and the pause-time histogram.
//! - [`value`]: the interpreter's tagged `Value` union.
//! - [`api`]: the external interface (`Vm`), re-exported at the crate root.
//!
//! ## Safety
//!
//! This crate is built on raw pointers into arena-allocated memory and is
//! `unsafe` internally, but its public surface (`Vm`, `Runtime`) is safe:
//!
//! 1. Every allocation or mutation that can trigger a collection takes
//!    the full set of root sources for the call, so a GC never misses a
//!    live reference held by another thread's environment.
//! 2. Container references must go through `array_write_barrier`/
//!    `dict_write_barrier` on every store — skipping the barrier when
//!    writing into a tenured container can lose the reference across a
//!    young GC.
//! 3. A value's address is only valid until the next allocation; this
//!    crate always re-reads a value after a call that could collect
//!    rather than caching stale pointers.

pub mod allocator;
pub mod api;
pub mod barrier;
pub mod config;
pub mod error;
pub mod forwarding;
pub mod gc;
pub mod heap;
pub mod logging;
pub mod object;
pub mod roots;
pub mod runtime;
pub mod stats;
pub mod util;
pub mod value;

pub use api::{EnvHandle, GcHealth, Vm};
pub use config::GcConfig;
pub use error::{GcError, Result};
pub use gc::GarbageCollector;
pub use runtime::{Runtime, RuntimeState};
pub use value::{FuncRef, Value};

/// `vmgc` version string from `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize a [`Runtime`] with default configuration and start it.
pub fn init() -> Result<Runtime> {
    let runtime = Runtime::new(GcConfig::default())?;
    runtime.start()?;
    Ok(runtime)
}

/// Initialize a [`Runtime`] with custom configuration and start it.
pub fn init_with_config(config: GcConfig) -> Result<Runtime> {
    let runtime = Runtime::new(config)?;
    runtime.start()?;
    Ok(runtime)
}
