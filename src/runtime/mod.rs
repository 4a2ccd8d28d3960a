//! Runtime orchestration: ties [`crate::api::Vm`] (the operations surface)
//! to the safepoint coordinator and the embedder-visible lifecycle
//! (initialized/running/stopped), mirroring the teacher's
//! `RuntimeInitializer`/`Runtime` split.

pub mod frame;
pub mod globals;
pub mod init;
pub mod pin;
pub mod safepoint;

pub use init::RuntimeInitializer;
pub use safepoint::SafepointManager;

use crate::api::Vm;
use crate::config::GcConfig;
use crate::error::Result;
use std::sync::Mutex;

pub struct Runtime {
    vm: Vm,
    state: Mutex<RuntimeState>,
}

impl Runtime {
    pub fn new(config: GcConfig) -> Result<Self> {
        Ok(Self {
            vm: Vm::new(config)?,
            state: Mutex::new(RuntimeState::Initialized),
        })
    }

    pub fn start(&self) -> Result<()> {
        *self.state.lock().unwrap() = RuntimeState::Running;
        self.safepoint_manager().start()?;
        Ok(())
    }

    pub fn stop(&self) -> Result<()> {
        *self.state.lock().unwrap() = RuntimeState::Stopping;
        self.safepoint_manager().stop()?;
        *self.state.lock().unwrap() = RuntimeState::Stopped;
        Ok(())
    }

    pub fn vm(&self) -> &Vm {
        &self.vm
    }

    pub fn vm_mut(&mut self) -> &mut Vm {
        &mut self.vm
    }

    /// The safepoint coordinator backing this runtime's GC. Owned by
    /// `GarbageCollector` (its collection-trigger points need direct
    /// access to it) rather than by `Runtime`, so this is a passthrough —
    /// there is exactly one coordinator per runtime, not two.
    pub fn safepoint_manager(&self) -> &SafepointManager {
        self.vm.gc().safepoint()
    }

    pub fn state(&self) -> RuntimeState {
        *self.state.lock().unwrap()
    }
}

/// Lifecycle state of a [`Runtime`]; not part of the GC's own state
/// machine, just bookkeeping for embedders that call `start`/`stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeState {
    Initialized,
    Running,
    Stopping,
    Stopped,
}
