//! Deterministic compiler for tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{Compile, CompileError, CompiledOutput, Toolchain, Unit};

/// Marker that makes [`Passthrough`] fail.
pub const SYNTAX_ERROR: &str = "SYNTAX ERROR";

/// Echoes its input, so artifacts show exactly what the resolver produced.
#[derive(Debug, Default)]
pub struct Passthrough {
    calls: AtomicUsize,
}

impl Passthrough {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Toolchain using one shared instance for both kinds.
    pub fn toolchain() -> (Arc<Self>, Toolchain) {
        let pass = Arc::new(Self::default());
        (pass.clone(), Toolchain::new(pass.clone(), pass))
    }
}

impl Compile for Passthrough {
    fn compile(&self, unit: &Unit<'_>) -> Result<CompiledOutput, CompileError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if unit.source.contains(SYNTAX_ERROR) {
            return Err(CompileError::syntax(unit, "unexpected token"));
        }
        Ok(CompiledOutput {
            code: unit.source.to_string(),
            map: format!("{{\"version\":3,\"sources\":[\"{}\"]}}", unit.filename),
            loaded: Vec::new(),
        })
    }
}
