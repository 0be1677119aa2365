//! Computed constants
//!
//! Constants that need code execution are produced by a zero-argument
//! initializer body run by the interpreter. The loader resolves and checks
//! the initializer, then hands the interpreter a request that names the
//! destination slot in the global buffer.

use thiserror::Error;

use crate::vm::gc::Heap;
use crate::vm::globals::{GlobalError, GlobalStore};
use crate::vm::invoke::{InvokeDecl, InvokeTable};
use crate::vm::trap::Trap;
use crate::vm::types::{InvokeId, TypeDescriptor, TypeId, TypeTable};

/// Errors raised while evaluating a constant
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstantError {
    /// The initializer ID has no declaration
    #[error("constant initializer {ikey} is not declared")]
    MissingInvoke {
        /// Initializer ID
        ikey: InvokeId,
    },

    /// The initializer is a primitive
    #[error("constant initializer {name} has no body")]
    NotABody {
        /// Initializer name
        name: String,
    },

    /// The initializer takes arguments
    #[error("constant initializer {name} takes {count} parameters")]
    HasParameters {
        /// Initializer name
        name: String,
        /// Parameter count
        count: usize,
    },

    /// The constant's type has no descriptor
    #[error("constant type {tid} has no descriptor")]
    MissingType {
        /// Declared type
        tid: TypeId,
    },

    /// The destination slot is outside the buffer
    #[error(transparent)]
    Global(#[from] GlobalError),

    /// The initializer trapped
    #[error("constant initializer {name} trapped: {trap}")]
    Trapped {
        /// Initializer name
        name: String,
        /// The trap
        trap: Trap,
    },
}

/// Everything an interpreter needs to run one initializer.
pub struct ConstantRequest<'a> {
    /// Destination offset in the global buffer
    pub offset: u64,
    /// Expected result type
    pub result_type: &'a TypeDescriptor,
    /// The initializer
    pub invoke: &'a InvokeDecl,
    /// The global buffer, including already initialized constants
    pub globals: &'a mut GlobalStore,
    /// Heap for objects the initializer allocates
    pub heap: &'a mut Heap,
}

/// The interpreter side of constant evaluation.
pub trait Initializer {
    /// Run the initializer and store its result at `request.offset`.
    fn run_initializer(&mut self, request: ConstantRequest<'_>) -> Result<(), Trap>;
}

/// Initializer for hosts without an interpreter: every request faults.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInitializer;

impl Initializer for NoInitializer {
    fn run_initializer(&mut self, request: ConstantRequest<'_>) -> Result<(), Trap> {
        Err(Trap::fault(format!(
            "no interpreter available to evaluate {}",
            request.invoke.name
        )))
    }
}

/// A constant left for later evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingConstant {
    /// Destination offset
    pub offset: u64,
    /// Initializer
    pub ikey: InvokeId,
    /// Declared type
    pub tid: TypeId,
}

/// Initializer that records requests and leaves the slots zeroed.
///
/// Used to check an assembly without executing any code.
#[derive(Debug, Clone, Default)]
pub struct DeferredInitializer {
    /// Requests in load order
    pub pending: Vec<PendingConstant>,
}

impl Initializer for DeferredInitializer {
    fn run_initializer(&mut self, request: ConstantRequest<'_>) -> Result<(), Trap> {
        self.pending.push(PendingConstant {
            offset: request.offset,
            ikey: request.invoke.ikey,
            tid: request.result_type.tid,
        });
        Ok(())
    }
}

/// Resolves constant declarations and dispatches them to an [`Initializer`].
pub struct ConstantEvaluator<'a> {
    invokes: &'a InvokeTable,
    types: &'a TypeTable,
    globals: &'a mut GlobalStore,
    heap: &'a mut Heap,
    initializer: &'a mut dyn Initializer,
}

impl<'a> ConstantEvaluator<'a> {
    /// Create an evaluator over the load-time state.
    pub fn new(
        invokes: &'a InvokeTable,
        types: &'a TypeTable,
        globals: &'a mut GlobalStore,
        heap: &'a mut Heap,
        initializer: &'a mut dyn Initializer,
    ) -> Self {
        Self {
            invokes,
            types,
            globals,
            heap,
            initializer,
        }
    }

    /// Evaluate one constant into the global buffer at `offset`.
    pub fn evaluate(
        &mut self,
        offset: u64,
        ikey: InvokeId,
        tid: TypeId,
    ) -> Result<(), ConstantError> {
        let invokes = self.invokes;
        let types = self.types;
        let invoke = invokes
            .get(ikey)
            .ok_or(ConstantError::MissingInvoke { ikey })?;
        if invoke.body().is_none() {
            return Err(ConstantError::NotABody {
                name: invoke.name.clone(),
            });
        }
        if !invoke.params.is_empty() {
            return Err(ConstantError::HasParameters {
                name: invoke.name.clone(),
                count: invoke.params.len(),
            });
        }
        let result_type = types
            .get(tid)
            .ok_or(ConstantError::MissingType { tid })?;
        if invoke.result_type != tid {
            tracing::warn!(
                invoke = %invoke.name,
                declared = %invoke.result_type,
                expected = %tid,
                "initializer result type differs from constant type"
            );
        }
        self.globals
            .read(offset, result_type.size.inlinedatasize as usize)?;

        tracing::debug!(offset, invoke = %invoke.name, tid = %tid, "evaluating constant");
        self.initializer
            .run_initializer(ConstantRequest {
                offset,
                result_type,
                invoke,
                globals: &mut *self.globals,
                heap: &mut *self.heap,
            })
            .map_err(|trap| ConstantError::Trapped {
                name: invoke.name.clone(),
                trap,
            })
    }
}
