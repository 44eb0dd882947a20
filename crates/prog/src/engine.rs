//! Prog engine entry points
//!
//! [`ProgEngine`] owns the frozen function registry and the execution
//! limits. Hosts compile through it once per prog and invoke the resulting
//! [`CompiledProgram`] as often as they like.

use crate::compiler::{StatementCompiler, DEFAULT_MAX_NESTING};
use crate::error::{CompileError, RuntimeFault};
use crate::program::{CompiledProgram, ProgParameter};
use crate::registry::{FunctionRegistry, HelpEntry};
use crate::runtime::{CancelToken, ExecContext};
use crate::types::ProgType;
use crate::value::Value;
use crate::world::World;
use mud_config::ProgConfig;
use std::sync::Arc;

/// Limits applied to every compile and invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Execution steps per invocation, `None` for unlimited
    pub max_steps: Option<u64>,
    pub max_nesting: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_steps: Some(100_000),
            max_nesting: DEFAULT_MAX_NESTING,
        }
    }
}

impl From<&ProgConfig> for EngineOptions {
    fn from(config: &ProgConfig) -> Self {
        Self {
            max_steps: config.step_budget(),
            max_nesting: config.max_nesting,
        }
    }
}

/// Compiles and runs progs against one function registry
#[derive(Debug, Clone)]
pub struct ProgEngine {
    registry: Arc<FunctionRegistry>,
    options: EngineOptions,
}

impl ProgEngine {
    pub fn new(registry: FunctionRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            options: EngineOptions::default(),
        }
    }

    /// Engine with the standard library registered
    pub fn standard() -> Self {
        Self::new(FunctionRegistry::standard())
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    /// Compile prog source into an executable tree
    ///
    /// The first problem found aborts the compile; no partial program is
    /// ever returned.
    pub fn compile(
        &self,
        source: &str,
        return_type: ProgType,
        parameters: &[ProgParameter],
    ) -> Result<CompiledProgram, CompileError> {
        let statements = StatementCompiler::new(&self.registry, return_type)
            .with_max_nesting(self.options.max_nesting)
            .compile_program(source, parameters)?;

        tracing::debug!(
            "Compiled prog returning {} with {} parameters into {} statements",
            return_type,
            parameters.len(),
            statements.len()
        );

        Ok(CompiledProgram::new(return_type, parameters.to_vec(), statements))
    }

    /// Run a compiled prog under the engine's step budget
    pub fn invoke(&self, program: &CompiledProgram, world: &dyn World, args: &[Value]) -> Result<Value, RuntimeFault> {
        self.invoke_with(program, world, args, None)
    }

    /// Run a compiled prog that the host may cancel from another thread
    pub fn invoke_with(
        &self,
        program: &CompiledProgram,
        world: &dyn World,
        args: &[Value],
        cancel: Option<CancelToken>,
    ) -> Result<Value, RuntimeFault> {
        let mut ctx = ExecContext::new(world).with_step_budget(self.options.max_steps);
        if let Some(token) = cancel {
            ctx = ctx.with_cancel_token(token);
        }

        let result = program.invoke(&mut ctx, args);
        match &result {
            Ok(value) => tracing::debug!("Prog finished after {} steps with {}", ctx.steps(), value),
            Err(fault) => tracing::debug!("Prog faulted after {} steps: {}", ctx.steps(), fault),
        }
        result
    }

    /// Help entries for every overload of a function
    pub fn describe_signatures(&self, name: &str) -> Vec<HelpEntry> {
        self.registry.describe_signatures(name)
    }
}
