#![doc = include_str!("../../../README.md")]

mod cycle;
mod descriptor;
mod evaluator;
mod exception;
mod function;
mod runtime;
pub mod tracer;
pub mod types;
mod value;

pub use crate::{
    descriptor::{Descriptor, lookup as lookup_descriptor, names as descriptor_names},
    evaluator::{CallObserver, EvalRequest, Evaluator, NoopObserver},
    exception::{ExcType, RunError, RunResult, SimpleException},
    function::{FunctionRef, MODULE_NAME_KEY},
    runtime::Runtime,
    tracer::{FunctionTracer, NoopTracer, ProfilingReport, ProfilingTracer, RecordingTracer, StderrTracer, TraceEvent},
    types::{BoundMethod, Cell, Code, Dict, StringDict, Type, WeakFunctionRef},
    value::{Tuple, Value},
};
