//! Function-object tracing infrastructure.
//!
//! Provides a trait-based tracing system for function creation, calls, attribute
//! writes and binding. When using [`NoopTracer`], all trace methods compile away
//! entirely via monomorphization.
//!
//! | Tracer | Purpose |
//! |--------|---------|
//! | [`NoopTracer`] | Zero-cost no-op (production default) |
//! | [`StderrTracer`] | Human-readable event log to stderr |
//! | [`ProfilingTracer`] | Per-function call counts, call depth, failed assignments |
//! | [`RecordingTracer`] | Full event recording for post-mortem analysis |
//!
//! # Usage
//!
//! The runtime is parameterized as `Runtime<E: Evaluator, Tr: FunctionTracer>`.
//! Callers choose the tracer at construction time:
//!
//! ```ignore
//! // Production (zero overhead):
//! let mut rt = Runtime::new(evaluator);
//!
//! // Debugging:
//! let mut rt = Runtime::with_tracer(evaluator, StderrTracer::new());
//!
//! // Profiling:
//! let mut rt = Runtime::with_tracer(evaluator, ProfilingTracer::new());
//! // ... run ...
//! let report = rt.tracer().report();
//! ```

use ahash::AHashMap;

/// Trace event emitted by the runtime.
///
/// Used by [`RecordingTracer`] to capture a full trace.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TraceEvent {
    /// A function object was created.
    MakeFunction {
        /// The new function's `__qualname__`.
        name: String,
        /// Number of captured closure cells (0 for plain functions).
        cell_count: usize,
        /// Number of positional default values.
        defaults_count: usize,
    },
    /// A function call is about to be handed to the evaluator.
    Call {
        /// The callee's `__qualname__`.
        func_name: String,
        /// Call depth after entering.
        depth: usize,
    },
    /// The evaluator returned.
    Return {
        /// Call depth after leaving.
        depth: usize,
        /// Whether the call returned a value rather than an error.
        ok: bool,
    },
    /// An attribute assignment was attempted.
    AttrSet {
        attr: String,
        ok: bool,
    },
    /// An attribute deletion was attempted.
    AttrDelete {
        attr: String,
        ok: bool,
    },
    /// A function was read through an owner (`__get__`).
    Bind {
        /// True when a bound method was produced, false when the function was returned as-is.
        bound: bool,
    },
}

/// Trait for function-object tracing.
///
/// All methods have default no-op implementations, so [`NoopTracer`] requires
/// zero lines of code and compiles to zero instructions. Implementations only
/// override the hooks they care about.
pub trait FunctionTracer: std::fmt::Debug {
    /// Called when a function object is created.
    ///
    /// # Arguments
    /// * `name` - The function's `__qualname__`
    /// * `cell_count` - Number of captured closure cells
    /// * `defaults_count` - Number of positional default values
    #[inline(always)]
    fn on_make_function(&mut self, _name: &str, _cell_count: usize, _defaults_count: usize) {}

    /// Called right before a call is handed to the evaluator.
    ///
    /// # Arguments
    /// * `func_name` - The callee's `__qualname__`
    /// * `depth` - Call depth after entering
    #[inline(always)]
    fn on_call(&mut self, _func_name: &str, _depth: usize) {}

    /// Called when the evaluator returns, successfully or not.
    #[inline(always)]
    fn on_return(&mut self, _depth: usize, _ok: bool) {}

    /// Called after an attribute assignment, with whether it was accepted.
    #[inline(always)]
    fn on_attr_set(&mut self, _attr: &str, _ok: bool) {}

    /// Called after an attribute deletion, with whether it was accepted.
    #[inline(always)]
    fn on_attr_delete(&mut self, _attr: &str, _ok: bool) {}

    /// Called when a function is read through an owner.
    #[inline(always)]
    fn on_bind(&mut self, _bound: bool) {}
}

// ============================================================================
// NoopTracer: zero-cost production default
// ============================================================================

/// A tracer that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl FunctionTracer for NoopTracer {}

// ============================================================================
// StderrTracer: human-readable event log
// ============================================================================

/// Tracer that prints a human-readable event log to stderr.
///
/// Output format:
/// ```text
///   +++ MAKE FUNCTION add          defaults=0
///   >>> CALL add                   depth=1
///   <<< RETURN ok                  depth=0
///   ... SET __code__ rejected
/// ```
#[derive(Debug, Default)]
pub struct StderrTracer {
    /// Maximum number of events to print. None = unlimited.
    limit: Option<usize>,
    /// Number of events printed so far.
    count: usize,
}

impl StderrTracer {
    /// Creates a new stderr tracer with no event limit.
    #[must_use]
    pub fn new() -> Self {
        Self { limit: None, count: 0 }
    }

    /// Creates a new stderr tracer that goes quiet after `limit` events.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            count: 0,
        }
    }

    /// Counts one event and returns whether it should be printed.
    fn admit(&mut self) -> bool {
        if self.limit.is_some_and(|l| self.count >= l) {
            return false;
        }
        self.count += 1;
        if let Some(limit) = self.limit
            && self.count == limit
        {
            eprintln!("--- trace limit reached ({limit} events) ---");
        }
        true
    }
}

fn outcome(ok: bool) -> &'static str {
    if ok { "ok" } else { "rejected" }
}

impl FunctionTracer for StderrTracer {
    fn on_make_function(&mut self, name: &str, cell_count: usize, defaults_count: usize) {
        if !self.admit() {
            return;
        }
        if cell_count > 0 {
            eprintln!("  +++ MAKE CLOSURE {name:<14} cells={cell_count} defaults={defaults_count}");
        } else {
            eprintln!("  +++ MAKE FUNCTION {name:<13} defaults={defaults_count}");
        }
    }

    fn on_call(&mut self, func_name: &str, depth: usize) {
        if self.admit() {
            eprintln!("  >>> CALL {func_name:<20} depth={depth}");
        }
    }

    fn on_return(&mut self, depth: usize, ok: bool) {
        if self.admit() {
            let status = if ok { "ok" } else { "error" };
            eprintln!("  <<< RETURN {status:<18} depth={depth}");
        }
    }

    fn on_attr_set(&mut self, attr: &str, ok: bool) {
        if self.admit() {
            eprintln!("  ... SET {attr} {}", outcome(ok));
        }
    }

    fn on_attr_delete(&mut self, attr: &str, ok: bool) {
        if self.admit() {
            eprintln!("  ... DEL {attr} {}", outcome(ok));
        }
    }

    fn on_bind(&mut self, bound: bool) {
        if self.admit() {
            eprintln!("  ... GET {}", if bound { "bound method" } else { "unbound function" });
        }
    }
}

// ============================================================================
// ProfilingTracer: call counts and depth tracking
// ============================================================================

/// Tracer that collects call statistics.
///
/// Retrieve results via [`ProfilingTracer::report`].
#[derive(Debug, Default)]
pub struct ProfilingTracer {
    /// Calls per function `__qualname__`.
    call_counts: AHashMap<String, u64>,
    total_calls: u64,
    failed_calls: u64,
    max_depth: usize,
    functions_made: u64,
    closures_made: u64,
    /// Attribute assignments or deletions that raised.
    rejected_attr_writes: u64,
    bound_methods: u64,
}

/// Summary report from a profiling trace.
#[derive(Debug)]
pub struct ProfilingReport {
    /// Per-function call counts, sorted by frequency (highest first, then by name).
    pub call_counts: Vec<(String, u64)>,
    pub total_calls: u64,
    pub failed_calls: u64,
    pub max_depth: usize,
    pub functions_made: u64,
    pub closures_made: u64,
    pub rejected_attr_writes: u64,
    pub bound_methods: u64,
}

impl ProfilingTracer {
    /// Creates a new profiling tracer with zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates a profiling report from the collected data.
    #[must_use]
    pub fn report(&self) -> ProfilingReport {
        let mut call_counts: Vec<_> = self.call_counts.iter().map(|(k, &v)| (k.clone(), v)).collect();
        call_counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ProfilingReport {
            call_counts,
            total_calls: self.total_calls,
            failed_calls: self.failed_calls,
            max_depth: self.max_depth,
            functions_made: self.functions_made,
            closures_made: self.closures_made,
            rejected_attr_writes: self.rejected_attr_writes,
            bound_methods: self.bound_methods,
        }
    }
}

impl FunctionTracer for ProfilingTracer {
    fn on_make_function(&mut self, _name: &str, cell_count: usize, _defaults_count: usize) {
        self.functions_made += 1;
        if cell_count > 0 {
            self.closures_made += 1;
        }
    }

    #[inline]
    fn on_call(&mut self, func_name: &str, depth: usize) {
        self.total_calls += 1;
        *self.call_counts.entry(func_name.to_owned()).or_insert(0) += 1;
        self.max_depth = self.max_depth.max(depth);
    }

    fn on_return(&mut self, _depth: usize, ok: bool) {
        if !ok {
            self.failed_calls += 1;
        }
    }

    fn on_attr_set(&mut self, _attr: &str, ok: bool) {
        if !ok {
            self.rejected_attr_writes += 1;
        }
    }

    fn on_attr_delete(&mut self, _attr: &str, ok: bool) {
        if !ok {
            self.rejected_attr_writes += 1;
        }
    }

    fn on_bind(&mut self, bound: bool) {
        if bound {
            self.bound_methods += 1;
        }
    }
}

impl std::fmt::Display for ProfilingReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Function Profiling Report ===")?;
        writeln!(f, "Functions made:     {} ({} closures)", self.functions_made, self.closures_made)?;
        writeln!(f, "Total calls:        {}", self.total_calls)?;
        writeln!(f, "Failed calls:       {}", self.failed_calls)?;
        writeln!(f, "Max call depth:     {}", self.max_depth)?;
        writeln!(f, "Bound methods:      {}", self.bound_methods)?;
        writeln!(f, "Rejected writes:    {}", self.rejected_attr_writes)?;
        writeln!(f)?;
        writeln!(f, "--- Calls per Function ---")?;
        for (name, count) in &self.call_counts {
            writeln!(f, "  {name:<30} {count:>10}")?;
        }
        Ok(())
    }
}

// ============================================================================
// RecordingTracer: full event recording
// ============================================================================

/// Tracer that records all events for post-mortem analysis.
///
/// Captures every trace event into a `Vec<TraceEvent>`. This is the most
/// expensive tracer (allocates per event).
#[derive(Debug, Default)]
pub struct RecordingTracer {
    /// All recorded events in chronological order.
    events: Vec<TraceEvent>,
    /// Optional limit on number of events recorded.
    limit: Option<usize>,
}

impl RecordingTracer {
    /// Creates a new recording tracer with no event limit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new recording tracer that stops recording after `limit` events.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            events: Vec::with_capacity(limit.min(1024)),
            limit: Some(limit),
        }
    }

    /// Returns the recorded events.
    #[must_use]
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// Consumes the tracer and returns the recorded events.
    #[must_use]
    pub fn into_events(self) -> Vec<TraceEvent> {
        self.events
    }

    fn record(&mut self, event: TraceEvent) {
        if self.limit.is_some_and(|l| self.events.len() >= l) {
            return;
        }
        self.events.push(event);
    }
}

impl FunctionTracer for RecordingTracer {
    fn on_make_function(&mut self, name: &str, cell_count: usize, defaults_count: usize) {
        self.record(TraceEvent::MakeFunction {
            name: name.to_owned(),
            cell_count,
            defaults_count,
        });
    }

    fn on_call(&mut self, func_name: &str, depth: usize) {
        self.record(TraceEvent::Call {
            func_name: func_name.to_owned(),
            depth,
        });
    }

    fn on_return(&mut self, depth: usize, ok: bool) {
        self.record(TraceEvent::Return { depth, ok });
    }

    fn on_attr_set(&mut self, attr: &str, ok: bool) {
        self.record(TraceEvent::AttrSet {
            attr: attr.to_owned(),
            ok,
        });
    }

    fn on_attr_delete(&mut self, attr: &str, ok: bool) {
        self.record(TraceEvent::AttrDelete {
            attr: attr.to_owned(),
            ok,
        });
    }

    fn on_bind(&mut self, bound: bool) {
        self.record(TraceEvent::Bind { bound });
    }
}
