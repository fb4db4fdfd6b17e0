//! # Logger
//!
//! A structured-logging capability, so the bridge's internal
//! `tracing::info!`/`error!` calls can be redirected by an embedding host
//! without the core depending on any particular sink. [`TracingLogger`] —
//! the default — simply forwards to the `tracing` crate, matching every
//! other log line the rest of this crate emits directly. [`NoopLogger`]
//! lets the bridge run with zero observability configured.

/// A single key/value pair attached to a log line.
pub type Field<'a> = (&'a str, &'a dyn std::fmt::Display);

/// Structured logger capability. `error` takes the triggering cause
/// separately from the message so implementations can format it however
/// their sink expects (wrapped, chained, or dropped).
pub trait Logger: Send + Sync {
    fn info(&self, msg: &str, fields: &[Field<'_>]);
    fn error(&self, err: &dyn std::error::Error, msg: &str, fields: &[Field<'_>]);
}

/// Forwards to `tracing`, the same sink every other module in this crate
/// logs through directly.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn info(&self, msg: &str, fields: &[Field<'_>]) {
        if fields.is_empty() {
            tracing::info!("{msg}");
        } else {
            let rendered: Vec<String> = fields.iter().map(|(k, v)| format!("{k}={v}")).collect();
            tracing::info!(fields = %rendered.join(" "), "{msg}");
        }
    }

    fn error(&self, err: &dyn std::error::Error, msg: &str, fields: &[Field<'_>]) {
        let rendered: Vec<String> = fields.iter().map(|(k, v)| format!("{k}={v}")).collect();
        tracing::error!(error = %err, fields = %rendered.join(" "), "{msg}");
    }
}

/// Discards everything. Used as the default so the bridge can be embedded
/// without configuring observability.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn info(&self, _msg: &str, _fields: &[Field<'_>]) {}
    fn error(&self, _err: &dyn std::error::Error, _msg: &str, _fields: &[Field<'_>]) {}
}
