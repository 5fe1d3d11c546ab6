use std::any::Any;
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};

use crate::audit::{AuditLog, Step};
use crate::table::{Row, Table};

/// A table transformation instrumented with audit recording.
///
/// The wrapped function receives its own copy of the input, so it may
/// consume or mutate it freely; the caller's table is never touched.
pub struct AuditedFn<F> {
    name: String,
    rule_id: Option<String>,
    func: F,
}

/// Wraps `func` so every call is recorded as a step named `name`.
pub fn audit_trail<F, E>(name: impl Into<String>, func: F) -> AuditedFn<F>
where
    F: Fn(Table) -> Result<Table, E>,
    E: Display,
{
    AuditedFn {
        name: name.into(),
        rule_id: None,
        func,
    }
}

impl<F> AuditedFn<F> {
    pub fn rule(mut self, rule_id: impl Into<String>) -> Self {
        self.rule_id = Some(rule_id.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rule_id(&self) -> Option<&str> {
        self.rule_id.as_deref()
    }

    fn step(&self) -> Step {
        let step = Step::new(self.name.clone());
        match &self.rule_id {
            Some(rule_id) => step.with_rule(rule_id.clone()),
            None => step,
        }
    }

    /// Runs the transformation and records it in `log`.
    ///
    /// A transformation that returns `Err` or panics is recorded as an
    /// `ERROR` step with the input as both snapshots, and the input is
    /// returned unchanged.
    pub fn run<E>(&self, log: &mut AuditLog, data: &[Row]) -> Table
    where
        F: Fn(Table) -> Result<Table, E>,
        E: Display,
    {
        let before = data.to_vec();
        let input = data.to_vec();

        let failure = match panic::catch_unwind(AssertUnwindSafe(|| (self.func)(input))) {
            Ok(Ok(after)) => {
                log.log_transformation(self.step(), &before, &after);
                return after;
            }
            Ok(Err(e)) => e.to_string(),
            Err(payload) => panic_message(payload.as_ref()),
        };

        let step = self.step().failed(format!("Transformation failed: {}", failure));
        log.log_transformation(step, &before, &before);
        before
    }

    /// Runs against a fresh log named after the function.
    pub fn call<E>(&self, data: &[Row]) -> (Table, AuditLog)
    where
        F: Fn(Table) -> Result<Table, E>,
        E: Display,
    {
        let mut log = AuditLog::new(self.name.clone());
        let result = self.run(&mut log, data);
        (result, log)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panicked".to_string()
    }
}
