//! Verbose diagnostic channel.
//!
//! A [`Trace`] carries an optional callback that receives human-readable
//! progress messages. Messages are only formatted when a callback is set.

use std::fmt;
use std::sync::Arc;

type Sink = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Clone, Default)]
pub struct Trace {
    sink: Option<Sink>,
}

impl Trace {
    /// A trace that drops every message.
    pub fn disabled() -> Self {
        Self { sink: None }
    }

    pub fn new<F>(sink: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self {
            sink: Some(Arc::new(sink)),
        }
    }

    /// Trace printing `[routercheck:debug] <message>` lines to stderr.
    pub fn stderr() -> Self {
        Self::new(|message| eprintln!("[routercheck:debug] {}", message))
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Emit a message. The closure runs only when tracing is enabled.
    pub fn log<F>(&self, message: F)
    where
        F: FnOnce() -> String,
    {
        if let Some(sink) = &self.sink {
            sink(&message());
        }
    }
}

impl fmt::Debug for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trace")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_disabled_trace_never_formats() {
        let trace = Trace::disabled();
        trace.log(|| panic!("message should not be built"));
        assert!(!trace.is_enabled());
    }

    #[test]
    fn test_callback_receives_messages() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let trace = Trace::new(move |m| sink.lock().unwrap().push(m.to_string()));

        trace.log(|| format!("router {} found", "appRouter"));

        assert_eq!(*seen.lock().unwrap(), vec!["router appRouter found"]);
    }
}
