use diesel::connection::Instrumentation;
use diesel::connection::InstrumentationEvent;

/// Logs the queries made through a connection at trace level
#[derive(Debug, Default)]
pub(super) struct TracingInstrumentation;

impl Instrumentation for TracingInstrumentation {
    fn on_connection_event(&mut self, event: InstrumentationEvent<'_>) {
        match event {
            InstrumentationEvent::StartQuery { query, .. } => {
                tracing::trace!(query = %query, "starting query");
            }
            InstrumentationEvent::FinishQuery { query, error, .. } => {
                if let Some(error) = error {
                    tracing::trace!(query = %query, error = ?error, "query failed");
                } else {
                    tracing::trace!(query = %query, "query finished");
                }
            }
            _ => {}
        }
    }
}
