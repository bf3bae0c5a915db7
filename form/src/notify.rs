/// Surfaces the outcome of a submission to the user.
pub trait Notifier {
    fn success(&self, message: &str);

    fn failure(&self, message: &str);
}

/// Reports notifications through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, message: &str) {
        tracing::info!(notice = message, "Registration succeeded");
    }

    fn failure(&self, message: &str) {
        tracing::warn!(notice = message, "Registration failed");
    }
}
