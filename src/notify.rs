/// Outbound notification seam. Real delivery (SMTP etc.) is a deployment
/// concern; the default implementation writes the code to the log so the
/// verification flow is fully exercisable in development.
pub trait Notifier: Send + Sync {
    fn send_verification_code(&self, email: &str, code: &str);
}

pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send_verification_code(&self, email: &str, code: &str) {
        tracing::info!(email, code, "verification code issued");
    }
}
