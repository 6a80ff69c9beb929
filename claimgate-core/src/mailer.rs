//! Confirmation-code delivery abstraction

/// Delivers confirmation codes to email addresses.
///
/// Fire-and-forget: the registry invokes the mailer only after the
/// corresponding state change is durably recorded, and a delivery failure
/// never rolls that state back.
pub trait CodeMailer: Send + Sync {
    /// Send a confirmation code to an address
    fn send_code(&self, code: &str, address: &str) -> Result<(), String>;
}

/// Allow using Box<dyn CodeMailer> as a CodeMailer
impl CodeMailer for Box<dyn CodeMailer> {
    fn send_code(&self, code: &str, address: &str) -> Result<(), String> {
        (**self).send_code(code, address)
    }
}

/// Allow a shared mailer to be used wherever an owned one is expected
impl<M: CodeMailer + ?Sized> CodeMailer for std::sync::Arc<M> {
    fn send_code(&self, code: &str, address: &str) -> Result<(), String> {
        (**self).send_code(code, address)
    }
}
