//! Console-based mailer for development

use claimgate_core::CodeMailer;

/// Mailer that logs codes to the console (for development)
pub struct ConsoleMailer;

impl ConsoleMailer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleMailer {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeMailer for ConsoleMailer {
    fn send_code(&self, code: &str, address: &str) -> Result<(), String> {
        println!();
        println!("========================================");
        println!("  CONFIRMATION CODE FOR: {}", address);
        println!("  CODE: {}", code);
        println!("========================================");
        println!();

        tracing::info!(address = %address, code = %code, "Confirmation code sent");

        Ok(())
    }
}
