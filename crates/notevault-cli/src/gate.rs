//! Terminal stand-in for the platform biometric gate.

use std::io::{self, BufRead, IsTerminal, Write};

use async_trait::async_trait;
use notevault_core::boundary::BiometricGate;

pub struct TerminalGate;

#[async_trait]
impl BiometricGate for TerminalGate {
    async fn is_available(&self) -> bool {
        io::stdin().is_terminal()
    }

    /// Approval is typing `y`. Anything else, including EOF, is a denial,
    /// never an error.
    async fn authenticate(&self, prompt: &str) -> bool {
        print!("{prompt} [y/N] ");
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(_) => matches!(line.trim(), "y" | "Y" | "yes"),
            Err(_) => false,
        }
    }
}
