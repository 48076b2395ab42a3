use crate::activation::{ActivationError, ActivationOutcome, Confirmation};
use colored::*;
use dialoguer::Confirm;

/// Print success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message.green());
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message.red());
}

/// Print warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message.yellow());
}

/// Print info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message.blue());
}

/// Interactive yes/no prompt on the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl Confirmation for TerminalPrompt {
    fn confirm(&self, prompt: &str) -> Result<bool, ActivationError> {
        Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(|e| ActivationError::Prompt(e.to_string()))
    }
}

/// One-line rendering of how the run ended.
pub fn outcome_line(outcome: &ActivationOutcome) -> String {
    match outcome {
        ActivationOutcome::AlreadyActive { .. } => "Account is activated".to_string(),
        ActivationOutcome::Declined => "Activation cancelled".to_string(),
        ActivationOutcome::Activated { pub_key_hash, .. } => {
            format!("[Your pubkey hash is] {}", pub_key_hash)
        }
        ActivationOutcome::SubmissionRejected { message } => format!("[ERROR] {}", message),
        ActivationOutcome::ExecutionFailed { reason, .. } => format!("[ERROR] {}", reason),
    }
}

pub fn report_outcome(outcome: &ActivationOutcome) {
    match outcome {
        ActivationOutcome::AlreadyActive { account } => {
            match serde_json::to_string_pretty(account) {
                Ok(state) => println!("accountState: {}", state),
                Err(e) => log::warn!("could not render account state: {}", e),
            }
            print_success(&outcome_line(outcome));
        }
        ActivationOutcome::Declined => print_warning(&outcome_line(outcome)),
        ActivationOutcome::Activated { tx_hash, pub_key_hash } => {
            print_success(&format!("Transaction execute success, tx hash: {}", tx_hash));
            println!("{} {}", "[Your pubkey hash is]".on_green().bold(), pub_key_hash);
        }
        ActivationOutcome::SubmissionRejected { .. } | ActivationOutcome::ExecutionFailed { .. } => {
            print_error(&outcome_line(outcome));
        }
    }
}
