//! Output formatting for CLI

use owo_colors::OwoColorize;
use serde::Serialize;
use srtoken::Claims;

use crate::{
    cli::OutputFormat,
    commands::{CommandOutput, InspectOutput, IssuedOutput, KeygenOutput},
    error::CliResult,
};

/// Format command output based on format preference
#[derive(Debug, Clone, Copy)]
pub struct Formatter {
    format: OutputFormat,
    colored: bool,
}

impl Formatter {
    /// Create a formatter; `colored` is ignored for JSON output
    #[must_use]
    pub fn new(format: OutputFormat, colored: bool) -> Self {
        Self { format, colored }
    }

    /// Print command output to stdout
    pub fn display(&self, output: &CommandOutput) -> CliResult<()> {
        println!("{}", self.render(output)?);
        Ok(())
    }

    /// Render command output as a string
    pub fn render(&self, output: &CommandOutput) -> CliResult<String> {
        match self.format {
            OutputFormat::Json => render_json(output, true),
            OutputFormat::Compact => render_json(output, false),
            OutputFormat::Human => Ok(self.render_human(output)),
        }
    }

    fn render_human(&self, output: &CommandOutput) -> String {
        match output {
            CommandOutput::Keygen(KeygenOutput {
                phrase,
                public_key,
                address,
            }) => [
                self.field("Phrase", phrase),
                self.field("Public key", public_key),
                self.field("Address", address),
            ]
            .join("\n"),
            CommandOutput::Issued(IssuedOutput { token, .. }) => token.clone(),
            CommandOutput::Verified(identity) => [
                self.status("Token verified"),
                self.field("Subject", &identity.subject),
                self.field("Public key", &identity.public_key_hex()),
                self.field("Issued at", &identity.issued_at.to_string()),
                self.field("Expires at", &identity.expires_at.to_string()),
                self.field("Nonce", &identity.nonce),
            ]
            .join("\n"),
            CommandOutput::Inspected(InspectOutput {
                header,
                claims,
                signature_len,
                ..
            }) => {
                let mut lines = vec![
                    self.warning("Signature NOT verified"),
                    self.field("Algorithm", &header.alg),
                    self.field("Type", &header.typ),
                ];
                lines.extend(self.claim_lines(claims));
                lines.push(self.field("Signature", &format!("{signature_len} bytes")));
                lines.join("\n")
            }
        }
    }

    fn claim_lines(&self, claims: &Claims) -> Vec<String> {
        vec![
            self.field("Subject", &claims.sub),
            self.field("Public key", &claims.public_key),
            self.field("Issued at", &claims.iat.to_string()),
            self.field("Expires at", &claims.exp.to_string()),
            self.field("Nonce", &claims.nonce),
            self.field("Protocol", &claims.protocol_metadata.version),
        ]
    }

    fn field(&self, label: &str, value: &str) -> String {
        let label = format!("{label}:");
        if self.colored {
            format!("{:<12} {value}", label.bold())
        } else {
            format!("{label:<12} {value}")
        }
    }

    fn status(&self, message: &str) -> String {
        if self.colored {
            format!("{} {message}", "✓".green())
        } else {
            format!("OK {message}")
        }
    }

    fn warning(&self, message: &str) -> String {
        if self.colored {
            message.yellow().to_string()
        } else {
            format!("WARNING {message}")
        }
    }
}

fn render_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> CliResult<String> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(rendered)
}
