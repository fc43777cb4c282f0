use std::path::PathBuf;

use clap::Parser;

use crate::settings::ChatSettings;

/// Terminal client for the MaddyBot chat server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Parser)]
#[command(name = "maddy", version, about = "Chat with MaddyBot from the terminal")]
pub struct Cli {
    /// Base URL of the chat server
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Seconds to wait for a reply before reporting a network error
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Keep an HTML copy of the transcript at this path
    #[arg(long)]
    pub transcript: Option<PathBuf>,

    /// Settings file to read instead of the per-user default
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the effective settings back to the settings file
    #[arg(long)]
    pub save_settings: bool,
}

impl Cli {
    /// Layers command-line overrides on top of loaded settings.
    pub fn apply(&self, settings: &ChatSettings) -> ChatSettings {
        let mut settings = settings.clone();
        if let Some(endpoint) = &self.endpoint {
            settings.endpoint = endpoint.clone();
        }
        if let Some(timeout_secs) = self.timeout_secs {
            settings.request_timeout_secs = timeout_secs;
        }
        if let Some(transcript) = &self.transcript {
            settings.transcript_path = Some(transcript.clone());
        }
        settings.normalized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_flags_keep_loaded_settings() {
        let cli = Cli::try_parse_from(["maddy"]).expect("parse");
        assert_eq!(cli, Cli::default());
        assert_eq!(cli.apply(&ChatSettings::default()), ChatSettings::default());
    }

    #[test]
    fn flags_override_settings() {
        let cli = Cli::try_parse_from([
            "maddy",
            "--endpoint",
            "http://10.0.0.2:5000",
            "--timeout-secs",
            "15",
            "--transcript",
            "chat.html",
            "--save-settings",
        ])
        .expect("parse");

        let settings = cli.apply(&ChatSettings::default());
        assert!(cli.save_settings);
        assert_eq!(settings.endpoint, "http://10.0.0.2:5000");
        assert_eq!(settings.request_timeout_secs, 15);
        assert_eq!(settings.transcript_path, Some(PathBuf::from("chat.html")));
    }

    #[test]
    fn zero_timeout_falls_back_to_the_default() {
        let cli = Cli::try_parse_from(["maddy", "--timeout-secs", "0"]).expect("parse");
        assert_eq!(cli.apply(&ChatSettings::default()).request_timeout_secs, 120);
    }

    #[test]
    fn malformed_timeout_is_a_parse_error() {
        assert!(Cli::try_parse_from(["maddy", "--timeout-secs", "soon"]).is_err());
    }
}
