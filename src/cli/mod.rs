use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Send MIDI clock at a locally controlled tempo", long_about = None)]
pub struct Args {
    /// List available MIDI output ports
    #[arg(long)]
    pub list_ports: bool,

    /// Send clock to the first output port whose name contains this text
    #[arg(long)]
    pub port: Option<String>,

    /// Send clock to the output port at this position in the port list
    #[arg(long, conflicts_with = "port")]
    pub port_index: Option<usize>,

    /// Initial tempo in beats per minute (clamped to 20-300)
    #[arg(short, long)]
    pub bpm: Option<f64>,

    /// Read settings from this file instead of ./clocksyncrs.toml
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Run without a MIDI port, recording clock output in memory
    #[arg(long)]
    pub dry_run: bool,

    /// Start the clock immediately
    #[arg(long)]
    pub autostart: bool,

    /// Log level for the log file (error, warn, info, debug, trace)
    #[arg(long)]
    pub log_level: Option<String>,
}

pub fn handle_port_list() -> Vec<String> {
    match crate::midi::list_output_ports() {
        Ok(ports) => ports,
        Err(e) => {
            log::error!("Failed to list MIDI output ports: {}", e);
            Vec::new()
        }
    }
}

pub fn validate_port(port_name: &str, ports: &[String]) -> Result<(), String> {
    if !ports.iter().any(|p| p.contains(port_name)) {
        let mut error_msg = format!(
            "Error: Port '{}' not found in available ports:\n",
            port_name
        );
        for port in ports {
            error_msg.push_str(&format!("  - {}\n", port));
        }
        return Err(error_msg);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_port_lists_alternatives() {
        let ports = vec!["IAC Driver Bus 1".to_string(), "USB MIDI".to_string()];
        assert!(validate_port("IAC", &ports).is_ok());

        let err = validate_port("Missing", &ports).unwrap_err();
        assert!(err.contains("Missing"));
        assert!(err.contains("  - USB MIDI"));
    }
}
