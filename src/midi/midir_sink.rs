use crate::midi::{MidiError, MidiSink, Result};
use log::{debug, error, info};
use midir::{MidiOutput, MidiOutputConnection, MidiOutputPort};
use std::sync::{Mutex, PoisonError};

const CLIENT_NAME: &str = "clocksyncrs-out";
const CONNECTION_NAME: &str = "clocksyncrs-clock";

/// Sends clock bytes to a hardware or virtual MIDI port through midir
pub struct MidirSink {
    port_name: String,
    connection: Mutex<MidiOutputConnection>,
}

impl MidirSink {
    /// Connects to the first output port whose name contains `device_name`
    pub fn connect(device_name: &str) -> Result<Self> {
        let midi_out = MidiOutput::new(CLIENT_NAME)?;
        let out_ports = midi_out.ports();
        let available_ports = port_names(&midi_out, &out_ports);
        info!("Available MIDI output ports: {:?}", available_ports);

        let port = out_ports
            .iter()
            .find(|p| {
                midi_out
                    .port_name(p)
                    .unwrap_or_default()
                    .contains(device_name)
            })
            .cloned()
            .ok_or_else(|| {
                error!("MIDI output device '{}' not found", device_name);
                MidiError::PortNotFound(device_name.to_string())
            })?;

        Self::open(midi_out, &port)
    }

    /// Connects to the output port at `index` in the system's port list
    pub fn connect_index(index: usize) -> Result<Self> {
        let midi_out = MidiOutput::new(CLIENT_NAME)?;
        let port = midi_out
            .ports()
            .get(index)
            .cloned()
            .ok_or_else(|| MidiError::PortNotFound(format!("index {}", index)))?;

        Self::open(midi_out, &port)
    }

    pub fn connect_first_available() -> Result<Self> {
        Self::connect_index(0).map_err(|e| match e {
            MidiError::PortNotFound(_) => {
                MidiError::PortNotFound("no MIDI output ports available".to_string())
            }
            other => other,
        })
    }

    fn open(midi_out: MidiOutput, port: &MidiOutputPort) -> Result<Self> {
        let port_name = midi_out.port_name(port)?;
        info!("Connecting to MIDI output port: {}", port_name);
        let connection = midi_out.connect(port, CONNECTION_NAME)?;

        Ok(MidirSink {
            port_name,
            connection: Mutex::new(connection),
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

impl MidiSink for MidirSink {
    fn send_byte(&self, byte: u8) -> Result<()> {
        self.send_bytes(&[byte])
    }

    fn send_bytes(&self, bytes: &[u8]) -> Result<()> {
        let mut connection = self
            .connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        connection.send(bytes)?;
        Ok(())
    }
}

fn port_names(midi_out: &MidiOutput, ports: &[MidiOutputPort]) -> Vec<String> {
    ports
        .iter()
        .filter_map(|p| midi_out.port_name(p).ok())
        .collect()
}

/// Lists the names of all MIDI output ports on this system
#[cfg(not(feature = "test-mock"))]
pub fn list_output_ports() -> Result<Vec<String>> {
    let midi_out = MidiOutput::new("clocksyncrs-port-lister")?;
    let names = port_names(&midi_out, &midi_out.ports());
    debug!("Found {} MIDI output ports", names.len());
    Ok(names)
}

#[cfg(feature = "test-mock")]
pub fn list_output_ports() -> Result<Vec<String>> {
    debug!("Listing mock MIDI output ports");
    Ok(vec!["Mock Device 1".to_string(), "Mock Device 2".to_string()])
}
