use clap::Parser;
use clocksyncrs::{
    cli::{handle_port_list, validate_port, Args},
    logging,
    midi::{MidiError, MidiSink, MidirSink, RecordingSink},
    tui::run_keyboard_loop,
    ClockConfig, ClockEngine,
};
use dialoguer::Select;
use std::sync::Arc;

fn main() {
    let args = parse_command_line_arguments();
    let config = load_configuration(&args);
    initialize_logging(&config);

    if args.list_ports {
        list_available_ports(&handle_port_list());
        return;
    }

    let engine = Arc::new(ClockEngine::from_config(&config));
    let sink = match open_sink(&config) {
        Ok(sink) => sink,
        Err(e) => exit_with_error(&format!("Error opening MIDI output: {}", e)),
    };
    engine.setup(sink);

    if args.autostart {
        engine.start();
    }

    run_application_loop(engine);
}

fn parse_command_line_arguments() -> Args {
    Args::parse()
}

fn load_configuration(args: &Args) -> ClockConfig {
    match ClockConfig::load(args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

fn initialize_logging(config: &ClockConfig) {
    if let Err(e) = logging::init_logger(config.log_level()) {
        eprintln!("Logging disabled: {}", e);
    }
    log::info!("Application starting");
}

fn exit_with_error(error_msg: &str) -> ! {
    log::error!("{}", error_msg);
    eprintln!("{}", error_msg);
    std::process::exit(1);
}

fn list_available_ports(ports: &[String]) {
    println!("Available MIDI output ports:");
    for (index, port) in ports.iter().enumerate() {
        println!("  {}: {}", index, port);
    }
}

fn open_sink(config: &ClockConfig) -> Result<Arc<dyn MidiSink>, MidiError> {
    if config.dry_run {
        log::info!("Dry run: clock output is recorded in memory only");
        return Ok(Arc::new(RecordingSink::new()));
    }

    if let Some(port_name) = &config.output_port {
        let ports = handle_port_list();
        if let Err(error_msg) = validate_port(port_name, &ports) {
            exit_with_error(&error_msg);
        }
        return connect(MidirSink::connect(port_name));
    }

    if let Some(index) = config.output_index {
        return connect(MidirSink::connect_index(index));
    }

    let ports = handle_port_list();
    match ports.len() {
        0 => Err(MidiError::PortNotFound(
            "no MIDI output ports available".to_string(),
        )),
        1 => connect(MidirSink::connect_first_available()),
        _ => {
            let index = Select::new()
                .with_prompt("Select a MIDI output port")
                .items(&ports)
                .default(0)
                .interact()
                .map_err(|e| MidiError::ConnectionError(e.to_string()))?;
            connect(MidirSink::connect_index(index))
        }
    }
}

fn connect(sink: Result<MidirSink, MidiError>) -> Result<Arc<dyn MidiSink>, MidiError> {
    let sink = sink?;
    log::info!("Successfully connected to MIDI port: {}", sink.port_name());
    println!("CONNECTED PORT \"{}\"", sink.port_name());
    Ok(Arc::new(sink))
}

fn run_application_loop(engine: Arc<ClockEngine>) {
    log::info!("Application running");
    if let Err(e) = run_keyboard_loop(Arc::clone(&engine)) {
        log::error!("Keyboard input failed: {}", e);
        eprintln!("Keyboard input failed: {}", e);
    }
    engine.stop();
    log::info!("Application exiting");
}
