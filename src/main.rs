use anyhow::Context;
use psukit::{
    init_logging, list_ports, ConnectionParams, Instrument, InstrumentConfig, SerialTransport,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;

    let port = match std::env::args().nth(1) {
        Some(port) => port,
        None => {
            eprintln!("usage: psukit <serial-port>");
            eprintln!("available ports:");
            for info in list_ports()? {
                eprintln!("  {} ({})", info.port_name, info.description);
            }
            std::process::exit(2);
        }
    };

    let params = ConnectionParams {
        port,
        ..Default::default()
    };
    let transport =
        SerialTransport::open(&params).with_context(|| format!("opening {}", params.port))?;

    let mut instrument = Instrument::new(Box::new(transport), InstrumentConfig::default(), None);
    instrument.connect().await?;

    if let Some(identity) = instrument.identity() {
        println!("{}", identity);
    }
    if let Some(status) = instrument.status() {
        println!(
            "output {}  ch1 {}  ch2 {}  tracking {}  beep {}  baud {}",
            if status.output_enabled { "on" } else { "off" },
            status.channel1_mode,
            status.channel2_mode,
            status.tracking,
            if status.beep_enabled { "on" } else { "off" },
            status.baud_rate,
        );
    }
    for slot in 1..=4u8 {
        let snapshot = instrument.saved_slot(slot)?;
        print!("slot {}:", slot);
        for ch in 1..=4u8 {
            print!(
                "  V{}={:.3} I{}={:.3}",
                ch,
                snapshot.voltage(ch)?,
                ch,
                snapshot.current(ch)?
            );
        }
        println!();
    }

    instrument.shutdown().await?;
    Ok(())
}
