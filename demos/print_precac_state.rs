//! Print the current pre-CAC forest state for a freshly-enabled legacy
//! engine backed by the in-memory ETSI reference table.
use log::LevelFilter;
use simple_logger::SimpleLogger;

use etsi_precac::collaborators::testing::{RecordingFirmware, RecordingManagement, RecordingTimer};
use etsi_precac::regulatory::StaticRegulatoryDomain;
use etsi_precac::{HardwareCapability, PrecacConfig, PrecacEngine};

fn main() {
    SimpleLogger::new()
        .with_level(LevelFilter::Debug)
        .init()
        .unwrap();

    let engine = PrecacEngine::new(
        Box::new(StaticRegulatoryDomain::etsi_reference()),
        Box::new(RecordingManagement::default()),
        Box::new(RecordingFirmware::default()),
        Box::new(RecordingTimer::default()),
        PrecacConfig::default(),
        HardwareCapability::Legacy,
    );

    engine.set_precac_enable(true);
    println!("{}", engine.print_precaclists());
}
