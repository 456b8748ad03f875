//! nicnvm - NIC EEPROM inspection and editing tool
//!
//! Works on EEPROM image files. Each image is loaded into an emulated
//! gigabit controller and accessed through the same NVM engine a driver
//! would use:
//! - **SPI bit-bang** (`--access spi`) - EECD request/grant arbitration and
//!   a bit-level serial EEPROM protocol
//! - **Register-polled** (`--access eerd`) - the EERD/EEWR word engine
//!
//! Mutating commands write the image back when they succeed.

mod cli;
mod commands;
mod device;
mod error;

use clap::Parser;
use cli::{Cli, Commands};
use device::{open_device, save_device};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    match cli.command {
        Commands::Info { device } => {
            let mut dev = open_device(&device)?;
            commands::info::run_info(&mut dev)
        }
        Commands::Checksum { device, fix } => {
            let mut dev = open_device(&device)?;
            if commands::checksum::run_checksum(&mut dev, fix)? {
                save_device(&dev, &device)?;
            }
            Ok(())
        }
        Commands::ReadWords {
            device,
            offset,
            count,
        } => {
            let mut dev = open_device(&device)?;
            commands::words::run_read_words(&mut dev, offset, count)
        }
        Commands::WriteWord {
            device,
            offset,
            value,
            no_checksum,
        } => {
            let mut dev = open_device(&device)?;
            commands::words::run_write_word(&mut dev, offset, value, !no_checksum)?;
            save_device(&dev, &device)?;
            Ok(())
        }
        Commands::Dump { device, output } => {
            let mut dev = open_device(&device)?;
            commands::dump::run_dump(&mut dev, &output)
        }
        Commands::Blocks {
            device,
            table,
            mask,
        } => {
            let mut dev = open_device(&device)?;
            commands::blocks::run_blocks(&mut dev, &table, mask)
        }
        Commands::WriteBlock {
            device,
            table,
            name,
            data,
            no_checksum,
        } => {
            let mut dev = open_device(&device)?;
            commands::blocks::run_write_block(&mut dev, &table, &name, &data, !no_checksum)?;
            save_device(&dev, &device)?;
            Ok(())
        }
    }
}
