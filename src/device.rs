//! Emulated device handle
//!
//! Every command runs the real engine: the image file is loaded into a
//! [`DummyNic`] and accessed through the operation table picked with
//! `--access`.

use crate::cli::{Access, DeviceArgs};
use crate::error::CliError;
use nicnvm_core::nvm::{EerdEeprom, NvmDevice, NvmHw, NvmInfo, NvmOps, SpiEeprom};
use nicnvm_core::regs::{NVM_WORD_SIZE_BASE_SHIFT, NVM_WORD_SIZE_MAX_SHIFT};
use nicnvm_dummy::{DummyConfig, DummyNic};
use std::fs;

/// Operation table selected at runtime
#[derive(Debug, Clone, Copy)]
pub enum Engine {
    /// Bit-banged SPI
    Spi(SpiEeprom),
    /// EERD/EEWR
    Eerd(EerdEeprom),
}

impl Engine {
    /// Human-readable access path
    pub fn name(&self) -> &'static str {
        match self {
            Self::Spi(_) => "SPI bit-bang (EECD)",
            Self::Eerd(_) => "register-polled (EERD/EEWR)",
        }
    }
}

impl From<Access> for Engine {
    fn from(access: Access) -> Self {
        match access {
            Access::Spi => Self::Spi(SpiEeprom),
            Access::Eerd => Self::Eerd(EerdEeprom),
        }
    }
}

impl NvmOps for Engine {
    fn init_params(&self, hw: &mut NvmHw<'_>) -> nicnvm_core::Result<()> {
        match self {
            Self::Spi(ops) => ops.init_params(hw),
            Self::Eerd(ops) => ops.init_params(hw),
        }
    }

    fn acquire(&self, hw: &mut NvmHw<'_>) -> nicnvm_core::Result<()> {
        match self {
            Self::Spi(ops) => ops.acquire(hw),
            Self::Eerd(ops) => ops.acquire(hw),
        }
    }

    fn release(&self, hw: &mut NvmHw<'_>) {
        match self {
            Self::Spi(ops) => ops.release(hw),
            Self::Eerd(ops) => ops.release(hw),
        }
    }

    fn read(&self, hw: &mut NvmHw<'_>, offset: u16, data: &mut [u16]) -> nicnvm_core::Result<()> {
        match self {
            Self::Spi(ops) => ops.read(hw, offset, data),
            Self::Eerd(ops) => ops.read(hw, offset, data),
        }
    }

    fn write(&self, hw: &mut NvmHw<'_>, offset: u16, data: &[u16]) -> nicnvm_core::Result<()> {
        match self {
            Self::Spi(ops) => ops.write(hw, offset, data),
            Self::Eerd(ops) => ops.write(hw, offset, data),
        }
    }
}

/// An image loaded into the emulated controller
pub type Device = NvmDevice<DummyNic, Engine>;

/// Largest EECD size field that maps to a distinct part size
const MAX_SIZE_EX: u32 = NVM_WORD_SIZE_MAX_SHIFT - NVM_WORD_SIZE_BASE_SHIFT;

fn dummy_config(args: &DeviceArgs, image_len: usize) -> Result<DummyConfig, CliError> {
    let mut config = match args.size_ex {
        Some(size_ex) if u32::from(size_ex) <= MAX_SIZE_EX => DummyConfig {
            size_ex,
            ..DummyConfig::default()
        },
        Some(other) => {
            return Err(CliError::InvalidArgument(format!(
                "size field must be 0..={}, not {}",
                MAX_SIZE_EX, other
            )))
        }
        None => {
            let words = (image_len / 2).next_power_of_two().max(64);
            DummyConfig::for_word_size(words).ok_or_else(|| {
                CliError::InvalidArgument(format!("no supported part holds {} words", words))
            })?
        }
    };

    match args.page_size {
        None => {
            if args.size_ex.is_some() {
                config.wide_address = config.nvm_info().word_size > 256;
            }
        }
        Some(8) => config.wide_address = false,
        Some(32) => config.wide_address = true,
        Some(other) => {
            return Err(CliError::InvalidArgument(format!(
                "page size must be 8 or 32, not {}",
                other
            )))
        }
    }

    let info = config.nvm_info();
    if !config.wide_address && info.word_size > 256 {
        return Err(CliError::InvalidArgument(format!(
            "{} words cannot be addressed with 8-byte pages",
            info.word_size
        )));
    }
    if image_len > usize::from(info.word_size) * 2 {
        return Err(CliError::InvalidArgument(format!(
            "image is {} bytes but the part holds {} words",
            image_len, info.word_size
        )));
    }

    Ok(config)
}

/// Load the image named by `args` and detect the part
pub fn open_device(args: &DeviceArgs) -> Result<Device, CliError> {
    let image = fs::read(&args.image)?;
    if image.len() % 2 != 0 {
        return Err(CliError::InvalidArgument(format!(
            "{} has an odd length",
            args.image.display()
        )));
    }

    let config = dummy_config(args, image.len())?;
    let nic = DummyNic::with_image(config, &image);

    let mut dev = NvmDevice::new(nic, NvmInfo::default(), Engine::from(args.access));
    dev.init_params()?;

    let info = dev.info();
    log::info!(
        "Loaded {} ({} bytes) as a {}-word part via {}",
        args.image.display(),
        image.len(),
        info.word_size,
        dev.ops().name()
    );
    Ok(dev)
}

/// Write the emulated EEPROM back to the image file
pub fn save_device(dev: &Device, args: &DeviceArgs) -> Result<(), CliError> {
    fs::write(&args.image, dev.bus().image())?;
    log::info!("Saved {}", args.image.display());
    Ok(())
}
