//! Values derived from NVM contents
//!
//! MAC address, PBA (product board assembly) number, ID LED configuration
//! and the controller reload request.

use crate::bus::RegisterBus;
use crate::error::{Error, Result};
use crate::nvm::{NvmHw, NvmOps};
use crate::regs::{
    rah, ral, CTRL_EXT, CTRL_EXT_EE_RST, ETH_ADDR_LEN, ID_LED_DEFAULT, ID_LED_RESERVED_0000,
    ID_LED_RESERVED_FFFF, NVM_ID_LED_SETTINGS, NVM_PBA_OFFSET_0, NVM_PBA_OFFSET_1,
    NVM_PBA_PTR_GUARD, RAH_MAC_ADDR_LEN, RAL_MAC_ADDR_LEN,
};

/// Buffer size of a legacy PBA number, terminator included
pub const PBA_LEGACY_LEN: usize = 11;

/// Ask the controller to reinitialize itself from NVM
pub fn reload_nvm(hw: &mut NvmHw<'_>) {
    hw.bus.delay_us(10);
    let ctrl_ext = hw.bus.read_reg(CTRL_EXT) | CTRL_EXT_EE_RST;
    hw.bus.write_reg(CTRL_EXT, ctrl_ext);
    hw.bus.flush();
    log::debug!("requested NVM reload");
}

/// Read the ID LED settings word, mapping reserved values to the default
pub fn valid_led_default<O: NvmOps + ?Sized>(ops: &O, hw: &mut NvmHw<'_>) -> Result<u16> {
    let mut data = [0u16; 1];
    ops.read(hw, NVM_ID_LED_SETTINGS, &mut data).map_err(|e| {
        log::debug!("NVM read error while reading LED settings");
        e
    })?;

    Ok(match data[0] {
        ID_LED_RESERVED_0000 | ID_LED_RESERVED_FFFF => ID_LED_DEFAULT,
        value => value,
    })
}

/// Unpack the address in receive address slot 0
pub fn read_mac_addr(bus: &mut dyn RegisterBus) -> [u8; ETH_ADDR_LEN] {
    let rar_high = bus.read_reg(rah(0));
    let rar_low = bus.read_reg(ral(0));

    let mut addr = [0u8; ETH_ADDR_LEN];
    for (i, byte) in addr[..RAL_MAC_ADDR_LEN].iter_mut().enumerate() {
        *byte = (rar_low >> (i * 8)) as u8;
    }
    for (i, byte) in addr[RAL_MAC_ADDR_LEN..][..RAH_MAC_ADDR_LEN].iter_mut().enumerate() {
        *byte = (rar_high >> (i * 8)) as u8;
    }
    addr
}

fn read_word<O: NvmOps + ?Sized>(ops: &O, hw: &mut NvmHw<'_>, offset: u16) -> Result<u16> {
    let mut data = [0u16; 1];
    ops.read(hw, offset, &mut data).map_err(|e| {
        log::debug!("NVM read error at {:#x}", offset);
        e
    })?;
    Ok(data[0])
}

/// Where the PBA number lives
enum PbaLayout {
    /// Both words packed as nibbles
    Legacy(u16, u16),
    /// Length-prefixed string section at the pointer
    String { pointer: u16, length: u16 },
}

fn pba_layout<O: NvmOps + ?Sized>(ops: &O, hw: &mut NvmHw<'_>) -> Result<PbaLayout> {
    let first = read_word(ops, hw, NVM_PBA_OFFSET_0)?;
    let second = read_word(ops, hw, NVM_PBA_OFFSET_1)?;

    if first != NVM_PBA_PTR_GUARD {
        return Ok(PbaLayout::Legacy(first, second));
    }

    let length = read_word(ops, hw, second)?;
    if length == 0 || length == 0xFFFF {
        log::debug!("NVM PBA number section invalid length {:#x}", length);
        return Err(Error::SectionInvalid);
    }

    Ok(PbaLayout::String {
        pointer: second,
        length,
    })
}

fn hex_digit(nibble: u16) -> u8 {
    match nibble & 0xF {
        n @ 0..=9 => b'0' + n as u8,
        n => b'A' + (n as u8 - 0xA),
    }
}

/// Decode the PBA number into `buf` and NUL-terminate it
///
/// The legacy layout packs the part number into words 8 and 9 and decodes
/// to 10 characters. When word 8 holds the guard value, word 9 points to
/// a section whose first word is its length in words (length word
/// included) followed by two ASCII bytes per word, high byte first.
///
/// Returns the number of bytes written before the terminator.
pub fn read_pba_string<O: NvmOps + ?Sized>(
    ops: &O,
    hw: &mut NvmHw<'_>,
    buf: &mut [u8],
) -> Result<usize> {
    match pba_layout(ops, hw)? {
        PbaLayout::Legacy(first, second) => {
            if buf.len() < PBA_LEGACY_LEN {
                log::debug!("PBA string buffer too small");
                return Err(Error::NoSpace);
            }

            buf[0] = hex_digit(first >> 12);
            buf[1] = hex_digit(first >> 8);
            buf[2] = hex_digit(first >> 4);
            buf[3] = hex_digit(first);
            buf[4] = hex_digit(second >> 12);
            buf[5] = hex_digit(second >> 8);
            buf[6] = b'-';
            buf[7] = b'0';
            buf[8] = hex_digit(second >> 4);
            buf[9] = hex_digit(second);
            buf[10] = 0;
            Ok(PBA_LEGACY_LEN - 1)
        }
        PbaLayout::String { pointer, length } => {
            let needed = usize::from(length) * 2 - 1;
            if buf.len() < needed {
                log::debug!("PBA string buffer too small: {} < {}", buf.len(), needed);
                return Err(Error::NoSpace);
            }

            let words = length - 1;
            for i in 0..words {
                let word = read_word(ops, hw, pointer.wrapping_add(1 + i))?;
                let at = usize::from(i) * 2;
                buf[at] = (word >> 8) as u8;
                buf[at + 1] = word as u8;
            }
            let len = usize::from(words) * 2;
            buf[len] = 0;
            Ok(len)
        }
    }
}

/// Buffer size [`read_pba_string`] needs, terminator included
pub fn read_pba_length<O: NvmOps + ?Sized>(ops: &O, hw: &mut NvmHw<'_>) -> Result<u32> {
    Ok(match pba_layout(ops, hw)? {
        PbaLayout::Legacy(..) => PBA_LEGACY_LEN as u32,
        PbaLayout::String { length, .. } => u32::from(length) * 2 - 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eerd::EerdEeprom;
    use crate::nvm::NvmInfo;
    use crate::testutil::FakeBus;

    fn legacy_image() -> [u16; 64] {
        let mut words = [0u16; 64];
        words[NVM_PBA_OFFSET_0 as usize] = 0x1234;
        words[NVM_PBA_OFFSET_1 as usize] = 0x5678;
        words
    }

    fn string_image() -> [u16; 64] {
        let mut words = [0u16; 64];
        words[NVM_PBA_OFFSET_0 as usize] = NVM_PBA_PTR_GUARD;
        words[NVM_PBA_OFFSET_1 as usize] = 0x20;
        words[0x20] = 3;
        words[0x21] = u16::from_be_bytes(*b"G1");
        words[0x22] = u16::from_be_bytes(*b"2-");
        words
    }

    #[test]
    fn test_legacy_pba() {
        let mut bus = FakeBus::new(&legacy_image());
        let mut info = NvmInfo::spi(64, 8, 8);
        let mut hw = NvmHw::new(&mut bus, &mut info);

        assert_eq!(read_pba_length(&EerdEeprom, &mut hw), Ok(11));
        let mut buf = [0xAAu8; 11];
        let len = read_pba_string(&EerdEeprom, &mut hw, &mut buf).unwrap();
        assert_eq!(&buf[..len], b"123456-078");
        assert_eq!(buf[len], 0);
    }

    #[test]
    fn test_legacy_pba_hex_letters() {
        let mut words = legacy_image();
        words[NVM_PBA_OFFSET_0 as usize] = 0xABCD;
        words[NVM_PBA_OFFSET_1 as usize] = 0xEF0A;
        let mut bus = FakeBus::new(&words);
        let mut info = NvmInfo::spi(64, 8, 8);
        let mut buf = [0u8; 16];
        let len = read_pba_string(&EerdEeprom, &mut NvmHw::new(&mut bus, &mut info), &mut buf)
            .unwrap();
        assert_eq!(&buf[..len], b"ABCDEF-00A");
    }

    #[test]
    fn test_legacy_pba_buffer_too_small() {
        let mut bus = FakeBus::new(&legacy_image());
        let mut info = NvmInfo::spi(64, 8, 8);
        let mut buf = [0u8; 10];
        assert_eq!(
            read_pba_string(&EerdEeprom, &mut NvmHw::new(&mut bus, &mut info), &mut buf),
            Err(Error::NoSpace)
        );
    }

    #[test]
    fn test_string_pba() {
        let mut bus = FakeBus::new(&string_image());
        let mut info = NvmInfo::spi(64, 8, 8);
        let mut hw = NvmHw::new(&mut bus, &mut info);

        assert_eq!(read_pba_length(&EerdEeprom, &mut hw), Ok(5));
        let mut buf = [0xAAu8; 5];
        let len = read_pba_string(&EerdEeprom, &mut hw, &mut buf).unwrap();
        assert_eq!(&buf[..len], b"G12-");
        assert_eq!(buf[len], 0);

        let mut small = [0u8; 4];
        assert_eq!(
            read_pba_string(&EerdEeprom, &mut hw, &mut small),
            Err(Error::NoSpace)
        );
    }

    #[test]
    fn test_string_pba_invalid_section() {
        for length in [0u16, 0xFFFF] {
            let mut words = string_image();
            words[0x20] = length;
            let mut bus = FakeBus::new(&words);
            let mut info = NvmInfo::spi(64, 8, 8);
            let mut hw = NvmHw::new(&mut bus, &mut info);
            let mut buf = [0u8; 32];

            assert_eq!(
                read_pba_string(&EerdEeprom, &mut hw, &mut buf),
                Err(Error::SectionInvalid)
            );
            assert_eq!(read_pba_length(&EerdEeprom, &mut hw), Err(Error::SectionInvalid));
        }
    }

    #[test]
    fn test_led_default() {
        let cases = [
            (0x0000, ID_LED_DEFAULT),
            (0xFFFF, ID_LED_DEFAULT),
            (0x1234, 0x1234),
        ];
        for (stored, expected) in cases {
            let mut words = [0u16; 64];
            words[NVM_ID_LED_SETTINGS as usize] = stored;
            let mut bus = FakeBus::new(&words);
            let mut info = NvmInfo::spi(64, 8, 8);
            assert_eq!(
                valid_led_default(&EerdEeprom, &mut NvmHw::new(&mut bus, &mut info)),
                Ok(expected)
            );
        }
    }

    #[test]
    fn test_mac_from_receive_address() {
        let mut bus = FakeBus::new(&[0; 64]);
        bus.write_reg(ral(0), 0x4433_2211);
        bus.write_reg(rah(0), 0x8000_6655);
        assert_eq!(read_mac_addr(&mut bus), [0x11, 0x22, 0x33, 0x44, 0x55, 0x66]);
    }

    #[test]
    fn test_reload_sets_ee_rst() {
        let mut bus = FakeBus::new(&[0; 64]);
        let mut info = NvmInfo::spi(64, 8, 8);
        reload_nvm(&mut NvmHw::new(&mut bus, &mut info));
        assert_ne!(bus.reg(CTRL_EXT) & CTRL_EXT_EE_RST, 0);
        assert_eq!(bus.total_delay_us(), 10);
    }
}
