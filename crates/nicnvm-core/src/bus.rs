//! Register bus abstraction
//!
//! The engine never touches hardware directly. Every register access and
//! every delay goes through [`RegisterBus`], which the device driver
//! implements over its mapped BAR and which tests implement over a fake
//! register file.

use crate::regs;

/// Access to a controller's register file and its timing primitives
pub trait RegisterBus {
    /// Read a 32-bit register
    fn read_reg(&mut self, reg: u32) -> u32;

    /// Write a 32-bit register
    fn write_reg(&mut self, reg: u32, value: u32);

    /// Make prior posted writes visible to the device
    ///
    /// Default implementation reads the STATUS register.
    fn flush(&mut self) {
        let _ = self.read_reg(regs::STATUS);
    }

    /// Busy-wait for the given number of microseconds
    fn delay_us(&mut self, us: u32);

    /// Sleep for the given number of milliseconds
    ///
    /// Default implementation calls `delay_us`.
    fn delay_ms(&mut self, ms: u32) {
        self.delay_us(ms.saturating_mul(1000));
    }
}

impl<B: RegisterBus + ?Sized> RegisterBus for &mut B {
    fn read_reg(&mut self, reg: u32) -> u32 {
        (**self).read_reg(reg)
    }

    fn write_reg(&mut self, reg: u32, value: u32) {
        (**self).write_reg(reg, value)
    }

    fn flush(&mut self) {
        (**self).flush()
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }

    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }
}

// Blanket impl for boxed buses to allow trait objects
#[cfg(feature = "alloc")]
impl RegisterBus for alloc::boxed::Box<dyn RegisterBus + Send> {
    fn read_reg(&mut self, reg: u32) -> u32 {
        (**self).read_reg(reg)
    }

    fn write_reg(&mut self, reg: u32, value: u32) {
        (**self).write_reg(reg, value)
    }

    fn flush(&mut self) {
        (**self).flush()
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }

    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }
}
