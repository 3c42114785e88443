use crate::register::{Field, WRITABLE_REGISTERS};

/// Shadow copy of the writable registers
///
/// The configuration registers cannot be trusted to read back, so every partial update is
/// computed against this mirror. A slot stays `None` until the driver is initialized.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegisterCache {
    registers: [Option<u16>; WRITABLE_REGISTERS],
}

impl RegisterCache {
    pub const fn new() -> Self {
        return Self { registers: [None; WRITABLE_REGISTERS] };
    }

    pub fn register(&self, index: u8) -> Option<u16> {
        return self.registers.get(index as usize).copied().flatten();
    }

    pub fn set_register(&mut self, index: u8, value: u16) {
        if let Some(slot) = self.registers.get_mut(index as usize) {
            *slot = Some(value);
        }
    }

    /// Extracts a field from its shadowed register, `None` if the register was never populated
    pub fn read_field(&self, field: Field) -> Option<u16> {
        let d = field.descriptor();
        return self.register(d.register).map(|reg| (reg & d.mask) >> d.shift);
    }

    /// Merges `value` into the shadowed register and returns the new register word
    ///
    /// Bits outside the field's mask are preserved.
    pub fn update_field(&mut self, field: Field, value: u16) -> Option<u16> {
        let d = field.descriptor();
        let reg = (self.register(d.register)? & !d.mask) | ((value << d.shift) & d.mask);
        self.set_register(d.register, reg);
        return Some(reg);
    }
}
