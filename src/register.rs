//! Register map of the VEML7700
//!
//! The sensor exposes seven 16-bit registers. Registers `0x00..=0x03` are written by the driver,
//! `0x04..=0x06` are read-only outputs. The configuration registers `0x00` and `0x03` pack several
//! controls into one word, described here by a [`FieldDescriptor`] per control.

/// Fixed 7-bit I²C address of the sensor
pub const ADDRESS: u8 = 0x10;

/// ALS configuration (gain, integration time, persistence, interrupt enable, shutdown)
pub const ALS_CONF: u8 = 0x00;
/// ALS high threshold window (write-only)
pub const ALS_WH: u8 = 0x01;
/// ALS low threshold window (write-only)
pub const ALS_WL: u8 = 0x02;
/// Power saving configuration
pub const POWER_SAVING: u8 = 0x03;
/// ALS channel output
pub const ALS: u8 = 0x04;
/// White channel output
pub const WHITE: u8 = 0x05;
/// Interrupt status
pub const ALS_INT: u8 = 0x06;

/// Number of writable registers mirrored by the driver
pub const WRITABLE_REGISTERS: usize = 4;

pub(crate) const HIGH_THRESHOLD_EVENT_MASK: u16 = 0x8000;
pub(crate) const LOW_THRESHOLD_EVENT_MASK: u16 = 0x4000;

/// Location of a control inside one of the writable registers
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FieldDescriptor {
    /// Register index, `0..=3`
    pub register: u8,
    /// Contiguous run of ones starting at `shift`
    pub mask: u16,
    pub shift: u8,
}

impl FieldDescriptor {
    const fn new(register: u8, mask: u16, shift: u8) -> Self {
        Self { register, mask, shift }
    }

    /// Largest value that fits into the field
    #[cfg(test)]
    pub(crate) const fn max_value(&self) -> u16 {
        self.mask >> self.shift
    }
}

/// Logical controls of the sensor that live inside a configuration register
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Field {
    Gain,
    IntegrationTime,
    Persistence,
    InterruptEnable,
    /// Inverted power control, 1 means shut down
    Shutdown,
    PowerSavingMode,
    PowerSavingEnable,
}

impl Field {
    pub const fn descriptor(&self) -> FieldDescriptor {
        match self {
            Field::Gain => FieldDescriptor::new(ALS_CONF, 0x1800, 11),
            Field::IntegrationTime => FieldDescriptor::new(ALS_CONF, 0x03c0, 6),
            Field::Persistence => FieldDescriptor::new(ALS_CONF, 0x0030, 4),
            Field::InterruptEnable => FieldDescriptor::new(ALS_CONF, 0x0002, 1),
            Field::Shutdown => FieldDescriptor::new(ALS_CONF, 0x0001, 0),
            Field::PowerSavingMode => FieldDescriptor::new(POWER_SAVING, 0x0006, 1),
            Field::PowerSavingEnable => FieldDescriptor::new(POWER_SAVING, 0x0001, 0),
        }
    }

    /// Whether `value` is one of the codes the hardware accepts for this field
    pub fn is_legal(&self, value: u16) -> bool {
        match self {
            Field::Gain => Gain::from_code(value).is_some(),
            Field::IntegrationTime => IntegrationTime::from_code(value).is_some(),
            Field::Persistence => Persistence::from_code(value).is_some(),
            Field::PowerSavingMode => PowerMode::from_code(value).is_some(),
            Field::InterruptEnable | Field::Shutdown | Field::PowerSavingEnable => value <= 1,
        }
    }
}

/// Sensor gain, declared in the order the auto-ranging search walks through it
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gain {
    Div8,
    Div4,
    X1,
    X2,
}

impl Gain {
    pub const ALL: [Gain; 4] = [Gain::Div8, Gain::Div4, Gain::X1, Gain::X2];

    pub const fn code(&self) -> u16 {
        match self {
            Gain::Div8 => 0x2,
            Gain::Div4 => 0x3,
            Gain::X1 => 0x0,
            Gain::X2 => 0x1,
        }
    }

    pub const fn from_code(code: u16) -> Option<Self> {
        match code {
            0x2 => Some(Gain::Div8),
            0x3 => Some(Gain::Div4),
            0x0 => Some(Gain::X1),
            0x1 => Some(Gain::X2),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Gain::Div8 => "ALS_GAIN_d8",
            Gain::Div4 => "ALS_GAIN_d4",
            Gain::X1 => "ALS_GAIN_x1",
            Gain::X2 => "ALS_GAIN_x2",
        }
    }
}

/// Integration time, declared from shortest to longest
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IntegrationTime {
    Ms25,
    Ms50,
    Ms100,
    Ms200,
    Ms400,
    Ms800,
}

impl IntegrationTime {
    pub const ALL: [IntegrationTime; 6] = [
        IntegrationTime::Ms25,
        IntegrationTime::Ms50,
        IntegrationTime::Ms100,
        IntegrationTime::Ms200,
        IntegrationTime::Ms400,
        IntegrationTime::Ms800,
    ];

    pub const fn code(&self) -> u16 {
        match self {
            IntegrationTime::Ms25 => 0xc,
            IntegrationTime::Ms50 => 0x8,
            IntegrationTime::Ms100 => 0x0,
            IntegrationTime::Ms200 => 0x1,
            IntegrationTime::Ms400 => 0x2,
            IntegrationTime::Ms800 => 0x3,
        }
    }

    pub const fn from_code(code: u16) -> Option<Self> {
        match code {
            0xc => Some(IntegrationTime::Ms25),
            0x8 => Some(IntegrationTime::Ms50),
            0x0 => Some(IntegrationTime::Ms100),
            0x1 => Some(IntegrationTime::Ms200),
            0x2 => Some(IntegrationTime::Ms400),
            0x3 => Some(IntegrationTime::Ms800),
            _ => None,
        }
    }

    pub const fn milliseconds(&self) -> u32 {
        match self {
            IntegrationTime::Ms25 => 25,
            IntegrationTime::Ms50 => 50,
            IntegrationTime::Ms100 => 100,
            IntegrationTime::Ms200 => 200,
            IntegrationTime::Ms400 => 400,
            IntegrationTime::Ms800 => 800,
        }
    }

    /// Position in [`IntegrationTime::ALL`]
    pub const fn index(&self) -> usize {
        match self {
            IntegrationTime::Ms25 => 0,
            IntegrationTime::Ms50 => 1,
            IntegrationTime::Ms100 => 2,
            IntegrationTime::Ms200 => 3,
            IntegrationTime::Ms400 => 4,
            IntegrationTime::Ms800 => 5,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            IntegrationTime::Ms25 => "ALS_INTEGRATION_25ms",
            IntegrationTime::Ms50 => "ALS_INTEGRATION_50ms",
            IntegrationTime::Ms100 => "ALS_INTEGRATION_100ms",
            IntegrationTime::Ms200 => "ALS_INTEGRATION_200ms",
            IntegrationTime::Ms400 => "ALS_INTEGRATION_400ms",
            IntegrationTime::Ms800 => "ALS_INTEGRATION_800ms",
        }
    }
}

/// Number of consecutive out-of-window samples before an interrupt is raised
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Persistence {
    One,
    Two,
    Four,
    Eight,
}

impl Persistence {
    pub const fn code(&self) -> u16 {
        match self {
            Persistence::One => 0x0,
            Persistence::Two => 0x1,
            Persistence::Four => 0x2,
            Persistence::Eight => 0x3,
        }
    }

    pub const fn from_code(code: u16) -> Option<Self> {
        match code {
            0x0 => Some(Persistence::One),
            0x1 => Some(Persistence::Two),
            0x2 => Some(Persistence::Four),
            0x3 => Some(Persistence::Eight),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Persistence::One => "ALS_PERSISTENCE_1",
            Persistence::Two => "ALS_PERSISTENCE_2",
            Persistence::Four => "ALS_PERSISTENCE_4",
            Persistence::Eight => "ALS_PERSISTENCE_8",
        }
    }
}

/// Power saving mode, a longer mode means a lower average current and a slower refresh
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerMode {
    Mode1,
    Mode2,
    Mode3,
    Mode4,
}

impl PowerMode {
    pub const fn code(&self) -> u16 {
        match self {
            PowerMode::Mode1 => 0x0,
            PowerMode::Mode2 => 0x1,
            PowerMode::Mode3 => 0x2,
            PowerMode::Mode4 => 0x3,
        }
    }

    pub const fn from_code(code: u16) -> Option<Self> {
        match code {
            0x0 => Some(PowerMode::Mode1),
            0x1 => Some(PowerMode::Mode2),
            0x2 => Some(PowerMode::Mode3),
            0x3 => Some(PowerMode::Mode4),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            PowerMode::Mode1 => "ALS_POWER_MODE_1",
            PowerMode::Mode2 => "ALS_POWER_MODE_2",
            PowerMode::Mode3 => "ALS_POWER_MODE_3",
            PowerMode::Mode4 => "ALS_POWER_MODE_4",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELDS: [Field; 7] = [
        Field::Gain,
        Field::IntegrationTime,
        Field::Persistence,
        Field::InterruptEnable,
        Field::Shutdown,
        Field::PowerSavingMode,
        Field::PowerSavingEnable,
    ];

    #[test]
    fn masks_are_contiguous_and_start_at_shift() {
        for field in FIELDS {
            let d = field.descriptor();
            assert!((d.register as usize) < WRITABLE_REGISTERS);
            assert_eq!(d.mask & ((1 << d.shift) - 1), 0, "{:?}", field);
            let run = d.mask >> d.shift;
            assert_eq!(run & (run + 1), 0, "{:?}", field);
        }
    }

    #[test]
    fn fields_in_one_register_do_not_overlap() {
        for (i, a) in FIELDS.iter().enumerate() {
            for b in &FIELDS[i + 1..] {
                let (da, db) = (a.descriptor(), b.descriptor());
                if da.register == db.register {
                    assert_eq!(da.mask & db.mask, 0, "{:?} overlaps {:?}", a, b);
                }
            }
        }
    }

    #[test]
    fn codes_round_trip_through_lookup() {
        for gain in Gain::ALL {
            assert_eq!(Gain::from_code(gain.code()), Some(gain));
        }
        for (i, itime) in IntegrationTime::ALL.iter().enumerate() {
            assert_eq!(IntegrationTime::from_code(itime.code()), Some(*itime));
            assert_eq!(itime.index(), i);
        }
    }

    #[test]
    fn unused_integration_time_codes_are_illegal() {
        for code in [0x4, 0x5, 0x7, 0x9, 0xd, 0xf] {
            assert!(!Field::IntegrationTime.is_legal(code));
        }
        assert!(!Field::Gain.is_legal(4));
        assert!(!Field::Shutdown.is_legal(2));
        assert!(Field::PowerSavingMode.is_legal(3));
    }
}
