//! # VEML7700 driver
//! A platform-agnostic, 'no_std' compatible Rust driver for the VEML7700 ambient light sensor using the `embedded-hal` traits.
//!
//! The I²C register set is based on the following datasheet: [VEML7700 datasheet](https://www.vishay.com/docs/84286/veml7700.pdf) \
//! Gain, integration time, persistence, power saving, interrupt thresholds and shutdown are supported.
//!
//! The raw values read from the sensor are converted to lux, taking into account the gain and integration time,
//! and corrected with the non-linearity compensation from the application note.
//!
//! ## Usage
//! To use this driver, import it and an `embedded_hal` implementation, then create an instance of the driver
//! and call `init` to bring the sensor into a known configuration. The sensor starts shut down.
//!
//! The configuration registers are write-only from the point of view of the driver, so every change is applied
//! to a shadow copy first and the whole register is written afterwards.
//!
//! You can call `auto_als_lux` to let the driver search for a gain and integration time that yields a usable
//! reading, or configure the sensor yourself, power it on and call `read_als_lux`.
//!
//! ## Example
//! ```no_run
//! use veml7700::{Gain, IntegrationTime, Veml7700, Veml7700Error};
//!
//! # fn main() -> Result<(), Veml7700Error<embedded_hal::i2c::ErrorKind>> {
//! # let i2c = embedded_hal_mock::eh1::i2c::Mock::new(&[]);
//! # let delay = embedded_hal_mock::eh1::delay::NoopDelay::new();
//! let mut veml7700 = Veml7700::new(i2c, delay);
//! veml7700.init()?;
//!
//! // Let the driver pick gain and integration time
//! let lux = veml7700.auto_als_lux()?;
//!
//! // Or configure a fixed setting and take a single reading
//! veml7700.set_gain(Gain::X1)?;
//! veml7700.set_integration_time(IntegrationTime::Ms200)?;
//! veml7700.set_power(true)?;
//! veml7700.sample_delay()?;
//! let fixed_lux = veml7700.read_als_lux()?;
//! veml7700.set_power(false)?;
//! # let _ = (lux, fixed_lux);
//! # Ok(())
//! # }
//! ```
//!
//! ## Logging
//! With the `defmt` feature enabled, the public types implement `defmt::Format` and the driver logs
//! register writes and the steps of the auto-ranging search.

#![cfg_attr(not(test), no_std)]
extern crate embedded_hal;

macro_rules! debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        defmt::debug!($($arg)*);
    }};
}

macro_rules! trace {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        defmt::trace!($($arg)*);
    }};
}

mod cache;
pub mod lux;
pub mod register;

use core::fmt;

use embedded_hal::delay;
use embedded_hal::i2c::I2c;

pub use cache::RegisterCache;
pub use register::{Field, FieldDescriptor, Gain, IntegrationTime, Persistence, PowerMode};

// Datasheet asks for at least 2.5 ms after leaving shutdown
const POWER_ON_DELAY_US: u32 = 3000;

// Auto-ranging skips the 25 ms and 50 ms settings on the way up
const AUTO_RANGE_INTEGRATION_TIMES: [IntegrationTime; 4] = [
    IntegrationTime::Ms100,
    IntegrationTime::Ms200,
    IntegrationTime::Ms400,
    IntegrationTime::Ms800,
];
const AUTO_RANGE_MIN_COUNTS: u16 = 200;
const AUTO_RANGE_SATURATION_COUNTS: u16 = 10000;

/// Enum representing the possible errors that can occur when using the VEML7700 driver
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Veml7700Error<I2CError> {
    /// The value is not one of the codes the field accepts
    InvalidValue(Field),
    /// The register address can't be accessed in the requested direction
    InvalidRegister(u8),
    /// The shadow copy of the field is missing or holds an unknown code
    InconsistentState(Field),
    /// I²C error
    I2C(I2CError),
}

impl<I2CError> From<I2CError> for Veml7700Error<I2CError> {
    fn from(err: I2CError) -> Self {
        return Veml7700Error::I2C(err);
    }
}

/// Output channel of the sensor
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    /// Ambient light, matched to the human eye
    Als,
    /// Wide band white channel
    White,
}

impl Channel {
    const fn register(&self) -> u8 {
        match self {
            Channel::Als => register::ALS,
            Channel::White => register::WHITE,
        }
    }
}

/// Initial configuration written by `init_with_config`
///
/// The default is the power-up state used by `init`: gain ×2, 100 ms, persistence 1,
/// interrupts off, shut down and power saving mode 3 disabled.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Sensor gain
    pub gain: Gain,
    /// Integration time of a single measurement
    pub integration_time: IntegrationTime,
    /// Consecutive out-of-window samples needed for an interrupt
    pub persistence: Persistence,
    /// Enables the threshold interrupt
    pub interrupts_enabled: bool,
    /// Leaves the sensor powered on after initialization
    pub powered_on: bool,
    /// Raw count above which the high threshold event is raised
    pub high_threshold: u16,
    /// Raw count below which the low threshold event is raised
    pub low_threshold: u16,
    /// Power saving mode, used once power saving is enabled
    pub power_mode: PowerMode,
    /// Enables power saving
    pub power_saving_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        return Self {
            gain: Gain::X2,
            integration_time: IntegrationTime::Ms100,
            persistence: Persistence::One,
            interrupts_enabled: false,
            powered_on: false,
            high_threshold: 0x0000,
            low_threshold: 0xffff,
            power_mode: PowerMode::Mode3,
            power_saving_enabled: false,
        };
    }
}

impl Config {
    /// Word for the ALS configuration register
    pub fn config_register(&self) -> u16 {
        return place(Field::Gain, self.gain.code())
            | place(Field::IntegrationTime, self.integration_time.code())
            | place(Field::Persistence, self.persistence.code())
            | place(Field::InterruptEnable, self.interrupts_enabled as u16)
            | place(Field::Shutdown, !self.powered_on as u16);
    }

    /// Word for the power saving register
    pub fn power_saving_register(&self) -> u16 {
        return place(Field::PowerSavingMode, self.power_mode.code())
            | place(Field::PowerSavingEnable, self.power_saving_enabled as u16);
    }
}

fn place(field: Field, value: u16) -> u16 {
    let d = field.descriptor();
    return (value << d.shift) & d.mask;
}

/// Threshold events latched by the sensor, cleared when read
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InterruptStatus {
    /// The reading rose above the high threshold
    pub high_threshold: bool,
    /// The reading fell below the low threshold
    pub low_threshold: bool,
}

/// Snapshot of the configuration as seen through the shadow registers
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorState {
    pub powered_on: bool,
    pub gain: Gain,
    pub integration_time: IntegrationTime,
    /// Lux per count
    pub resolution: f64,
    pub power_saving_enabled: bool,
    pub power_mode: PowerMode,
    pub persistence: Persistence,
}

impl fmt::Display for SensorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(
            f,
            "VEML7700(on={},gain={},itime={},resolution={},psm_on={},power_mode={},persistence={})",
            self.powered_on as u8,
            self.gain.as_str(),
            self.integration_time.as_str(),
            self.resolution,
            self.power_saving_enabled as u8,
            self.power_mode.as_str(),
            self.persistence.as_str(),
        );
    }
}

/// The driver is not meant to be shared between threads, wrap it in a mutex if it has to be.
pub struct Veml7700<I2C, DELAY> {
    com: I2C,
    delay: DELAY,
    cache: RegisterCache,
}

impl<I2C: I2c, DELAY: delay::DelayNs> Veml7700<I2C, DELAY> {
    /// Create a new instance of the VEML7700 driver
    ///
    /// Nothing is sent to the sensor until `init` is called.
    ///
    /// # Arguments
    /// * `i2c` - The I2C bus the sensor is connected to
    /// * `delay` - The delay provider
    pub fn new(i2c: I2C, delay: DELAY) -> Self {
        return Self {
            com: i2c,
            delay,
            cache: RegisterCache::new(),
        };
    }

    /// Writes the default configuration to all writable registers
    pub fn init(&mut self) -> Result<(), Veml7700Error<I2C::Error>> {
        return self.init_with_config(Config::default());
    }

    /// Writes `config` to all writable registers and seeds the shadow copy with it
    ///
    /// Blocks for the power-on delay if the configuration leaves the sensor powered on.
    ///
    /// # Arguments
    /// * `config` - The configuration to start from
    pub fn init_with_config(&mut self, config: Config) -> Result<(), Veml7700Error<I2C::Error>> {
        let words = [
            (register::ALS_CONF, config.config_register()),
            (register::ALS_WH, config.high_threshold),
            (register::ALS_WL, config.low_threshold),
            (register::POWER_SAVING, config.power_saving_register()),
        ];

        for (address, value) in words {
            self.cache.set_register(address, value);
            self.send_register(address, value)?;
        }

        if config.powered_on {
            self.delay.delay_us(POWER_ON_DELAY_US);
        }

        return Ok(());
    }

    /// Releases the I2C bus
    pub fn destroy(self) -> I2C {
        return self.com;
    }

    /// Writes one of the threshold registers as a whole
    ///
    /// The configuration registers (0x00 and 0x03) are only reachable through `write_field`,
    /// so that their shadow copy stays in sync with the sensor.
    ///
    /// # Arguments
    /// * `address` - `ALS_WH` (0x01) or `ALS_WL` (0x02)
    /// * `value` - The raw count to compare the ALS reading against
    pub fn write_register(&mut self, address: u8, value: u16) -> Result<(), Veml7700Error<I2C::Error>> {
        if address != register::ALS_WH && address != register::ALS_WL {
            return Err(Veml7700Error::InvalidRegister(address));
        }

        self.send_register(address, value)?;
        self.cache.set_register(address, value);

        return Ok(());
    }

    /// Reads one of the output registers
    ///
    /// # Arguments
    /// * `address` - `ALS` (0x04), `WHITE` (0x05) or `ALS_INT` (0x06)
    pub fn read_register(&mut self, address: u8) -> Result<u16, Veml7700Error<I2C::Error>> {
        if !(register::ALS..=register::ALS_INT).contains(&address) {
            return Err(Veml7700Error::InvalidRegister(address));
        }

        let mut data: [u8; 2] = [0; 2];
        self.com.write_read(register::ADDRESS, &[address], &mut data)?;

        return Ok(u16::from_le_bytes(data));
    }

    /// Updates a single field and writes the containing register
    ///
    /// The shadow copy is updated before the bus transfer and is not restored if the transfer fails,
    /// so after an I2C error the shadow and the sensor may disagree until the field is written again.
    ///
    /// # Arguments
    /// * `field` - The control to change
    /// * `value` - The raw code, must be one of the codes the field accepts
    pub fn write_field(&mut self, field: Field, value: u16) -> Result<(), Veml7700Error<I2C::Error>> {
        if !field.is_legal(value) {
            return Err(Veml7700Error::InvalidValue(field));
        }

        let reg = self
            .cache
            .update_field(field, value)
            .ok_or(Veml7700Error::InconsistentState(field))?;

        return self.send_register(field.descriptor().register, reg);
    }

    /// Reads a single field from the shadow copy, never from the bus
    pub fn read_field(&self, field: Field) -> Result<u16, Veml7700Error<I2C::Error>> {
        return self
            .cache
            .read_field(field)
            .ok_or(Veml7700Error::InconsistentState(field));
    }

    /// Sets the sensor gain
    pub fn set_gain(&mut self, gain: Gain) -> Result<(), Veml7700Error<I2C::Error>> {
        return self.write_field(Field::Gain, gain.code());
    }

    /// Gets the sensor gain
    pub fn gain(&self) -> Result<Gain, Veml7700Error<I2C::Error>> {
        let code = self.read_field(Field::Gain)?;
        return Gain::from_code(code).ok_or(Veml7700Error::InconsistentState(Field::Gain));
    }

    /// Sets the integration time
    /// Longer integration times result in a finer resolution and a longer measurement
    pub fn set_integration_time(&mut self, integration_time: IntegrationTime) -> Result<(), Veml7700Error<I2C::Error>> {
        return self.write_field(Field::IntegrationTime, integration_time.code());
    }

    /// Gets the integration time
    pub fn integration_time(&self) -> Result<IntegrationTime, Veml7700Error<I2C::Error>> {
        let code = self.read_field(Field::IntegrationTime)?;
        return IntegrationTime::from_code(code).ok_or(Veml7700Error::InconsistentState(Field::IntegrationTime));
    }

    /// Sets how many consecutive out-of-window samples raise an interrupt
    pub fn set_persistence(&mut self, persistence: Persistence) -> Result<(), Veml7700Error<I2C::Error>> {
        return self.write_field(Field::Persistence, persistence.code());
    }

    /// Gets the interrupt persistence
    pub fn persistence(&self) -> Result<Persistence, Veml7700Error<I2C::Error>> {
        let code = self.read_field(Field::Persistence)?;
        return Persistence::from_code(code).ok_or(Veml7700Error::InconsistentState(Field::Persistence));
    }

    /// Selects the power saving mode, takes effect once power saving is enabled
    pub fn set_power_saving_mode(&mut self, mode: PowerMode) -> Result<(), Veml7700Error<I2C::Error>> {
        return self.write_field(Field::PowerSavingMode, mode.code());
    }

    /// Enables or disables power saving, the mode is left untouched
    pub fn set_power_saving_enabled(&mut self, enabled: bool) -> Result<(), Veml7700Error<I2C::Error>> {
        return self.write_field(Field::PowerSavingEnable, enabled as u16);
    }

    /// Returns whether power saving is enabled and the selected mode
    pub fn power_saving(&self) -> Result<(bool, PowerMode), Veml7700Error<I2C::Error>> {
        let enabled = self.read_field(Field::PowerSavingEnable)? == 1;
        let mode = PowerMode::from_code(self.read_field(Field::PowerSavingMode)?)
            .ok_or(Veml7700Error::InconsistentState(Field::PowerSavingMode))?;

        return Ok((enabled, mode));
    }

    /// Powers the sensor on or shuts it down
    ///
    /// Powering on blocks until the sensor is ready, a first valid reading additionally needs one
    /// integration period (see `sample_delay`).
    pub fn set_power(&mut self, on: bool) -> Result<(), Veml7700Error<I2C::Error>> {
        self.write_field(Field::Shutdown, !on as u16)?;

        if on {
            self.delay.delay_us(POWER_ON_DELAY_US);
        }
        debug!("power on: {}", on);

        return Ok(());
    }

    /// Returns whether the sensor is powered on
    pub fn is_powered_on(&self) -> Result<bool, Veml7700Error<I2C::Error>> {
        return Ok(self.read_field(Field::Shutdown)? == 0);
    }

    /// Enables or disables the threshold interrupt
    pub fn set_interrupts_enabled(&mut self, enabled: bool) -> Result<(), Veml7700Error<I2C::Error>> {
        return self.write_field(Field::InterruptEnable, enabled as u16);
    }

    /// Returns whether the threshold interrupt is enabled
    pub fn interrupts_enabled(&self) -> Result<bool, Veml7700Error<I2C::Error>> {
        return Ok(self.read_field(Field::InterruptEnable)? == 1);
    }

    /// Sets the raw count above which the high threshold event is raised
    pub fn set_high_threshold(&mut self, threshold: u16) -> Result<(), Veml7700Error<I2C::Error>> {
        return self.write_register(register::ALS_WH, threshold);
    }

    /// Sets the raw count below which the low threshold event is raised
    pub fn set_low_threshold(&mut self, threshold: u16) -> Result<(), Veml7700Error<I2C::Error>> {
        return self.write_register(register::ALS_WL, threshold);
    }

    /// Last high threshold written by this driver
    pub fn high_threshold(&self) -> Option<u16> {
        return self.cache.register(register::ALS_WH);
    }

    /// Last low threshold written by this driver
    pub fn low_threshold(&self) -> Option<u16> {
        return self.cache.register(register::ALS_WL);
    }

    /// Reads the raw counts of the given channel
    pub fn read_raw(&mut self, channel: Channel) -> Result<u16, Veml7700Error<I2C::Error>> {
        return self.read_register(channel.register());
    }

    /// Reads the raw counts of the ALS channel
    pub fn read_als(&mut self) -> Result<u16, Veml7700Error<I2C::Error>> {
        return self.read_raw(Channel::Als);
    }

    /// Reads the raw counts of the white channel
    pub fn read_white(&mut self) -> Result<u16, Veml7700Error<I2C::Error>> {
        return self.read_raw(Channel::White);
    }

    /// Reads the channel and converts it at the current gain and integration time
    pub fn read_lux(&mut self, channel: Channel) -> Result<f64, Veml7700Error<I2C::Error>> {
        let raw = self.read_raw(channel)?;
        return self.scale_lux(raw);
    }

    /// Reads the ALS channel in lux
    pub fn read_als_lux(&mut self) -> Result<f64, Veml7700Error<I2C::Error>> {
        return self.read_lux(Channel::Als);
    }

    /// Reads the white channel in lux
    pub fn read_white_lux(&mut self) -> Result<f64, Veml7700Error<I2C::Error>> {
        return self.read_lux(Channel::White);
    }

    /// Reads and thereby clears the threshold events
    pub fn read_interrupt_status(&mut self) -> Result<InterruptStatus, Veml7700Error<I2C::Error>> {
        let reg = self.read_register(register::ALS_INT)?;

        return Ok(InterruptStatus {
            high_threshold: reg & register::HIGH_THRESHOLD_EVENT_MASK != 0,
            low_threshold: reg & register::LOW_THRESHOLD_EVENT_MASK != 0,
        });
    }

    /// Reads the interrupt status and returns whether the high threshold was crossed
    /// This clears the low threshold event as well
    pub fn high_threshold_event(&mut self) -> Result<bool, Veml7700Error<I2C::Error>> {
        return Ok(self.read_interrupt_status()?.high_threshold);
    }

    /// Reads the interrupt status and returns whether the low threshold was crossed
    /// This clears the high threshold event as well
    pub fn low_threshold_event(&mut self) -> Result<bool, Veml7700Error<I2C::Error>> {
        return Ok(self.read_interrupt_status()?.low_threshold);
    }

    /// Lux per count at the current gain and integration time
    pub fn resolution(&self) -> Result<f64, Veml7700Error<I2C::Error>> {
        return Ok(lux::resolution(self.gain()?, self.integration_time()?));
    }

    /// Converts raw counts into lux at the current gain and integration time
    pub fn scale_lux(&self, raw: u16) -> Result<f64, Veml7700Error<I2C::Error>> {
        return Ok(lux::scale_lux(raw, self.resolution()?));
    }

    /// Waits two integration periods so the next reading covers a full period at the current settings
    pub fn sample_delay(&mut self) -> Result<(), Veml7700Error<I2C::Error>> {
        let integration_time = self.integration_time()?;
        self.delay.delay_ms(2 * integration_time.milliseconds());

        return Ok(());
    }

    /// Searches for a gain and integration time with a usable ALS reading and returns it in lux
    pub fn auto_als_lux(&mut self) -> Result<f64, Veml7700Error<I2C::Error>> {
        return self.auto_lux(Channel::Als);
    }

    /// Searches for a gain and integration time with a usable white channel reading and returns it in lux
    pub fn auto_white_lux(&mut self) -> Result<f64, Veml7700Error<I2C::Error>> {
        return self.auto_lux(Channel::White);
    }

    /// Auto-ranging measurement
    ///
    /// Starting at 100 ms, every gain is tried in declaration order before moving on to the next longer
    /// integration time. The first reading above 200 counts ends the search. If that reading is 10000
    /// counts or more, the integration time is shortened step by step while the reading stays that high.
    ///
    /// If no setting rises above 200 counts the last reading, taken at 800 ms and gain ×2, is returned.
    /// The sensor is left shut down, with the gain and integration time of the returned reading.
    ///
    /// Any I2C error aborts the search.
    ///
    /// # Arguments
    /// * `channel` - The channel to measure
    pub fn auto_lux(&mut self, channel: Channel) -> Result<f64, Veml7700Error<I2C::Error>> {
        self.set_power(false)?;

        let mut raw = 0;
        for integration_time in AUTO_RANGE_INTEGRATION_TIMES {
            self.set_integration_time(integration_time)?;

            for gain in Gain::ALL {
                self.set_gain(gain)?;
                raw = self.sample(channel)?;

                if raw > AUTO_RANGE_MIN_COUNTS {
                    let mut index = integration_time.index();
                    while raw >= AUTO_RANGE_SATURATION_COUNTS && index > 0 {
                        index -= 1;
                        self.set_integration_time(IntegrationTime::ALL[index])?;
                        raw = self.sample(channel)?;
                    }

                    return self.scale_lux(raw);
                }
            }
        }

        debug!("auto range found no reading above {} counts", AUTO_RANGE_MIN_COUNTS);
        return self.scale_lux(raw);
    }

    // One full measurement cycle at the current settings
    fn sample(&mut self, channel: Channel) -> Result<u16, Veml7700Error<I2C::Error>> {
        self.set_power(true)?;
        self.sample_delay()?;
        let raw = self.read_raw(channel)?;
        self.set_power(false)?;
        trace!("sample {} = {}", channel, raw);

        return Ok(raw);
    }

    /// Summary of the current configuration, `Display` renders it on one line
    pub fn state(&self) -> Result<SensorState, Veml7700Error<I2C::Error>> {
        let (power_saving_enabled, power_mode) = self.power_saving()?;

        return Ok(SensorState {
            powered_on: self.is_powered_on()?,
            gain: self.gain()?,
            integration_time: self.integration_time()?,
            resolution: self.resolution()?,
            power_saving_enabled,
            power_mode,
            persistence: self.persistence()?,
        });
    }

    // Whole-register write of 0x00-0x03, callers keep the shadow copy in sync
    fn send_register(&mut self, address: u8, value: u16) -> Result<(), Veml7700Error<I2C::Error>> {
        let [low, high] = value.to_le_bytes();
        self.com.write(register::ADDRESS, &[address, low, high])?;
        trace!("write register {=u8:#x} = {=u16:#x}", address, value);

        return Ok(());
    }
}
