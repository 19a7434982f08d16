//! Charger block of the Nordic nPM1300/nPM1304 power management ICs.
//!
//! The driver programs the charger once at startup from a [`ChargerConfig`]
//! and then serves telemetry through a sensor-style fetch/get interface:
//! [`blocking::Npm13xxCharger::sample_fetch`] refreshes a cached sample
//! from hardware, [`blocking::Npm13xxCharger::channel_get`] projects one
//! [`Channel`] out of that cache, and the attribute calls read or write
//! individual runtime settings.

use core::fmt::{self, Display, Formatter};

use bitflags::bitflags;
use num_enum::TryFromPrimitive;

use crate::linear_range::LinearRange;

/// Errors that can occur when interacting with the charger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Register transport failure, surfaced verbatim from the bus.
    Bus(E),
    /// The device did not answer the probe read at initialization.
    NoDevice,
    /// Channel or (channel, attribute) pair not implemented by the charger.
    NotSupported,
    /// Requested value does not land on a representable hardware step.
    InvalidValue,
}

/// Chip variant, selecting the matching constant bundle at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Variant {
    Npm1300,
    Npm1304,
}

impl Variant {
    /// Stacked termination voltage windows sharing one index space.
    pub(crate) const fn termination_voltage_ranges(self) -> [LinearRange; 2] {
        match self {
            Variant::Npm1300 => [
                LinearRange::new(3_500_000, 50_000, 0, 3),
                LinearRange::new(4_000_000, 50_000, 4, 13),
            ],
            Variant::Npm1304 => [
                LinearRange::new(3_600_000, 50_000, 0, 1),
                LinearRange::new(4_000_000, 50_000, 2, 15),
            ],
        }
    }

    /// Charge current limit range.
    pub(crate) const fn charge_current_range(self) -> LinearRange {
        match self {
            Variant::Npm1300 => LinearRange::new(32_000, 2_000, 16, 400),
            Variant::Npm1304 => LinearRange::new(4_000, 500, 8, 200),
        }
    }

    /// Numerator/denominator pair scaling the discharge limit to the
    /// full-scale discharge current.
    pub(crate) const fn full_scale_discharge_factors(self) -> [i64; 2] {
        match self {
            Variant::Npm1300 => [112, 100],
            Variant::Npm1304 => [415, 400],
        }
    }
}

/// Discharge limit codes of the nPM1300, indexed by
/// [`ChargerConfig::dischg_limit_idx`].
///
/// These are raw pre-scaled register codes for the discrete set of allowed
/// limits (200 mA, 1 A), not values resolved through a linear range.
pub(crate) const NPM1300_DISCHARGE_LIMITS: [u16; 2] = [84, 415];

/// VBUS input current limit steps: 100 mA to 1.5 A in 100 mA steps.
pub(crate) const VBUS_CURRENT_RANGE: LinearRange = LinearRange::new(100_000, 100_000, 1, 15);

/// Static charger configuration, programmed once by
/// [`blocking::Npm13xxCharger::init`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChargerConfig {
    pub variant: Variant,
    /// Termination voltage in microvolts; must land on a 50 mV step.
    pub term_microvolt: i32,
    /// Termination voltage in the warm temperature region.
    pub term_warm_microvolt: i32,
    /// Charge current limit in microamps, rounded down to the nearest step.
    pub current_microamp: i32,
    /// Discharge current limit in microamps, used for current scaling and
    /// echoed by [`Channel::MaxLoadCurrent`].
    pub dischg_limit_microamp: i32,
    /// Index into the discrete nPM1300 discharge limit table, or `None` on
    /// the nPM1304, which has no programmable discharge limit.
    pub dischg_limit_idx: Option<u8>,
    /// VBUS input current limit in microamps; must land on a 100 mA step.
    pub vbus_limit_microamp: i32,
    /// Nominal NTC resistance at 25 °C.
    pub thermistor_ohms: u32,
    /// NTC Beta coefficient.
    pub thermistor_beta: u16,
    /// NTC resistance selector; 0 means no thermistor is fitted and
    /// disables NTC monitoring.
    pub thermistor_idx: u8,
    /// Trickle voltage selector code.
    pub trickle_sel: u8,
    /// Termination current selector code.
    pub iterm_sel: u8,
    /// Enable charging at the end of initialization.
    pub charging_enable: bool,
    /// Allow charging from a low battery voltage.
    pub vbatlow_charge_enable: bool,
    /// Disable automatic recharge after termination.
    pub disable_recharge: bool,
    /// Cold/cool/warm/hot NTC thresholds in millidegrees Celsius; `None`
    /// leaves the corresponding threshold unprogrammed.
    pub temp_thresholds: [Option<i32>; 4],
    /// Die temperature stop/resume thresholds in millidegrees Celsius.
    pub dietemp_thresholds: [Option<i32>; 2],
}

/// Battery current status code reported in the ADC result block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IbatStatus {
    /// Battery is discharging into the system load.
    Discharge = 0x04,
    /// Trickle pre-charge phase.
    ChargeTrickle = 0x0C,
    /// Reduced-current charging in the cool temperature region.
    ChargeCool = 0x0D,
    /// Constant current/constant voltage charging.
    ChargeNormal = 0x0F,
}

impl Display for IbatStatus {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            IbatStatus::Discharge => write!(f, "Discharging"),
            IbatStatus::ChargeTrickle => write!(f, "Trickle charging"),
            IbatStatus::ChargeCool => write!(f, "Cool charging"),
            IbatStatus::ChargeNormal => write!(f, "Charging"),
        }
    }
}

bitflags! {
    /// Charge status register bits, as returned raw by
    /// [`Channel::ChargerStatus`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ChargeStatus: u8 {
        const BATTERY_DETECTED = 0x01;
        const COMPLETED = 0x02;
        const TRICKLE_CHARGE = 0x04;
        const CONSTANT_CURRENT = 0x08;
        const CONSTANT_VOLTAGE = 0x10;
        const RECHARGE = 0x20;
        const DIE_TEMP_HIGH_PAUSE = 0x40;
        const SUPPLEMENT_ACTIVE = 0x80;
    }
}

bitflags! {
    /// Charger error reason register bits, as returned raw by
    /// [`Channel::ChargerError`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ChargerErrorReason: u8 {
        const NTC_SENSOR = 0x01;
        const VBAT_SENSOR = 0x02;
        const VBAT_LOW = 0x04;
        const VTRICKLE = 0x08;
        const MEAS_TIMEOUT = 0x10;
        const CHARGE_TIMEOUT = 0x20;
        const TRICKLE_TIMEOUT = 0x40;
    }
}

bitflags! {
    /// VBUS status register bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct VbusStatus: u8 {
        const PRESENT = 0x01;
        const CURRENT_LIMITED = 0x02;
        const OVERVOLTAGE_PROTECTION = 0x04;
        const UNDERVOLTAGE = 0x08;
        const SUSPENDED = 0x10;
        const BUSOUT = 0x20;
    }
}

/// Measurement and configuration channels served by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    /// Battery voltage.
    BatteryVoltage,
    /// Battery temperature from the NTC thermistor.
    BatteryTemperature,
    /// Battery charge/discharge current.
    AverageCurrent,
    /// Raw charge status byte.
    ChargerStatus,
    /// Raw charger error reason byte.
    ChargerError,
    /// Programmed charge current limit; also the charge enable target of
    /// [`blocking::Npm13xxCharger::attr_set`].
    DesiredChargingCurrent,
    /// Programmed discharge current limit.
    MaxLoadCurrent,
    /// Die temperature of the PMIC.
    DieTemperature,
    /// Raw VBUS status byte.
    VbusStatus,
    /// VBUS input current, attribute access only.
    VbusCurrent,
}

/// Attributes accepted by the attribute accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Attribute {
    /// Runtime configuration of a channel.
    Configuration,
    /// Upper threshold the supply can deliver.
    UpperThreshold,
    VbusPresent,
    VbusCurrentLimited,
    VbusOvervoltageProtection,
    VbusUndervoltage,
    VbusSuspended,
    VbusBusout,
}

/// A channel or attribute reading in physical units.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Value {
    /// Voltage in millivolts.
    Millivolts(i32),
    /// Temperature in degrees Celsius.
    Celsius(f32),
    /// Temperature in millidegrees Celsius.
    Millidegrees(i32),
    /// Current in microamps.
    Microamps(i32),
    /// Raw chip-defined status byte.
    Status(u8),
    /// Boolean attribute state.
    Flag(bool),
}

pub(crate) mod adc;
pub mod blocking;
pub mod convert;
pub mod regs;
