//! Blocking driver for the nPM13xx charger.

use embedded_hal::i2c::I2c;

use super::adc::{AdcResults, RESULTS_LEN};
use super::convert;
use super::regs::{adc, base, chgr, vbus};
use super::{
    Attribute, Channel, ChargeStatus, ChargerConfig, ChargerErrorReason, Error, Value, VbusStatus,
    NPM1300_DISCHARGE_LIMITS, VBUS_CURRENT_RANGE,
};
use crate::linear_range::LinearRange;

/// Default 7-bit bus address of the nPM13xx.
pub const DEFAULT_ADDRESS: u8 = 0x6B;

/// Supply capability reported when CC1/CC2 indicate a high-power source.
const DETECT_HI_CURRENT_UA: i32 = 1_500_000;
/// Supply capability reported for a standard source.
const DETECT_LO_CURRENT_UA: i32 = 500_000;

/// Live sample state, replaced wholesale by a successful
/// [`Npm13xxCharger::sample_fetch`].
#[derive(Debug, Default, Clone, Copy)]
struct SampleState {
    voltage: u16,
    temp: u16,
    dietemp: u16,
    current: u16,
    status: u8,
    error: u8,
    ibat_stat: u8,
    vbus_stat: u8,
}

/// Register transport of the PMIC: every access addresses a register by a
/// (bank, offset) byte pair.
struct Npm13xxDevice<I2C> {
    i2c: I2C,
    addr: u8,
}

impl<I2C, E> Npm13xxDevice<I2C>
where
    I2C: I2c<Error = E>,
{
    fn reg_read(&mut self, bank: u8, offset: u8) -> Result<u8, Error<E>> {
        let mut buf = [0u8];
        self.i2c
            .write_read(self.addr, &[bank, offset], &mut buf)
            .map_err(Error::Bus)?;
        Ok(buf[0])
    }

    fn reg_read_burst(&mut self, bank: u8, offset: u8, buf: &mut [u8]) -> Result<(), Error<E>> {
        self.i2c
            .write_read(self.addr, &[bank, offset], buf)
            .map_err(Error::Bus)
    }

    fn reg_write(&mut self, bank: u8, offset: u8, data: u8) -> Result<(), Error<E>> {
        self.i2c
            .write(self.addr, &[bank, offset, data])
            .map_err(Error::Bus)
    }

    /// Writes `msb` to `offset` and `lsb` to `offset + 1` in one bus
    /// transaction.
    fn reg_write2(&mut self, bank: u8, offset: u8, msb: u8, lsb: u8) -> Result<(), Error<E>> {
        self.i2c
            .write(self.addr, &[bank, offset, msb, lsb])
            .map_err(Error::Bus)
    }

    /// Splits `value` into `lsb_bits` low bits and the remaining high bits
    /// and writes the pair at `offset`, `offset + 1`.
    fn write_split(
        &mut self,
        bank: u8,
        offset: u8,
        value: u16,
        lsb_bits: u8,
    ) -> Result<(), Error<E>> {
        let mask = (1u16 << lsb_bits) - 1;
        self.reg_write2(bank, offset, (value >> lsb_bits) as u8, (value & mask) as u8)
    }
}

/// nPM13xx charger driver.
///
/// One instance owns the bus handle and the cached sample; callers
/// serialize access through the `&mut self` receivers.
pub struct Npm13xxCharger<I2C> {
    dev: Npm13xxDevice<I2C>,
    config: ChargerConfig,
    data: SampleState,
}

impl<I2C, E> Npm13xxCharger<I2C>
where
    I2C: I2c<Error = E>,
{
    /// Creates a driver instance on the default PMIC address.
    pub fn new(i2c: I2C, config: ChargerConfig) -> Self {
        Self::with_address(i2c, DEFAULT_ADDRESS, config)
    }

    /// Creates a driver instance with an explicit 7-bit address.
    pub fn with_address(i2c: I2C, addr: u8, config: ChargerConfig) -> Self {
        Self {
            dev: Npm13xxDevice { i2c, addr },
            config,
            data: SampleState::default(),
        }
    }

    /// Consumes the driver and returns the owned bus instance.
    pub fn release(self) -> I2C {
        self.dev.i2c
    }

    /// Programs the complete charger configuration.
    ///
    /// The sequence runs in a fixed order and stops at the first transport
    /// error; registers programmed before the failure keep their values
    /// and the sequence is not retried, so a failed init leaves the
    /// device partially configured.
    pub fn init(&mut self) -> Result<(), Error<E>> {
        // Answering the status read proves the PMIC is on the bus.
        self.dev
            .reg_read(base::CHGR, chgr::CHG_STAT)
            .map_err(|_| Error::NoDevice)?;

        self.dev
            .reg_write(base::ADC, adc::NTCR_SEL, self.config.thermistor_idx)?;

        self.set_ntc_thresholds()?;
        self.set_dietemp_thresholds()?;

        // Termination voltages resolve against the stacked range windows
        // and must land exactly on a step.
        let ranges = self.config.variant.termination_voltage_ranges();
        let idx = LinearRange::group_win_index(
            &ranges,
            self.config.term_microvolt,
            self.config.term_microvolt,
        )
        .ok_or(Error::InvalidValue)?;
        self.dev.reg_write(base::CHGR, chgr::VTERM, idx as u8)?;

        let idx = LinearRange::group_win_index(
            &ranges,
            self.config.term_warm_microvolt,
            self.config.term_warm_microvolt,
        )
        .ok_or(Error::InvalidValue)?;
        self.dev.reg_write(base::CHGR, chgr::VTERM_R, idx as u8)?;

        // Charge current may round down to the next lower step, never up.
        let range = self.config.variant.charge_current_range();
        let idx = range
            .win_index(
                self.config.current_microamp - range.step + 1,
                self.config.current_microamp,
            )
            .ok_or(Error::InvalidValue)?;

        match self.config.dischg_limit_idx {
            None => {
                // The nPM1304 takes the charge current index as a single MSB.
                self.dev.reg_write(base::CHGR, chgr::ISET, idx as u8)?;
            }
            Some(table_idx) => {
                self.dev.write_split(base::CHGR, chgr::ISET, idx, 1)?;

                let code = NPM1300_DISCHARGE_LIMITS
                    .get(usize::from(table_idx))
                    .copied()
                    .ok_or(Error::InvalidValue)?;
                self.dev.write_split(base::CHGR, chgr::ISET_DISCHG, code, 1)?;
            }
        }

        let idx = VBUS_CURRENT_RANGE
            .win_index(
                self.config.vbus_limit_microamp,
                self.config.vbus_limit_microamp,
            )
            .ok_or(Error::InvalidValue)?;
        self.dev
            .reg_write(base::VBUS, vbus::ILIMSTARTUP, idx as u8)?;

        self.dev
            .reg_write(base::CHGR, chgr::TRICKLE_SEL, self.config.trickle_sel)?;
        self.dev
            .reg_write(base::CHGR, chgr::ITERM_SEL, self.config.iterm_sel)?;

        // Arm battery current measurement, then kick off the first
        // voltage/current and NTC/die conversions.
        self.dev.reg_write(base::ADC, adc::IBAT_EN, 1)?;
        self.dev.reg_write(base::ADC, adc::TASK_VBAT, 1)?;
        self.dev.reg_write2(base::ADC, adc::TASK_TEMP, 1, 1)?;

        // Automatic temperature measurements while charging.
        self.dev.reg_write(base::ADC, adc::TASK_AUTO, 1)?;

        if self.config.vbatlow_charge_enable {
            self.dev.reg_write(base::CHGR, chgr::VBATLOW_EN, 1)?;
        }

        let mut disable = 0;
        if self.config.disable_recharge {
            disable |= chgr::DIS_RECHARGE;
        }
        if self.config.thermistor_idx == 0 {
            disable |= chgr::DIS_NTC;
        }
        self.dev.reg_write(base::CHGR, chgr::DIS_SET, disable)?;

        if self.config.charging_enable {
            self.dev.reg_write(base::CHGR, chgr::EN_SET, 1)?;
        }

        Ok(())
    }

    fn set_ntc_thresholds(&mut self) -> Result<(), Error<E>> {
        let thresholds = self.config.temp_thresholds;
        let ohms = self.config.thermistor_ohms;
        let beta = self.config.thermistor_beta;

        for (idx, threshold) in thresholds.iter().enumerate() {
            if let Some(mdegc) = threshold {
                let resistance = convert::ntc_resistance(ohms, beta, *mdegc);
                let code = convert::ntc_code(resistance, ohms);

                self.dev
                    .write_split(base::CHGR, chgr::NTC_TEMPS + 2 * idx as u8, code, 2)?;
            }
        }

        Ok(())
    }

    fn set_dietemp_thresholds(&mut self) -> Result<(), Error<E>> {
        let thresholds = self.config.dietemp_thresholds;

        for (idx, threshold) in thresholds.iter().enumerate() {
            if let Some(mdegc) = threshold {
                let code = convert::die_temperature_code(*mdegc);

                self.dev
                    .write_split(base::CHGR, chgr::DIE_TEMPS + 2 * idx as u8, code, 2)?;
            }
        }

        Ok(())
    }

    /// Refreshes the cached sample from hardware.
    ///
    /// Also re-arms the next voltage/current and NTC/die conversions;
    /// the hardware converts asynchronously, so their results become
    /// visible on the following fetch.
    pub fn sample_fetch(&mut self) -> Result<(), Error<E>> {
        self.data.status = self.dev.reg_read(base::CHGR, chgr::CHG_STAT)?;
        self.data.error = self.dev.reg_read(base::CHGR, chgr::ERR_REASON)?;

        let mut buf = [0u8; RESULTS_LEN];
        self.dev.reg_read_burst(base::ADC, adc::RESULTS, &mut buf)?;

        let results = AdcResults::parse(&buf);
        self.data.voltage = results.vbat;
        self.data.temp = results.ntc;
        self.data.dietemp = results.die;
        self.data.current = results.ibat;
        self.data.ibat_stat = results.ibat_stat;

        self.dev.reg_write2(base::ADC, adc::TASK_TEMP, 1, 1)?;
        self.dev.reg_write(base::ADC, adc::TASK_VBAT, 1)?;

        self.data.vbus_stat = self.dev.reg_read(base::VBUS, vbus::STATUS)?;

        Ok(())
    }

    /// Projects one channel out of the cached sample and configuration.
    ///
    /// Performs no bus traffic; call [`sample_fetch`](Self::sample_fetch)
    /// first or the zero-initialized defaults are returned.
    pub fn channel_get(&self, chan: Channel) -> Result<Value, Error<E>> {
        match chan {
            Channel::BatteryVoltage => Ok(Value::Millivolts(convert::battery_voltage_millivolts(
                self.data.voltage,
            ))),
            Channel::BatteryTemperature => {
                if self.config.thermistor_idx == 0 {
                    return Err(Error::NotSupported);
                }
                Ok(Value::Celsius(convert::ntc_temperature(
                    self.config.thermistor_beta,
                    self.data.temp,
                )))
            }
            Channel::AverageCurrent => Ok(Value::Microamps(convert::battery_current_microamp(
                &self.config,
                self.data.current,
                self.data.ibat_stat,
            ))),
            Channel::ChargerStatus => Ok(Value::Status(self.data.status)),
            Channel::ChargerError => Ok(Value::Status(self.data.error)),
            Channel::DesiredChargingCurrent => Ok(Value::Microamps(self.config.current_microamp)),
            Channel::MaxLoadCurrent => Ok(Value::Microamps(self.config.dischg_limit_microamp)),
            Channel::DieTemperature => Ok(Value::Millidegrees(
                convert::die_temperature_millidegrees(self.data.dietemp),
            )),
            Channel::VbusStatus => Ok(Value::Status(self.data.vbus_stat)),
            Channel::VbusCurrent => Err(Error::NotSupported),
        }
    }

    /// Charge status flags decoded from the cached status byte.
    pub fn charge_status(&self) -> ChargeStatus {
        ChargeStatus::from_bits_truncate(self.data.status)
    }

    /// Error reason flags decoded from the cached error byte.
    pub fn error_reason(&self) -> ChargerErrorReason {
        ChargerErrorReason::from_bits_truncate(self.data.error)
    }

    /// VBUS status flags decoded from the cached VBUS byte.
    pub fn vbus_status(&self) -> VbusStatus {
        VbusStatus::from_bits_truncate(self.data.vbus_stat)
    }

    /// Reads one runtime attribute directly from hardware.
    pub fn attr_get(&mut self, chan: Channel, attr: Attribute) -> Result<Value, Error<E>> {
        match (chan, attr) {
            (Channel::DesiredChargingCurrent, Attribute::Configuration) => {
                let data = self.dev.reg_read(base::CHGR, chgr::EN_SET)?;
                Ok(Value::Flag(data != 0))
            }
            (Channel::VbusCurrent, Attribute::UpperThreshold) => {
                let detect = self.dev.reg_read(base::VBUS, vbus::DETECT)?;
                let microamp = if detect == 0 {
                    // No charger connected.
                    0
                } else if detect & vbus::DETECT_HI_MASK != 0 {
                    // CC1 or CC2 indicate 1.5 A or 3 A capability.
                    DETECT_HI_CURRENT_UA
                } else {
                    DETECT_LO_CURRENT_UA
                };
                Ok(Value::Microamps(microamp))
            }
            (Channel::VbusStatus, attr) => {
                let flag = match attr {
                    Attribute::VbusPresent => VbusStatus::PRESENT,
                    Attribute::VbusCurrentLimited => VbusStatus::CURRENT_LIMITED,
                    Attribute::VbusOvervoltageProtection => VbusStatus::OVERVOLTAGE_PROTECTION,
                    Attribute::VbusUndervoltage => VbusStatus::UNDERVOLTAGE,
                    Attribute::VbusSuspended => VbusStatus::SUSPENDED,
                    Attribute::VbusBusout => VbusStatus::BUSOUT,
                    _ => return Err(Error::NotSupported),
                };

                let status =
                    VbusStatus::from_bits_truncate(self.dev.reg_read(base::VBUS, vbus::STATUS)?);
                Ok(Value::Flag(status.contains(flag)))
            }
            _ => Err(Error::NotSupported),
        }
    }

    /// Writes one runtime attribute.
    ///
    /// `microamp` carries the requested current for both supported
    /// channels.
    pub fn attr_set(
        &mut self,
        chan: Channel,
        attr: Attribute,
        microamp: i32,
    ) -> Result<(), Error<E>> {
        if attr != Attribute::Configuration {
            return Err(Error::NotSupported);
        }

        match chan {
            Channel::DesiredChargingCurrent => {
                if microamp == 0 {
                    // Disable charging.
                    return self.dev.reg_write(base::CHGR, chgr::EN_CLR, 1);
                }

                // Clear any latched error first so it cannot block the
                // enable that follows.
                self.dev.reg_write(base::CHGR, chgr::ERR_CLR, 1)?;
                self.dev.reg_write(base::CHGR, chgr::EN_SET, 1)
            }
            Channel::VbusCurrent => {
                let idx = VBUS_CURRENT_RANGE
                    .win_index(microamp, microamp)
                    .ok_or(Error::InvalidValue)?;

                self.dev.reg_write(base::VBUS, vbus::ILIM, idx as u8)?;

                // Without the update trigger the chip only adopts the new
                // limit on the next USB removal.
                self.dev.reg_write(base::VBUS, vbus::ILIMUPDATE, 1)
            }
            _ => Err(Error::NotSupported),
        }
    }
}
