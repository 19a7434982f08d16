//! Conversions between raw ADC or threshold codes and physical units.
//!
//! The ADC reports 10-bit codes; thresholds are programmed as 10-bit
//! codes. Battery temperature follows the Beta model of the NTC
//! thermistor, die temperature an affine transfer function and battery
//! current a full-scale factor selected by the charge phase.

use libm::{exp, logf};

use super::{ChargerConfig, IbatStatus};

/// Die temperature transfer function constants.
const DIETEMP_OFFSET_MDEGC: i64 = 394_670;
const DIETEMP_FACTOR_MUL: i64 = 3_963_000;
const DIETEMP_FACTOR_DIV: i64 = 5_000;

/// Full-scale charge current is 125% of the programmed charge limit.
const FULL_SCALE_CHARGE_FACTORS: [i64; 2] = [125, 100];

/// 25 °C reference point of the Beta model, in Kelvin.
const T0_KELVIN: f32 = 298.15;
const KELVIN_OFFSET: f32 = 273.15;

/// Battery temperature in degrees Celsius from a 10-bit NTC code.
///
/// Callers must guarantee `1 <= code <= 1023`; the inversion divides by
/// the code and takes the logarithm of `1024 / code - 1`, so the result
/// is garbage outside that window.
pub fn ntc_temperature(beta: u16, code: u16) -> f32 {
    let log_result = logf(1024.0 / f32::from(code) - 1.0);
    let inv_temp_k = 1.0 / T0_KELVIN - log_result / f32::from(beta);

    1.0 / inv_temp_k - KELVIN_OFFSET
}

/// Die temperature in millidegrees Celsius from a 10-bit code.
pub fn die_temperature_millidegrees(code: u16) -> i32 {
    (DIETEMP_OFFSET_MDEGC - (i64::from(code) * DIETEMP_FACTOR_MUL) / DIETEMP_FACTOR_DIV) as i32
}

/// NTC resistance in ohms at `temp_mdegc`, forward Beta model.
pub fn ntc_resistance(thermistor_ohms: u32, beta: u16, temp_mdegc: i32) -> u32 {
    let inv_t0 = 1.0 / T0_KELVIN;
    let temp = temp_mdegc as f32 / 1000.0;
    let inv_temp_k = 1.0 / (temp + KELVIN_OFFSET);

    (f64::from(thermistor_ohms) * exp(f64::from(f32::from(beta) * (inv_temp_k - inv_t0)))) as u32
}

/// 10-bit threshold code for an NTC resistance.
pub fn ntc_code(resistance: u32, thermistor_ohms: u32) -> u16 {
    ((1024 * u64::from(resistance)) / (u64::from(resistance) + u64::from(thermistor_ohms))) as u16
}

/// 10-bit code for a die temperature threshold, rounded to the nearest
/// step rather than truncated.
pub fn die_temperature_code(threshold_mdegc: i32) -> u16 {
    let numerator = (DIETEMP_OFFSET_MDEGC - i64::from(threshold_mdegc)) * DIETEMP_FACTOR_DIV;

    ((numerator + DIETEMP_FACTOR_MUL / 2) / DIETEMP_FACTOR_MUL) as u16
}

/// Battery current in microamps from a 10-bit code.
///
/// The full scale depends on the charge phase: discharging scales the
/// discharge limit by the variant factors and reads negative, any
/// charging phase scales the charge limit by 125/100, and an unknown
/// status code reads as 0 µA.
pub fn battery_current_microamp(config: &ChargerConfig, code: u16, ibat_stat: u8) -> i32 {
    let full_scale_ua = match IbatStatus::try_from(ibat_stat) {
        Ok(IbatStatus::Discharge) => {
            let factors = config.variant.full_scale_discharge_factors();
            -i64::from(config.dischg_limit_microamp) * factors[0] / factors[1]
        }
        Ok(IbatStatus::ChargeTrickle) | Ok(IbatStatus::ChargeCool) | Ok(IbatStatus::ChargeNormal) => {
            i64::from(config.current_microamp) * FULL_SCALE_CHARGE_FACTORS[0]
                / FULL_SCALE_CHARGE_FACTORS[1]
        }
        Err(_) => 0,
    };

    (i64::from(code) * full_scale_ua / 1023) as i32
}

/// Battery voltage in millivolts from a 10-bit code.
pub fn battery_voltage_millivolts(code: u16) -> i32 {
    i32::from(code) * 5000 / 1024
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::npm13xx::Variant;

    const THERMISTOR_OHMS: u32 = 10_000;
    const THERMISTOR_BETA: u16 = 3380;

    fn config(variant: Variant) -> ChargerConfig {
        ChargerConfig {
            variant,
            term_microvolt: 4_150_000,
            term_warm_microvolt: 4_000_000,
            current_microamp: 150_000,
            dischg_limit_microamp: 1_000_000,
            dischg_limit_idx: Some(1),
            vbus_limit_microamp: 500_000,
            thermistor_ohms: THERMISTOR_OHMS,
            thermistor_beta: THERMISTOR_BETA,
            thermistor_idx: 1,
            trickle_sel: 0,
            iterm_sel: 0,
            charging_enable: true,
            vbatlow_charge_enable: false,
            disable_recharge: false,
            temp_thresholds: [None; 4],
            dietemp_thresholds: [None; 2],
        }
    }

    #[test]
    fn test_ntc_code_round_trip() {
        for code in (8..=1016).step_by(12) {
            let celsius = ntc_temperature(THERMISTOR_BETA, code);
            let mdegc = (celsius * 1000.0) as i32;
            let resistance = ntc_resistance(THERMISTOR_OHMS, THERMISTOR_BETA, mdegc);
            let recovered = ntc_code(resistance, THERMISTOR_OHMS);

            assert!(
                (i32::from(recovered) - i32::from(code)).abs() <= 1,
                "code {} round-tripped to {}",
                code,
                recovered
            );
        }
    }

    #[test]
    fn test_ntc_temperature_reference_point() {
        // Half scale means R == R0, which is 25 °C by definition.
        let celsius = ntc_temperature(THERMISTOR_BETA, 512);
        assert!((celsius - 25.0).abs() < 0.1);
        assert_eq!(ntc_code(THERMISTOR_OHMS, THERMISTOR_OHMS), 512);
    }

    #[test]
    fn test_die_temperature_from_code() {
        assert_eq!(die_temperature_millidegrees(0), 394_670);
        assert_eq!(die_temperature_millidegrees(512), -11_141);
        assert_eq!(die_temperature_millidegrees(1023), -416_159);
    }

    #[test]
    fn test_die_temperature_code_round_trip() {
        for code in [0u16, 466, 512, 1023] {
            let mdegc = die_temperature_millidegrees(code);
            assert_eq!(die_temperature_code(mdegc), code);
        }
    }

    #[test]
    fn test_battery_voltage() {
        assert_eq!(battery_voltage_millivolts(0), 0);
        assert_eq!(battery_voltage_millivolts(512), 2500);
        assert_eq!(battery_voltage_millivolts(1023), 4995);
        assert_eq!(battery_voltage_millivolts(1024), 5000);
    }

    #[test]
    fn test_battery_current_discharge_full_scale() {
        let config = config(Variant::Npm1300);
        assert_eq!(battery_current_microamp(&config, 1023, 0x04), -1_120_000);
        assert_eq!(battery_current_microamp(&config, 0, 0x04), 0);
    }

    #[test]
    fn test_battery_current_charge_phases() {
        let config = config(Variant::Npm1300);
        // Full scale is 125% of the 150 mA charge limit.
        for status in [0x0C, 0x0D, 0x0F] {
            assert_eq!(battery_current_microamp(&config, 1023, status), 187_500);
        }
        assert_eq!(battery_current_microamp(&config, 512, 0x0F), 93_841);
    }

    #[test]
    fn test_battery_current_unknown_status() {
        let config = config(Variant::Npm1300);
        assert_eq!(battery_current_microamp(&config, 1023, 0x00), 0);
        assert_eq!(battery_current_microamp(&config, 1023, 0xFF), 0);
    }

    #[test]
    fn test_battery_current_npm1304_factors() {
        let mut config = config(Variant::Npm1304);
        config.dischg_limit_microamp = 125_000;
        config.dischg_limit_idx = None;
        assert_eq!(battery_current_microamp(&config, 1023, 0x04), -129_687);
    }
}
