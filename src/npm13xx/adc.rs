//! Decoder for the ADC conversion result block.
//!
//! One burst read starting at `adc::RESULTS` returns eleven bytes: the
//! battery current status, the MSBs of the battery voltage, NTC, die and
//! system voltage conversions, a shared LSB byte packing the low two bits
//! of the first three, two reserved bytes, the battery current and VBUS
//! MSBs and a second shared LSB byte. The system voltage and VBUS results
//! are not used by the charger.

const MSB_SHIFT: u8 = 2;
const LSB_MASK: u8 = 0x03;
const LSB_VBAT_SHIFT: u8 = 0;
const LSB_NTC_SHIFT: u8 = 2;
const LSB_DIE_SHIFT: u8 = 4;
const LSB_IBAT_SHIFT: u8 = 4;

/// Length of the result block in bytes.
pub(crate) const RESULTS_LEN: usize = 11;

/// Unpacked 10-bit conversion results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AdcResults {
    pub ibat_stat: u8,
    pub vbat: u16,
    pub ntc: u16,
    pub die: u16,
    pub ibat: u16,
}

fn get_res(msb: u8, lsb: u8, shift: u8) -> u16 {
    (u16::from(msb) << MSB_SHIFT) | u16::from((lsb >> shift) & LSB_MASK)
}

impl AdcResults {
    pub(crate) fn parse(buf: &[u8; RESULTS_LEN]) -> Self {
        let lsb_a = buf[5];
        let lsb_b = buf[10];

        Self {
            ibat_stat: buf[0],
            vbat: get_res(buf[1], lsb_a, LSB_VBAT_SHIFT),
            ntc: get_res(buf[2], lsb_a, LSB_NTC_SHIFT),
            die: get_res(buf[3], lsb_a, LSB_DIE_SHIFT),
            ibat: get_res(buf[8], lsb_b, LSB_IBAT_SHIFT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_result_block() {
        // lsb_a packs vbat=0b11, ntc=0b10, die=0b01; lsb_b packs ibat=0b11.
        let buf = [
            0x0F, // ibat_stat
            0xAB, // msb_vbat
            0x34, // msb_ntc
            0x56, // msb_die
            0xFF, // msb_vsys, unused
            0b0001_1011, // lsb_a
            0x00, 0x00, // reserved
            0x78, // msb_ibat
            0x9A, // msb_vbus, unused
            0b0011_0000, // lsb_b
        ];

        let results = AdcResults::parse(&buf);
        assert_eq!(results.ibat_stat, 0x0F);
        assert_eq!(results.vbat, (0xAB << 2) | 0b11);
        assert_eq!(results.ntc, (0x34 << 2) | 0b10);
        assert_eq!(results.die, (0x56 << 2) | 0b01);
        assert_eq!(results.ibat, (0x78 << 2) | 0b11);
    }

    #[test]
    fn test_parse_zeroed_block() {
        let results = AdcResults::parse(&[0; RESULTS_LEN]);
        assert_eq!(results.ibat_stat, 0);
        assert_eq!(results.vbat, 0);
        assert_eq!(results.ntc, 0);
        assert_eq!(results.die, 0);
        assert_eq!(results.ibat, 0);
    }
}
