//! Register map of the nPM13xx charger, ADC and VBUS blocks.
//!
//! The PMIC exposes its peripherals as register banks addressed by a
//! (base, offset) byte pair on the bus.

/// Register bank base addresses.
pub mod base {
    pub const CHGR: u8 = 0x03;
    pub const ADC: u8 = 0x05;
    pub const VBUS: u8 = 0x02;
}

/// Charger bank register offsets.
pub mod chgr {
    #![allow(dead_code)]

    pub const ERR_CLR: u8 = 0x00;
    pub const EN_SET: u8 = 0x04;
    pub const EN_CLR: u8 = 0x05;
    pub const DIS_SET: u8 = 0x06;
    pub const ISET: u8 = 0x08;
    pub const ISET_DISCHG: u8 = 0x0A;
    pub const VTERM: u8 = 0x0C;
    pub const VTERM_R: u8 = 0x0D;
    pub const TRICKLE_SEL: u8 = 0x0E;
    pub const ITERM_SEL: u8 = 0x0F;
    /// First of four NTC threshold MSB/LSB pairs, spaced 2 apart.
    pub const NTC_TEMPS: u8 = 0x10;
    /// First of two die temperature threshold MSB/LSB pairs.
    pub const DIE_TEMPS: u8 = 0x18;
    pub const CHG_STAT: u8 = 0x34;
    pub const ERR_REASON: u8 = 0x36;
    pub const VBATLOW_EN: u8 = 0x50;

    /// `DIS_SET` bit disabling automatic recharge.
    pub const DIS_RECHARGE: u8 = 1 << 0;
    /// `DIS_SET` bit disabling NTC temperature monitoring.
    pub const DIS_NTC: u8 = 1 << 1;
}

/// ADC bank register offsets.
pub mod adc {
    #![allow(dead_code)]

    pub const TASK_VBAT: u8 = 0x00;
    pub const TASK_TEMP: u8 = 0x01;
    pub const TASK_DIE: u8 = 0x02;
    pub const CONFIG: u8 = 0x09;
    pub const NTCR_SEL: u8 = 0x0A;
    pub const TASK_AUTO: u8 = 0x0C;
    /// Start of the 11-byte conversion result block.
    pub const RESULTS: u8 = 0x10;
    pub const IBAT_EN: u8 = 0x24;
}

/// VBUS bank register offsets.
pub mod vbus {
    #![allow(dead_code)]

    pub const ILIMUPDATE: u8 = 0x00;
    pub const ILIM: u8 = 0x01;
    pub const ILIMSTARTUP: u8 = 0x02;
    pub const DETECT: u8 = 0x05;
    pub const STATUS: u8 = 0x07;

    /// `DETECT` bits set when CC1/CC2 indicate a 1.5 A or 3 A capable supply.
    pub const DETECT_HI_MASK: u8 = 0x0A;
}
