// crates/canopen-rs/src/frame/emcy.rs

use crate::CanOpenError;
use crate::frame::codec::Codec;
use alloc::borrow::Cow;
use alloc::format;
use core::fmt;
use core::ops::BitOr;

/// Length of the manufacturer-specific field in an EMCY frame.
pub const EMCY_INFO_LEN: usize = 5;
/// EMCY frames always carry a full 8-byte payload.
pub const EMCY_FRAME_LEN: usize = 8;

// --- Error code constants (CiA 301, Table 26) ---
pub const EMCY_ERROR_RESET: u16 = 0x0000;
pub const EMCY_GENERIC: u16 = 0x1000;
pub const EMCY_CURRENT: u16 = 0x2000;
pub const EMCY_VOLTAGE: u16 = 0x3000;
pub const EMCY_TEMPERATURE: u16 = 0x4000;
pub const EMCY_HARDWARE: u16 = 0x5000;
pub const EMCY_SOFTWARE: u16 = 0x6000;
pub const EMCY_ADDITIONAL_MODULES: u16 = 0x7000;
pub const EMCY_MONITORING: u16 = 0x8000;
pub const EMCY_COMMUNICATION: u16 = 0x8100;
pub const EMCY_CAN_OVERRUN: u16 = 0x8110;
pub const EMCY_CAN_ERROR_PASSIVE: u16 = 0x8120;
pub const EMCY_HEARTBEAT: u16 = 0x8130;
pub const EMCY_BUS_OFF_RECOVERED: u16 = 0x8140;
pub const EMCY_CAN_ID_COLLISION: u16 = 0x8150;
pub const EMCY_PROTOCOL: u16 = 0x8200;
pub const EMCY_PDO_LENGTH: u16 = 0x8210;
pub const EMCY_PDO_LENGTH_EXCEEDED: u16 = 0x8220;
pub const EMCY_DAM_MPDO: u16 = 0x8230;
pub const EMCY_SYNC_LENGTH: u16 = 0x8240;
pub const EMCY_RPDO_TIMEOUT: u16 = 0x8250;
pub const EMCY_EXTERNAL: u16 = 0x9000;
pub const EMCY_ADDITIONAL_FUNCTIONS: u16 = 0xF000;
pub const EMCY_DEVICE_SPECIFIC: u16 = 0xFF00;

/// Sub-codes that are matched exactly. Checked before the class table.
const EXACT_DESCRIPTIONS: &[(u16, &str)] = &[
    (EMCY_CAN_OVERRUN, "CAN overrun (objects lost)"),
    (EMCY_CAN_ERROR_PASSIVE, "CAN in error passive mode"),
    (EMCY_HEARTBEAT, "Life guard error or heartbeat error"),
    (EMCY_BUS_OFF_RECOVERED, "Recovered from bus off"),
    (EMCY_CAN_ID_COLLISION, "CAN-ID collision"),
    (EMCY_PDO_LENGTH, "PDO not processed due to length error"),
    (EMCY_PDO_LENGTH_EXCEEDED, "PDO length exceeded"),
    (EMCY_DAM_MPDO, "DAM MPDO not processed, destination object not available"),
    (EMCY_SYNC_LENGTH, "Unexpected SYNC data length"),
    (EMCY_RPDO_TIMEOUT, "RPDO timeout"),
];

/// Error classes keyed by the high byte of the code (`code & 0xFF00`).
const CLASS_DESCRIPTIONS: &[(u16, &str)] = &[
    (EMCY_ERROR_RESET, "Error reset or no error"),
    (EMCY_GENERIC, "Generic error"),
    (EMCY_CURRENT, "Current"),
    (0x2100, "Current, device input side"),
    (0x2200, "Current inside the device"),
    (0x2300, "Current, device output side"),
    (EMCY_VOLTAGE, "Voltage"),
    (0x3100, "Mains voltage"),
    (0x3200, "Voltage inside the device"),
    (0x3300, "Output voltage"),
    (EMCY_TEMPERATURE, "Temperature"),
    (0x4100, "Ambient temperature"),
    (0x4200, "Device temperature"),
    (EMCY_HARDWARE, "Device hardware"),
    (EMCY_SOFTWARE, "Device software"),
    (0x6100, "Internal software"),
    (0x6200, "User software"),
    (0x6300, "Data set"),
    (EMCY_ADDITIONAL_MODULES, "Additional modules"),
    (EMCY_MONITORING, "Monitoring"),
    (EMCY_COMMUNICATION, "Communication"),
    (EMCY_PROTOCOL, "Protocol error"),
    (EMCY_EXTERNAL, "External error"),
    (EMCY_ADDITIONAL_FUNCTIONS, "Additional functions"),
    (EMCY_DEVICE_SPECIFIC, "Device specific"),
];

/// Looks up the human-readable description of an EMCY error code.
/// An exact sub-code match always wins over its class.
pub fn describe_code(code: u16) -> Option<&'static str> {
    fn lookup(table: &[(u16, &'static str)], key: u16) -> Option<&'static str> {
        table.iter().find(|(k, _)| *k == key).map(|(_, d)| *d)
    }
    lookup(EXACT_DESCRIPTIONS, code).or_else(|| lookup(CLASS_DESCRIPTIONS, code & 0xFF00))
}

/// The error register (0x1001) as a type-safe bitmask.
/// (Reference: CiA 301, Section 7.5.2.2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ErrorRegister(pub u8);

impl ErrorRegister {
    // --- Flag Constants ---
    pub const GENERIC: Self = Self(1 << 0);
    pub const CURRENT: Self = Self(1 << 1);
    pub const VOLTAGE: Self = Self(1 << 2);
    pub const TEMPERATURE: Self = Self(1 << 3);
    pub const COMMUNICATION: Self = Self(1 << 4);
    pub const DEVICE_PROFILE: Self = Self(1 << 5);
    pub const MANUFACTURER: Self = Self(1 << 7);

    /// Checks if all of the specified flags are set.
    pub fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl BitOr for ErrorRegister {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

/// One emergency message as carried in an EMCY frame.
/// (Reference: CiA 301, Section 7.2.7.3.1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmcyMessage {
    pub code: u16,
    pub register: u8,
    /// Manufacturer-specific error field, zero-padded.
    pub info: [u8; EMCY_INFO_LEN],
}

impl EmcyMessage {
    /// Builds a message. `info` may be up to 5 bytes and is zero-padded;
    /// longer buffers are rejected, never truncated.
    pub fn new(code: u16, register: u8, info: Option<&[u8]>) -> Result<Self, CanOpenError> {
        let mut padded = [0u8; EMCY_INFO_LEN];
        if let Some(info) = info {
            if info.len() > EMCY_INFO_LEN {
                return Err(CanOpenError::ConfigurationError(
                    "EMCY info must not exceed 5 bytes",
                ));
            }
            padded[..info.len()].copy_from_slice(info);
        }
        Ok(Self {
            code,
            register,
            info: padded,
        })
    }

    /// Code little-endian at offset 0, register at 2, info at 3..8.
    pub fn encode(&self) -> [u8; EMCY_FRAME_LEN] {
        let mut buf = [0u8; EMCY_FRAME_LEN];
        buf[0..2].copy_from_slice(&self.code.to_le_bytes());
        buf[2] = self.register;
        buf[3..8].copy_from_slice(&self.info);
        buf
    }

    pub fn decode(payload: &[u8; EMCY_FRAME_LEN]) -> Self {
        let mut info = [0u8; EMCY_INFO_LEN];
        info.copy_from_slice(&payload[3..8]);
        Self {
            code: u16::from_le_bytes([payload[0], payload[1]]),
            register: payload[2],
            info,
        }
    }

    pub fn error_register(&self) -> ErrorRegister {
        ErrorRegister(self.register)
    }

    /// Description of the error code, or a hexadecimal fallback.
    pub fn description(&self) -> Cow<'static, str> {
        match describe_code(self.code) {
            Some(d) => Cow::Borrowed(d),
            None => Cow::Owned(format!("Unknown error (0x{:04X})", self.code)),
        }
    }
}

impl fmt::Display for EmcyMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

impl Codec for EmcyMessage {
    fn serialize(&self, buffer: &mut [u8]) -> Result<usize, CanOpenError> {
        if buffer.len() < EMCY_FRAME_LEN {
            return Err(CanOpenError::BufferTooShort);
        }
        buffer[..EMCY_FRAME_LEN].copy_from_slice(&self.encode());
        Ok(EMCY_FRAME_LEN)
    }

    fn deserialize(buffer: &[u8]) -> Result<Self, CanOpenError> {
        if buffer.len() < EMCY_FRAME_LEN {
            return Err(CanOpenError::BufferTooShort);
        }
        Ok(Self::decode(buffer[..EMCY_FRAME_LEN].try_into()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let msg = EmcyMessage::new(0x8130, 0x11, Some(&[0xAA, 0xBB])).unwrap();
        assert_eq!(msg.encode(), [0x30, 0x81, 0x11, 0xAA, 0xBB, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_decode_inverts_encode() {
        let messages = [
            EmcyMessage::new(0x0000, 0, None).unwrap(),
            EmcyMessage::new(0xFFFF, 0xFF, Some(&[1, 2, 3, 4, 5])).unwrap(),
            EmcyMessage::new(0x2310, ErrorRegister::CURRENT.0, Some(&[9])).unwrap(),
        ];
        for msg in messages {
            assert_eq!(EmcyMessage::decode(&msg.encode()), msg);
        }
    }

    #[test]
    fn test_info_is_zero_padded() {
        for len in 0..=EMCY_INFO_LEN {
            let info = [0xEEu8; EMCY_INFO_LEN];
            let msg = EmcyMessage::new(0x1000, 0, Some(&info[..len])).unwrap();
            assert!(msg.info[..len].iter().all(|b| *b == 0xEE));
            assert!(msg.info[len..].iter().all(|b| *b == 0));
        }
    }

    #[test]
    fn test_info_too_long_is_rejected() {
        for len in 6..=8 {
            let info = [0u8; 8];
            assert!(matches!(
                EmcyMessage::new(0x1000, 0, Some(&info[..len])),
                Err(CanOpenError::ConfigurationError(_))
            ));
        }
    }

    #[test]
    fn test_exact_code_wins_over_class() {
        assert_eq!(describe_code(0x8130), Some("Life guard error or heartbeat error"));
        assert_eq!(describe_code(0x8131), Some("Communication"));
        assert_eq!(describe_code(0x8240), Some("Unexpected SYNC data length"));
        assert_eq!(describe_code(0x8201), Some("Protocol error"));
        assert_eq!(describe_code(0x2345), Some("Current, device output side"));
        assert_eq!(describe_code(0x0001), Some("Error reset or no error"));
    }

    #[test]
    fn test_unknown_code_falls_back_to_hex() {
        let msg = EmcyMessage::new(0xA123, 0, None).unwrap();
        assert_eq!(msg.description(), "Unknown error (0xA123)");
        assert_eq!(alloc::string::ToString::to_string(&msg), "Unknown error (0xA123)");
    }

    #[test]
    fn test_codec_rejects_short_buffers() {
        assert_eq!(
            EmcyMessage::deserialize(&[0u8; 7]),
            Err(CanOpenError::BufferTooShort)
        );
        let msg = EmcyMessage::new(0x1000, 0, None).unwrap();
        let mut short = [0u8; 4];
        assert_eq!(msg.serialize(&mut short), Err(CanOpenError::BufferTooShort));
    }

    #[test]
    fn test_error_register_flags() {
        let mut reg = ErrorRegister::GENERIC | ErrorRegister::TEMPERATURE;
        assert_eq!(reg.0, 0b0000_1001);
        assert!(reg.contains(ErrorRegister::TEMPERATURE));
        reg.remove(ErrorRegister::TEMPERATURE);
        reg.insert(ErrorRegister::COMMUNICATION);
        assert_eq!(reg, ErrorRegister(0b0001_0001));
    }
}
