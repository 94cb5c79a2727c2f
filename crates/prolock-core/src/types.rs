use crate::{
    Result,
    constants::{MAX_UID_LENGTH, MIN_UID_LENGTH},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

/// Template slot number returned by the fingerprint sensor firmware.
pub type BiometricSlot = u16;

/// Proximity card UID (4-10 bytes, lowercase hex).
///
/// # Security
/// This type implements constant-time comparison so that comparing a
/// presented card against a known one does not leak timing information.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct CardUid(String);

impl CardUid {
    /// Create a card UID from its hexadecimal representation.
    ///
    /// The input is normalized (trimmed, separators removed, lowercased)
    /// before validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidCardUid` if:
    /// - The string contains non-hex characters
    /// - The decoded length is not between 4-10 bytes
    pub fn new(hex: &str) -> Result<Self> {
        let normalized: String = hex
            .trim()
            .chars()
            .filter(|c| !matches!(c, ':' | '-' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();

        if normalized.is_empty() || !normalized.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidCardUid(format!(
                "UID must be hexadecimal, got '{hex}'"
            )));
        }

        if normalized.len() % 2 != 0 {
            return Err(Error::InvalidCardUid(format!(
                "UID must contain whole bytes, got {} hex digits",
                normalized.len()
            )));
        }

        let bytes = normalized.len() / 2;
        if !(MIN_UID_LENGTH..=MAX_UID_LENGTH).contains(&bytes) {
            return Err(Error::InvalidCardUid(format!(
                "UID must be {MIN_UID_LENGTH}-{MAX_UID_LENGTH} bytes, got {bytes}"
            )));
        }

        Ok(CardUid(normalized))
    }

    /// Create a card UID from raw identifier bytes.
    ///
    /// # Errors
    /// Returns `Error::InvalidCardUid` if the length is not between 4-10 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
        CardUid::new(&hex)
    }

    /// Get the UID as a lowercase hex string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardUid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for CardUid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        CardUid::new(s)
    }
}

impl PartialEq for CardUid {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl std::hash::Hash for CardUid {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

/// Key under which the remote service files identities and attendance logs.
///
/// The primary factor is a fingerprint template slot; the secondary factor
/// is a proximity card UID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum IdentityKey {
    Biometric(BiometricSlot),
    Card(CardUid),
}

impl IdentityKey {
    /// Value of the `kind` query parameter for this key.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            IdentityKey::Biometric(_) => "fingerprint",
            IdentityKey::Card(_) => "card",
        }
    }

    /// The key rendered as a URL path segment.
    #[must_use]
    pub fn value(&self) -> String {
        match self {
            IdentityKey::Biometric(slot) => slot.to_string(),
            IdentityKey::Card(uid) => uid.as_str().to_string(),
        }
    }

    #[must_use]
    pub fn is_card(&self) -> bool {
        matches!(self, IdentityKey::Card(_))
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.value())
    }
}

/// A person resolved from a biometric or card reference.
///
/// Never cached beyond one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub key: IdentityKey,
    pub display_name: String,
}

impl Identity {
    pub fn new(key: IdentityKey, display_name: impl Into<String>) -> Self {
        Self {
            key,
            display_name: display_name.into(),
        }
    }
}

/// One attendance log entry as held by the remote service.
///
/// Blank and absent timestamps are both treated as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    #[serde(default)]
    pub time_in: Option<String>,
    #[serde(default)]
    pub time_out: Option<String>,
}

impl AttendanceRecord {
    pub fn new(time_in: Option<&str>, time_out: Option<&str>) -> Self {
        Self {
            time_in: time_in.map(str::to_string),
            time_out: time_out.map(str::to_string),
        }
    }

    /// Returns `true` if `time_in` is set and `time_out` is not.
    #[must_use]
    pub fn is_open(&self) -> bool {
        is_set(&self.time_in) && !is_set(&self.time_out)
    }
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// Door status reported to the remote door log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoorStatus {
    Open,
    Close,
}

impl DoorStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DoorStatus::Open => "open",
            DoorStatus::Close => "close",
        }
    }
}

impl fmt::Display for DoorStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operator-issued door command read from the remote door log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemoteDoorCommand {
    Unlock,
    Lock,
}

impl RemoteDoorCommand {
    /// Map a remote `action_type` to a command.
    ///
    /// Returns `None` for entries that are not operator commands (for
    /// example status lines the device posted itself).
    #[must_use]
    pub fn from_action_type(action_type: &str) -> Option<Self> {
        match action_type.trim() {
            "manual_unlock" => Some(RemoteDoorCommand::Unlock),
            "manual_lock" => Some(RemoteDoorCommand::Lock),
            _ => None,
        }
    }
}

impl fmt::Display for RemoteDoorCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RemoteDoorCommand::Unlock => write!(f, "Unlock"),
            RemoteDoorCommand::Lock => write!(f, "Lock"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("04ABCDEF", "04abcdef")]
    #[case("04:ab:cd:ef", "04abcdef")]
    #[case(" 0102030405060708090a ", "0102030405060708090a")]
    fn test_card_uid_valid(#[case] input: &str, #[case] expected: &str) {
        let uid = CardUid::new(input).unwrap();
        assert_eq!(uid.as_str(), expected);
    }

    #[rstest]
    #[case("")] // empty
    #[case("010203")] // 3 bytes, too short
    #[case("0102030405060708090a0b")] // 11 bytes, too long
    #[case("0102030")] // odd digit count
    #[case("zz010203")] // non-hex
    fn test_card_uid_invalid(#[case] input: &str) {
        assert!(CardUid::new(input).is_err());
    }

    #[test]
    fn test_card_uid_from_bytes() {
        let uid = CardUid::from_bytes(&[0x04, 0xAB, 0xCD, 0xEF]).unwrap();
        assert_eq!(uid.to_string(), "04abcdef");
        assert!(CardUid::from_bytes(&[0x01, 0x02]).is_err());
    }

    #[test]
    fn test_card_uid_equality_ignores_formatting() {
        let a = CardUid::new("04ABCDEF").unwrap();
        let b = CardUid::new("04:ab:cd:ef").unwrap();
        let c = CardUid::new("04abcdee").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_identity_key_rendering() {
        let finger = IdentityKey::Biometric(7);
        assert_eq!(finger.kind(), "fingerprint");
        assert_eq!(finger.value(), "7");
        assert_eq!(finger.to_string(), "fingerprint:7");

        let card = IdentityKey::Card(CardUid::new("04abcdef").unwrap());
        assert_eq!(card.kind(), "card");
        assert!(card.is_card());
        assert_eq!(card.to_string(), "card:04abcdef");
    }

    #[rstest]
    #[case(Some("08:00"), None, true)]
    #[case(Some("08:00"), Some(""), true)]
    #[case(Some("08:00"), Some("10:00"), false)]
    #[case(None, None, false)]
    #[case(Some(""), None, false)]
    #[case(Some("  "), None, false)]
    fn test_attendance_record_is_open(
        #[case] time_in: Option<&str>,
        #[case] time_out: Option<&str>,
        #[case] expected: bool,
    ) {
        assert_eq!(AttendanceRecord::new(time_in, time_out).is_open(), expected);
    }

    #[test]
    fn test_remote_door_command_mapping() {
        assert_eq!(
            RemoteDoorCommand::from_action_type("manual_unlock"),
            Some(RemoteDoorCommand::Unlock)
        );
        assert_eq!(
            RemoteDoorCommand::from_action_type("manual_lock"),
            Some(RemoteDoorCommand::Lock)
        );
        assert_eq!(RemoteDoorCommand::from_action_type("time_in"), None);
        assert_eq!(RemoteDoorCommand::from_action_type(""), None);
    }

    #[test]
    fn test_door_status_strings() {
        assert_eq!(DoorStatus::Open.as_str(), "open");
        assert_eq!(DoorStatus::Close.to_string(), "close");
    }
}
