//! Argument direction with its integer wire encoding.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Direction of an argument relative to the native call.
///
/// Serialized as its integer wire code (`0 = in`, `1 = out`, `2 = inout`),
/// matching what the instrumentation script expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum Direction {
    In = 0,
    Out = 1,
    InOut = 2,
}

impl Serialize for Direction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*self))
    }
}

impl<'de> Deserialize<'de> for Direction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = u8::deserialize(deserializer)?;
        Direction::try_from(code)
            .map_err(|_| D::Error::custom(format!("invalid direction code {code}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_wire_codes() {
        assert_eq!(serde_json::to_string(&Direction::In).unwrap(), "0");
        assert_eq!(serde_json::to_string(&Direction::Out).unwrap(), "1");
        assert_eq!(serde_json::to_string(&Direction::InOut).unwrap(), "2");
    }

    #[test]
    fn direction_roundtrip() {
        for dir in [Direction::In, Direction::Out, Direction::InOut] {
            let json = serde_json::to_string(&dir).unwrap();
            assert_eq!(serde_json::from_str::<Direction>(&json).unwrap(), dir);
        }
    }

    #[test]
    fn invalid_code_is_rejected() {
        assert!(serde_json::from_str::<Direction>("7").is_err());
    }
}
