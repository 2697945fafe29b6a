use crate::error::BuildError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Clockwise page rotation in quarter turns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Rotation {
    #[default]
    None,
    Right, // 90° clockwise
    Down,  // 180°
    Left,  // 270° clockwise
}

impl Rotation {
    pub fn degrees(self) -> i64 {
        match self {
            Rotation::None => 0,
            Rotation::Right => 90,
            Rotation::Down => 180,
            Rotation::Left => 270,
        }
    }

    pub fn from_degrees(degrees: i64) -> Result<Self, BuildError> {
        match degrees {
            0 => Ok(Rotation::None),
            90 => Ok(Rotation::Right),
            180 => Ok(Rotation::Down),
            270 => Ok(Rotation::Left),
            other => Err(BuildError::InvalidRotation(other)),
        }
    }

    /// One more quarter turn clockwise, wrapping at 360.
    pub fn rotated(self) -> Self {
        match self {
            Rotation::None => Rotation::Right,
            Rotation::Right => Rotation::Down,
            Rotation::Down => Rotation::Left,
            Rotation::Left => Rotation::None,
        }
    }

    /// Add this rotation to an existing `/Rotate` value, normalised into [0, 360).
    pub fn apply_to(self, existing: i64) -> i64 {
        (existing + self.degrees()).rem_euclid(360)
    }
}

impl TryFrom<i64> for Rotation {
    type Error = BuildError;

    fn try_from(degrees: i64) -> Result<Self, Self::Error> {
        Rotation::from_degrees(degrees)
    }
}

impl From<Rotation> for i64 {
    fn from(rotation: Rotation) -> Self {
        rotation.degrees()
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.degrees())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_four_turns_return_to_zero() {
        let mut rotation = Rotation::None;
        let mut seen = Vec::new();
        for _ in 0..4 {
            rotation = rotation.rotated();
            seen.push(rotation.degrees());
        }
        assert_eq!(seen, vec![90, 180, 270, 0]);
        assert_eq!(rotation, Rotation::None);
    }

    #[test]
    fn test_from_degrees() {
        assert_eq!(Rotation::from_degrees(270).unwrap(), Rotation::Left);
        assert!(matches!(
            Rotation::from_degrees(45),
            Err(BuildError::InvalidRotation(45))
        ));
        assert!(Rotation::from_degrees(360).is_err());
    }

    #[test]
    fn test_apply_to_existing_rotation() {
        assert_eq!(Rotation::Right.apply_to(0), 90);
        assert_eq!(Rotation::Right.apply_to(270), 0);
        assert_eq!(Rotation::Down.apply_to(270), 90);
        assert_eq!(Rotation::None.apply_to(-90), 270);
    }

    #[test]
    fn test_serde_as_integer() {
        assert_eq!(serde_json::to_string(&Rotation::Down).unwrap(), "180");
        let r: Rotation = serde_json::from_str("90").unwrap();
        assert_eq!(r, Rotation::Right);
        assert!(serde_json::from_str::<Rotation>("45").is_err());
    }
}
