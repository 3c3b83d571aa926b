//! Resolution value object

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::shared::error::DomainError;

/// Frame size of a watchable media file, e.g. `1920x1080`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once('x')
            .ok_or_else(|| DomainError::InvalidInput(format!("invalid resolution: {s}")))?;
        let width = w
            .trim()
            .parse()
            .map_err(|_| DomainError::InvalidInput(format!("invalid resolution width: {s}")))?;
        let height = h
            .trim()
            .parse()
            .map_err(|_| DomainError::InvalidInput(format!("invalid resolution height: {s}")))?;
        Ok(Self { width, height })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_display() {
        let r = Resolution::new(1280, 760);
        assert_eq!(r.to_string(), "1280x760");
        assert_eq!("1280x760".parse::<Resolution>().unwrap(), r);
    }

    #[test]
    fn rejects_garbage() {
        assert!("1080p".parse::<Resolution>().is_err());
        assert!("x1080".parse::<Resolution>().is_err());
    }
}
