//! Error types.
//!
//! [`Loading`] marks transient unavailability: the data will most likely be
//! there on a later tick, so callers skip the work for this frame and keep
//! whatever they displayed before. Permanent absence is expressed with
//! `Option::None` instead.

use std::error::Error;
use std::{fmt, io};

/// Transient unavailability of map or session data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Loading {
  /// The map store is held by a writer.
  Busy,
  /// None of the session's loaded grids are known to the map store yet.
  NoMappedGrids,
  /// The tracked view has no loaded grid under it yet.
  NoView,
  /// The grid under the view has no map info yet.
  NoGridInfo,
  /// The grid's segment has not been stored yet.
  NoSegment,
}

impl fmt::Display for Loading {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Busy => write!(f, "map file is busy"),
      Self::NoMappedGrids => write!(f, "no mapped grids found"),
      Self::NoView => write!(f, "waiting for initial location"),
      Self::NoGridInfo => write!(f, "no grid info, probably coming soon"),
      Self::NoSegment => write!(f, "no segment info, probably coming soon"),
    }
  }
}

impl Error for Loading {}

/// Error loading a [`crate::MinimapConfig`].
#[derive(Debug)]
pub enum ConfigError {
  /// Config file could not be read.
  Io(io::Error),
  /// Config file is not valid TOML for the config schema.
  Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Io(e) => write!(f, "I/O error: {e}"),
      Self::Parse(e) => write!(f, "invalid minimap config: {e}"),
    }
  }
}

impl Error for ConfigError {
  fn source(&self) -> Option<&(dyn Error + 'static)> {
    match self {
      Self::Io(e) => Some(e),
      Self::Parse(e) => Some(e),
    }
  }
}

impl From<io::Error> for ConfigError {
  fn from(err: io::Error) -> Self {
    Self::Io(err)
  }
}

impl From<toml::de::Error> for ConfigError {
  fn from(err: toml::de::Error) -> Self {
    Self::Parse(err)
  }
}
