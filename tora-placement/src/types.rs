// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Shared types.

use std::error::Error;
use std::fmt;

// Placement errors

#[macro_export]
/// Build a [PlacementError] result from a format string and arguments
macro_rules! placement_error {
    ($($arg:tt)+) => {
        Err($crate::types::PlacementError(format!($($arg)+)))
    };
}

/// The `PlacementError` is what should be returned in the case of an error
#[derive(Debug)]
pub struct PlacementError(pub String);

impl fmt::Display for PlacementError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Error: {}", self.0)
    }
}

impl Error for PlacementError {}

/// The PlacementResult is the return type for fallible placement functions
pub type PlacementResult<T> = Result<T, PlacementError>;
