//! Shared test harness modules for the Pitwall CLI.

use super::*;

mod helpers;
mod unit;
