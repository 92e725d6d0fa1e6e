//! Integration test driver for `tests/integration/`.
//!
//! Each `mod` below exercises the protocol core against the simulated
//! line in `mock_line`. All tests run on the host with no hardware.

mod codec_tests;
mod mock_line;
mod session_tests;
