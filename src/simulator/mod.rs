//! Local stand-in for the remote patient API.
//!
//! Serves a fixed dataset over `GET /patients` and injects the failures the
//! real service is known for (rate limiting, intermittent 5xx, alternate
//! response shapes), either randomly from a seeded RNG or scripted per page.
//! Used by end-to-end tests and by `RISKWATCH_SIMULATE=1` runs.

pub mod data;
pub mod router;
pub mod server;

pub use data::sample_patients;
pub use router::{simulator_router, Fault, SimulatorConfig, SimulatorState, MAX_PAGE_SIZE};
pub use server::{start_simulator, SimulatorError, SimulatorHandle};
