//! elite-journal-store - ingests an Elite Dangerous journal into a queryable,
//! durable model of explored star systems, bodies, factions, missions, and
//! planned routes.

pub mod config;
pub mod error;
pub mod journal;
pub mod missions;
pub mod model;
pub mod orbital;
pub mod route;
pub mod session;
pub mod state_machine;
pub mod storage;
pub mod valuation;
