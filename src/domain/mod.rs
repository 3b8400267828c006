//! Domain layer: records, pure decision functions and the ports the
//! application layer drives.

pub mod audit;
pub mod eligibility;
pub mod event;
pub mod money;
pub mod payout;
pub mod ports;
pub mod provider;
pub mod routing;
