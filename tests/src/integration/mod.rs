//! Cross-subsystem integration scenarios.

pub mod support;

#[cfg(test)]
mod activation_flows;
#[cfg(test)]
mod conservation;
#[cfg(test)]
mod crowdsale_flows;
#[cfg(test)]
mod exchange_flows;
