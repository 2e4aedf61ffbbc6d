//! Application layer: capability ports, the page processor and the batch scheduler.

pub mod error;
pub mod ports;
pub mod processor;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod testing;
