pub mod capture;
pub mod filter;
pub mod flow;
pub mod layers;
pub mod logging;
pub mod sniffer;

#[cfg(test)]
mod testutil;
