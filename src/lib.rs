pub mod abi;
pub mod client;
pub mod deployment;
pub mod gateway;
pub mod test_helpers;
pub mod ui;
pub mod view;
pub mod wallets;
