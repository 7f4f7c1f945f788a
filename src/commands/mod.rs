pub mod action;
pub mod filter;
pub mod serve;
