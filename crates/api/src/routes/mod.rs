pub mod crypto;
pub mod market;
pub mod news;
pub mod stocks;
