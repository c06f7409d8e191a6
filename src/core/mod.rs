//! Leaf types of the office: currencies, rates, the reserve, people,
//! requests and receipts.

pub mod currency;
pub mod party;
pub mod rates;
pub mod receipt;
pub mod request;
pub mod reserve;
