//! Store operations. Every function takes a live connection and performs
//! one logical query; callers decide about transactions.

pub mod activity;
pub mod currency;
pub mod favorites;
pub mod inquiries;
pub mod properties;
pub mod search_history;
pub mod users;
pub mod waves;
