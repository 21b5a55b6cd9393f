// crates/fastpred-cli/src/cmd/mod.rs

pub mod inspect;
pub mod pack_db;
pub mod pack_query;
pub mod screen;
