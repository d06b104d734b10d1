pub mod config;
pub mod db;
pub mod error;
pub mod inference;
pub mod localizer;
pub mod pipeline;
pub mod routes;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;
