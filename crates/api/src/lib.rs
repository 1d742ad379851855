//! `stockbook-api` — HTTP surface for the inventory ledger service.

pub mod app;
