//! # Herd Intake
//!
//! Livestock intake: collects a farmer's form answers and supporting
//! documents, extracts superficial facts from each document, scores the
//! result, and keeps the generated profiles in a local key-value store.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌────────────┐   ┌──────────────┐
//! │  Uploads    │──▶│   Pipeline    │──▶│  Insights  │──▶│ ProfileStore │
//! │ id/bank/... │   │ PDF/CSV/XLSX │   │  + Scorer  │   │  KV backend  │
//! └─────────────┘   └──────────────┘   └────────────┘   └──────┬───────┘
//!                                                              │
//!                                        ┌─────────────────────┤
//!                                        ▼                     ▼
//!                                   ┌──────────┐         ┌──────────┐
//!                                   │   CLI    │         │  Report  │
//!                                   │ (intake) │         │  (text)  │
//!                                   └──────────┘         └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! intake init
//! intake ingest --category bank statement.pdf ledger.csv
//! intake create --form form.json --bank statement.pdf --herd register.xlsx
//! intake list
//! intake report CER-2024-1706000000000-AB12 --output report.txt
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Document, insight and profile types |
//! | [`extract`] | PDF, CSV and spreadsheet extraction |
//! | [`traits`] | `Extractor` trait and registry |
//! | [`ingest`] | Per-category ingestion pipeline |
//! | [`session`] | Intake session and profile generation |
//! | [`store`] | Versioned profile store over a key-value backend |
//! | [`kv_sqlite`] | SQLite key-value backend |
//! | [`report`] | Plain-text profile report |
//! | [`profiles`] | List, get and delete commands |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema creation |

pub mod config;
pub mod db;
pub mod extract;
pub mod ingest;
pub mod kv_sqlite;
pub mod migrate;
pub mod profiles;
pub mod report;
pub mod session;
pub mod traits;

pub use herd_intake_core::{digest, form, insights, models, scoring, store};
