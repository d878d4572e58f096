//! # askdocs
//!
//! A retrieval-augmented question-answering assistant for local document
//! folders.
//!
//! askdocs ingests PDF, text, and markdown files into a persistent vector
//! collection, then answers questions by retrieving the nearest chunks and
//! synthesizing a grounded answer with a generative model. Queries run
//! through a tool-routing agent loop that can also evaluate arithmetic and
//! search the web.
//!
//! ## Architecture
//!
//! ```text
//! ingestion:  Loader -> Chunker -> Embeddings -> Vector Index (SQLite)
//!
//! query:      user message -> Router (agent loop)
//!                |- query_knowledge_base: Retrieve -> Format -> Synthesize
//!                |- evaluate_expression:  arithmetic parser
//!                '- web_search:           search provider
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! askdocs init                       # create the collection database
//! askdocs ingest ./data              # index a folder of pdf/txt/md files
//! askdocs query "What is the leave policy?"
//! askdocs ask "Summarize the report and compute 12*9"
//! askdocs status                     # collection health
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`models`] | Core data types |
//! | [`loader`] | Folder scanning and PDF/text extraction |
//! | [`chunk`] | Sliding-window text chunking |
//! | [`embedding`] | Embedding provider adapters and vector utilities |
//! | [`index`] | Persistent vector collection (rebuild, search, count) |
//! | [`retrieve`] | Top-k retrieval |
//! | [`context`] | Prompt-ready context formatting |
//! | [`synthesize`] | Grounded answer generation |
//! | [`provider`] | Chat model adapter |
//! | [`tools`] | Tool enumeration and handlers |
//! | [`calc`] | Arithmetic expression parser |
//! | [`websearch`] | Web search provider adapter |
//! | [`agent`] | Tool router / agent loop |
//! | [`ingest`] | Ingestion pipeline orchestration |

pub mod agent;
pub mod calc;
pub mod chunk;
pub mod config;
pub mod context;
pub mod db;
pub mod embedding;
pub mod error;
pub mod index;
pub mod ingest;
pub mod loader;
pub mod models;
pub mod provider;
pub mod retrieve;
pub mod synthesize;
pub mod tools;
pub mod websearch;
