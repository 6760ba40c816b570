//! HTTP protocol implementation.
//!
//! This module implements the HTTP/1.x request-servicing pipeline for a
//! static document root.
//!
//! # Architecture
//!
//! The HTTP layer is organized into several submodules:
//!
//! - **`connection`**: The main connection handler implementing the request-response state machine
//! - **`parser`**: Parses incoming HTTP requests from byte buffers
//! - **`request`**: HTTP request representation and lookup utilities
//! - **`response`**: HTTP status codes and reason phrases
//! - **`io`**: Timeout-bounded send/recv primitives and chunked framing
//! - **`conditional`**: Conditional-request evaluation and entity tags
//! - **`handler`**: File streaming and directory listings
//! - **`mime`**: MIME type detection based on file extensions
//!
//! # Connection State Machine
//!
//! Each client connection goes through a state machine:
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Wait for incoming request data
//!        └──────┬──────┘
//!               │ Request received
//!               ▼
//!        ┌──────────────────┐
//!        │   Dispatching    │ ← Resolve path, run auth gate
//!        └──────┬───────────┘
//!               │ Decision ready
//!               ▼
//!        ┌──────────────────┐
//!        │   Responding     │ ← Stream exactly one response
//!        └──────┬───────────┘
//!               │ Connection: close
//!               ▼
//!        ┌──────────────────┐
//!        │    Closing       │
//!        └──────────────────┘
//! ```
//!
//! Persistent connections are deliberately unsupported; every response
//! carries `Connection: close` and the machine terminates after one
//! request.

pub mod conditional;
pub mod connection;
pub mod handler;
pub mod io;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
