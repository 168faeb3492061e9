/*!
# Document Assistant Front-End

A web front-end for a document Q&A/search assistant, built in Rust.

## Overview

Users browse documents, ask free-text questions, view AI-generated prompts,
chat with search results, and export tabular/report data to spreadsheet files.
The service is mostly presentation glue: pages fetch data from backend
collaborator APIs, render it, and forward user actions. The two pieces with
real contracts are the response normalizer (reconciling the collaborators'
unstable payload shapes) and the tabular/report export pipeline.

## Architecture

- **HTTP layer**: axum router serving embedded HTML pages and a small JSON
  API consumed by those pages.
- **Collaborators**: opaque backend endpoints for agent listing, export
  population, prompt generation, and hybrid search, reached over reqwest.
  Their response shapes are not contractually fixed; the shape-tolerant
  modules absorb the variance.
- **Export**: in-memory workbook construction with rust_xlsxwriter, served
  as a client-side download; report exports push a PDF-named artifact to a
  remote store through the population endpoint.
- **Auth**: redirect-based OAuth against a single identity provider with an
  in-memory session map.

## Modules

- **agents**: tagged-union decode and normalization of agent-list payloads
- **export**: tabular export pipeline (worksheet shaping, XLSX bytes, HTML
  table rendering, demo dataset)
- **graph**: age-count histogram over the demo dataset
- **report**: remote report export flow and its status machine
- **backend**: HTTP client for the collaborator endpoints
- **prompts**: document prompt fetch and newline splitting
- **chat**: chat transcript over search results
- **auth**: OAuth redirect URL and session store
- **config**: environment-driven runtime configuration
- **app**: routing, shared state, and request handlers

## HTTP Endpoints

- `/`, `/search`, `/table` - served pages
- `/api/agents?scope=` - normalized agent list
- `/api/prompts?f=&n=` - suggested prompts for a document
- `/api/chat/send` - send a chat message, returns the transcript
- `/api/table`, `/api/table/export`, `/api/table/graph` - demo dataset, its
  XLSX download, and the age histogram
- `/api/report/export`, `/api/report/status`, `/api/report/cancel` - report
  export flow
- `/auth/signin`, `/auth/callback`, `/auth/signout` - OAuth hand-off
*/

pub mod agents;
pub mod app;
pub mod auth;
pub mod backend;
pub mod chat;
pub mod config;
pub mod export;
pub mod graph;
pub mod prompts;
pub mod report;

/// Re-export the core types so callers rarely need module paths
pub use agents::{RawAgentResponse, classify, normalize};
pub use backend::BackendClient;
pub use config::AppConfig;
pub use export::{TableRow, build_workbook, render_table_html, workbook_to_bytes};
pub use report::{ExportBackend, ExportJob, ExportStatus, ReportExporter, normalize_file_name};
