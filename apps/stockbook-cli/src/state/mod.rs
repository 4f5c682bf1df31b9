//! # State Module
//!
//! Process-wide state shared by the commands.
//!
//! Each concern gets its own state type, so a command's signature says
//! exactly what it touches.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────────┐  ┌──────────────────┐          │
//! │  │ ClientState  │  │ SelectionState   │  │   ConfigState    │          │
//! │  │              │  │                  │  │                  │          │
//! │  │ QueryClient  │  │ Arc<Mutex<       │  │ download_dir     │          │
//! │  │ (shared      │  │   Selected       │  │ page_size        │          │
//! │  │  cache)      │  │   Products>>     │  │                  │          │
//! │  └──────────────┘  └──────────────────┘  └──────────────────┘          │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • ClientState: the cache locks internally, clones share it            │
//! │  • SelectionState: Arc<Mutex<T>> for exclusive access                  │
//! │  • ConfigState: read-only after startup                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod client;
mod config;
mod selection;

pub use client::ClientState;
pub use config::ConfigState;
pub use selection::SelectionState;
