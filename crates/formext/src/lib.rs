//! # formext Architecture
//!
//! formext is a **coordination layer over a form page**. Form scripts address
//! fields by logical name; formext works out which attribute and which controls
//! that name means, fans the operation out, and folds the answers back into
//! one value.
//!
//! The page itself is never owned here. The host runtime owns the object
//! graph; formext sees it through the traits in [`page`] and holds it weakly.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Registry (registry.rs)                                     │
//! │  - One FormScript instance per form, host owned             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Thin facade over the coordinators                        │
//! │  - Returns structured Result types                          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Coordinators (context/*.rs)                                │
//! │  - Attributes, controls, display, section sync              │
//! │  - All the multi-control and state-machine logic            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Resolution (resolver.rs) over the Page traits (page/)      │
//! │  - Name → handle, with fallback and logging on a miss       │
//! │  - MemoryPage (tests, headless), host pages (production)    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Principle: Misses Are Not Errors
//!
//! Forms change under scripts all the time: a field is removed from one form
//! variant, a control is renamed. A name that resolves to nothing is logged at
//! `warn` and the call degrades to a safe default (`Null`, `false`, `""`, or a
//! no-op). `Err` is reserved for calls that can only be bugs in the script:
//! an empty name, an unsupported attribute type for section sync, an empty
//! template.
//!
//! ## Threading
//!
//! Everything is single-threaded and synchronous, like the page it drives.
//! Change handlers run in registration order and may call back into the
//! facade.
//!
//! ## Testing Strategy
//!
//! 1. **Coordinators** (`context/*.rs`): unit tests against
//!    [`page::memory::MemoryPage`]. Most of the testing lives here.
//! 2. **API** (`api.rs`): wiring and shared state.
//! 3. **Integration** (`tests/`): form scenarios end to end through the facade.
//!
//! ## Module Overview
//!
//! - [`api`]: The facade handed to form scripts
//! - [`context`]: Attribute, control, display and section coordinators
//! - [`resolver`]: Name resolution
//! - [`page`]: Page capability traits and the in-memory page
//! - [`registry`]: Per-form script instances
//! - [`model`]: Value types (`AttributeValue`, `EntityReference`, ...)
//! - [`equality`]: Change detection rules
//! - [`config`]: Configuration
//! - [`error`]: Error types

pub mod api;
pub mod config;
pub mod context;
pub mod equality;
pub mod error;
pub mod model;
pub mod page;
pub mod registry;
pub mod resolver;

pub use api::FormApi;
pub use config::FormConfig;
pub use context::SetVisibleOptions;
pub use error::{FormError, Result};
pub use model::{
    AttributeType, AttributeValue, EntityReference, OptionSetValue, RequiredLevel, SubmitMode,
    SubmitModeArg, ValueInput,
};
pub use page::{handler, ChangeEvent, ChangeHandler};
pub use registry::{FormRegistry, FormScript};
