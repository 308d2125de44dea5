//! Native module loading and invocation.
//!
//! - **library**: opening dependency libraries and the entry module
//! - **locator**: finding a module's load base in the current process
//! - **offset**: turning a base + configured offset into a checked entry point
//! - **call**: the raw foreign call and its argument marshaling
//! - **layout**: decoding the fixed-size output buffer
//! - **backend / invoker**: the signing capability and its lifecycle
//!
//! All unsafe code lives here. Callers normally only need [`NativeInvoker`].

mod backend;
mod call;
mod invoker;
pub mod layout;
mod library;
pub mod locator;
mod offset;

pub use backend::{InProcessBackend, NativeBackend, SignBackend, TestModeBackend};
pub use call::{RawSignFn, SignFunction};
pub use invoker::{InvokerSettings, MAX_INPUT_LIMIT, MAX_TIMEOUT_MS, NativeInvoker, ServiceState};
pub use layout::SignOutput;
pub use library::ModuleHandle;
pub use locator::{LoadedModule, find_base_address, loaded_modules};
pub use offset::{EntryPoint, MAX_ENTRY_ADDRESS, MIN_ENTRY_ADDRESS, compute_entry_point, parse_offset};
