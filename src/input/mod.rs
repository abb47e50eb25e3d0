//! Unified input code space and per-frame polling
//!
//! ```text
//!  InputBackend ──pump/read──> PollingEngine ──FrameSnapshot──> InputCodeSpace
//!                                   ▲                               │
//!                  watch<Arc<RemapTable>> (RemapPublisher)      is_active(u16)
//! ```

pub mod backend;
pub mod code;
pub mod engine;
#[cfg(feature = "hardware")]
pub mod hardware;
pub mod keys;
pub mod remap;
pub mod space;
pub mod state;

pub use backend::{BackendError, InputBackend, ScriptedBackend};
pub use code::{DecodedCode, Direction, InputCode, JoystickControl, MouseAxis, MouseControl};
pub use engine::{PollingEngine, PollingSettings};
pub use keys::{find_key, key_name, KeyLookup};
pub use remap::{RemapPublisher, RemapTable};
pub use space::InputCodeSpace;
pub use state::{FrameSnapshot, HatState, JoystickSnapshot, KeyboardState, MouseSnapshot};
