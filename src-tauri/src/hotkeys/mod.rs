// Hotkey bindings
//
// - chord: parsing and matching of persisted bindings like "ctrl + alt + k"
// - router: listens for chord-down events and plays the bound clips

pub mod chord;
pub mod router;

pub use chord::{normalize_binding, Chord, CHORD_SEPARATOR};
pub use router::{HotkeyRouter, Registration, HOTKEY_EVENT_CAPACITY};
