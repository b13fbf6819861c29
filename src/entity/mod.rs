mod filament;

pub use filament::{ColorHex, FilamentDraft, FilamentRecord, MAX_REMAINING};
