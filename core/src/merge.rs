//! Schema merging for command resolution and parser composition.
//!
//! Option schemas merge by name with the overlay winning; positional schemas
//! concatenate end to end. Neither function validates: callers re-run
//! [`validate_options`](crate::validate_options) /
//! [`validate_positionals`](crate::validate_positionals) on the result when
//! the inputs were not validated together.
//!
//! # Example
//!
//! ```
//! use argweave_core::*;
//!
//! let global = OptionsSchema::new().with("output", OptionDef::string());
//! let local = OptionsSchema::new().with("output", OptionDef::array(ItemKind::String));
//!
//! let merged = overlay_options(&global, &local);
//! assert!(merged.get("output").unwrap().kind.is_repeatable());
//! ```

use crate::{OptionsSchema, PositionalsSchema};

/// Overlays `overlay` on `base`; an option defined in both takes the
/// overlay's definition whole (aliases included).
pub fn overlay_options(base: &OptionsSchema, overlay: &OptionsSchema) -> OptionsSchema {
    let mut merged = base.clone();
    for (name, def) in overlay.iter() {
        merged.insert(name, def.clone());
    }
    merged
}

/// Appends `tail` after `head`.
pub fn concat_positionals(head: &PositionalsSchema, tail: &PositionalsSchema) -> PositionalsSchema {
    head.iter().chain(tail.iter()).cloned().collect()
}
