//! Trigger binding lookups over the configuration tree.

pub mod binding_index;

pub use binding_index::{
    find_by_abbreviation, find_by_hotkey, find_duplicate_bindings, Binding, DuplicateBinding,
};
