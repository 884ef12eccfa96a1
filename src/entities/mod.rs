pub mod entries;

pub use entries as entry_entity;
