//! Collection-specific helpers built on [`HabitatClient`](crate::sdk::HabitatClient).

pub mod notes;
