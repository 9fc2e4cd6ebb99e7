// lib.rs - Ticket bot command pipeline
// Command catalog, permission-gated dispatch, help rendering and the Discord glue
// that feeds them. main.rs only wires these together.

pub mod command_ids;    // Command name -> Discord command id lookup
pub mod commands;       // Command model, catalog, eligibility, dispatch, help
pub mod config;         // botconfig.txt loading
pub mod discord;        // Serenity event handler and reply sinks
pub mod error;          // Error taxonomy
pub mod permission;     // Permission levels and resolvers
pub mod reply;          // Platform-neutral responses
pub mod reporting;      // Error reporting sink

#[cfg(test)]
pub(crate) mod testing;
