//! Subcommands of the `sensu-handlers` binary.

pub mod filter;
pub mod handle;

pub use filter::FilterArgs;
pub use handle::HandleArgs;
