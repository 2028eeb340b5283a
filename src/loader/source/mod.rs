/* src/loader/source/mod.rs */

mod file;
mod memory;

pub use file::FileSource;
pub use memory::MemorySource;
