//! Application descriptor assembly, generation and file I/O

mod assembly;
mod generate;
mod io;

pub use assembly::{AssembledModule, DescriptorAssembler};
pub use generate::DescriptorGenerator;
pub use io::{read_descriptor, read_template, write_descriptor};
