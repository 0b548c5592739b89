pub mod template;
pub mod template_sequence;

pub use template::*;
pub use template_sequence::*;
