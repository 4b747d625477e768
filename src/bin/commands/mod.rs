pub mod convert_cmd;
pub mod dump_cmd;
pub mod input;

pub use convert_cmd::cmd_convert;
pub use dump_cmd::cmd_dump;
pub use input::InputArgs;
