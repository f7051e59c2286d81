pub mod input;
pub mod output;

pub use input::Invocation;
pub use output::{Decision, HookOutput};
