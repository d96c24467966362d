mod bindings;
pub(crate) use bindings::*;

mod filesystem;
pub(crate) use filesystem::*;

mod platform;
pub(crate) use platform::*;
