mod action_handle;

pub use action_handle::*;
