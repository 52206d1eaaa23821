pub(crate) mod ascii_renderer;
pub(crate) mod bootstrap;
pub(crate) mod loop_runner;
