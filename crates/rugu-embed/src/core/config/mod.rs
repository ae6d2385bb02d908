pub mod model;
pub(crate) mod parse;
