//! One normalizer per kind of upstream schedule.

pub(crate) mod grid;
pub(crate) mod json_api;
mod relaxed;
pub(crate) mod script;
