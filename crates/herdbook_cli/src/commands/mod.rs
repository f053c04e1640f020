pub(crate) mod cache;
pub(crate) mod jobs;
pub(crate) mod migrate;
pub(crate) mod run;
pub(crate) mod shared;
pub(crate) mod sync;
