//! FeSenDA pipeline: confirmation of widget-API candidates by repeated
//! replay, enforcement evaluation under API blocking, differential
//! classification of exploration runs, and result persistence/reporting.

pub mod compare;
pub mod confirm;
pub mod enforce;
pub mod persist;
pub mod pipeline;
pub mod report;
pub mod summary;
