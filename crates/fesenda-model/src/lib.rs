//! Data model for FeSenDA trace analysis: widgets, observed API calls,
//! exploration actions/states, and the sensitive-API signature list.

pub mod action;
pub mod api;
pub mod exploration;
pub mod sensitive;
pub mod widget;
