//! Meeting-point server.
//!
//! A web application that answers: "we're starting from two different
//! addresses, which subway station should we meet at so neither of us
//! travels much longer than the other?"

pub mod amap;
pub mod cache;
pub mod domain;
pub mod planner;
pub mod provider;
pub mod web;
