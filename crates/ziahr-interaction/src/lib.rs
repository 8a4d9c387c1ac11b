//! Remote side of the ZiaHR client: the reqwest implementation of `HrApi`.

pub mod http_api;

pub use http_api::HttpHrApi;
