/// Remote generative-image service module
///
/// This module owns the single network boundary of the application:
/// one request/response call to the image editing service, with the
/// service's several failure modes normalized into one error type.

pub mod client;
