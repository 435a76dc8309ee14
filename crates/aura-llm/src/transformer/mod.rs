//! Request/response shapes for the Generative Language REST API.

pub mod gemini;

pub use gemini::{
    build_generate_request, build_predict_request, parse_error_message,
    parse_generate_response, parse_predict_response,
};
