pub mod envelope;

pub use envelope::ApiResponse;
