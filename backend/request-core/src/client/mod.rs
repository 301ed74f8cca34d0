pub mod base;
pub mod ml;
pub mod ml_models;
pub mod model_type;
pub mod options;
pub mod response;
pub mod retry;

pub use base::{ApiClient, normalize_endpoint};
pub use ml::{MlClient, ml_endpoint};
pub use model_type::ModelType;
pub use options::RequestOptions;
pub use retry::{RetryPolicy, with_retry};
