mod domain;
pub use domain::*;

mod stream;
pub use stream::*;

mod error;
pub use error::ModelError;
