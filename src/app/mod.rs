// Application layer - Use case interactors

pub mod container;
pub mod credentials_interactor;
pub mod upload_interactor;

// Re-export interactors
pub use container::{AppContainer, DefaultAppContainer};
pub use credentials_interactor::CredentialsInteractor;
pub use upload_interactor::{UploadInteractor, UploadRequest};
