pub mod platform_traits;
pub mod registry_traits;

pub use platform_traits::ChatOutlet;
pub use registry_traits::{EndpointManager, RegistryStore};
