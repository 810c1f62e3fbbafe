pub mod dispatch_engine;
pub mod provider;
pub mod subscription_manager;
pub mod token_registry;

pub use dispatch_engine::*;
pub use provider::PushProvider;
pub use subscription_manager::*;
pub use token_registry::*;
