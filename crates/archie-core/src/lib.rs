pub mod plugin_system;
pub mod storage;
pub mod utils;

// Re-export key public types/traits for easier use by the binary and embedders
pub use plugin_system::{
    BaseEnhancer, Enhancer, ImportMap, ModuleConfig, ModuleLoader, ModuleManifest,
    PluginSystemError, ServiceDeclaration, ServiceEntry, ServiceMap, StaticModuleLoader,
};
pub use storage::read_manifest;
