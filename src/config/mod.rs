mod settings;

pub use settings::{
    Config, Layout, SimulatorConfig, TestCase, TomlConfig, ARCHIVE_ROOT, EXAMPLE_CONFIG,
};
