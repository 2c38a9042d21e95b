//! Card configuration: model, defaults, migration, merge and the store

pub mod defaults;
pub mod merge;
pub mod migrate;
pub mod model;
pub mod store;

pub use defaults::{default_card_config, default_props, default_styles};
pub use merge::{merge_with, merge_with_defaults, PartialCardConfig};
pub use migrate::{migrate, migrate_str, migrate_with_report, MigrationReport, SchemaShape};
pub use model::{
    CondensedCardConfig, CondensedCardDimensions, CondensedCardSectionInstance, CondensedCardStyles, CustomObject,
    DimensionPreset, DimensionUnit, DimensionValue, GradientStyle, PositionConfig, SectionType,
};
pub use store::{CardConfigService, CardStore, ConfigRepository, InMemoryRepository};
