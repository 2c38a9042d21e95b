//! Section kinds: typed props, profile content and the renderer registry

pub mod profile;
pub mod props;
pub mod registry;
pub mod renderers;

pub use profile::{GalleryImage, Location, OpeningHours, ProfileData, SocialLink};
pub use props::{merge_props, SectionProps, TextAlign};
pub use registry::{SectionContext, SectionRegistry, SectionRenderer};
