//! Read-only professional profile content consumed by section renderers

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct GalleryImage {
    pub url: String,
    pub caption: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct Location {
    pub label: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct OpeningHours {
    pub day: String,
    pub open: Option<String>,
    pub close: Option<String>,
}

impl OpeningHours {
    pub fn display(&self) -> String {
        match (&self.open, &self.close) {
            (Some(open), Some(close)) => format!("{} {}-{}", self.day, open, close),
            _ => format!("{} closed", self.day),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct SocialLink {
    pub platform: String,
    pub url: String,
}

/// Profile record supplied by the profile-data collaborator. The engine
/// never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfileData {
    pub name: String,
    pub title: Option<String>,
    pub bio: String,
    pub avatar_url: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub gallery: Vec<GalleryImage>,
    pub locations: Vec<Location>,
    pub hours: Vec<OpeningHours>,
    pub social: Vec<SocialLink>,
}
