use std::sync::Arc;

use crate::application::embed::EmbedService;
use crate::application::posts::PostService;
use crate::application::preferences::PreferenceService;
use crate::application::repos::StoreHealth;
use crate::application::spotlight::SpotlightService;
use crate::config::ListingSettings;

#[derive(Clone)]
pub struct ApiState {
    pub posts: PostService,
    pub spotlight: Arc<SpotlightService>,
    pub preferences: PreferenceService,
    pub embed: EmbedService,
    pub listing: ListingSettings,
    pub store: Arc<dyn StoreHealth>,
}
