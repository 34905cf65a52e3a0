//! Site preferences exposed to the front-end, currently the ad slots.

use std::collections::BTreeMap;
use std::sync::Arc;

use popit_api_types::SitePreferenceView;

use crate::application::repos::{RepoError, SitePreferencesRepo};

const AD_SLOTS: [&str; 3] = ["top", "middle", "bottom"];

#[derive(Clone)]
pub struct PreferenceService {
    preferences: Arc<dyn SitePreferencesRepo>,
}

impl PreferenceService {
    pub fn new(preferences: Arc<dyn SitePreferencesRepo>) -> Self {
        Self { preferences }
    }

    /// Ad snippets for a display mode, keyed `ad.{mode}.{slot}`. Missing slots are omitted.
    pub async fn ads(
        &self,
        mode: &str,
    ) -> Result<BTreeMap<String, SitePreferenceView>, RepoError> {
        let mut ads = BTreeMap::new();
        for slot in AD_SLOTS {
            let key = format!("ad.{mode}.{slot}");
            if let Some(record) = self.preferences.find_by_name(&key).await? {
                ads.insert(
                    key,
                    SitePreferenceView {
                        id: record.id,
                        name: record.name,
                        value: record.value,
                    },
                );
            }
        }
        Ok(ads)
    }
}
