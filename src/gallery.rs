//! Host-side model of the gallery: normalizing fetched records, picking
//! which file to preview, grouping and filtering, per-ad view state and
//! share links.
//!
//! Everything here works on data the host already fetched; the crate never
//! talks to the database or object store itself.

use crate::masonry::LayoutItem;
use crate::renderer::CreativeRef;
use crate::size::AdSize;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Bucket creatives are uploaded into
pub const DEFAULT_BUCKET: &str = "ad-files";

/// Joined campaign as the data layer returns it: an object, a one-element
/// array, or nothing at all, depending on how the relation resolved.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CampaignJoin {
    One(CampaignName),
    Many(Vec<CampaignName>),
}

#[derive(Debug, Clone, Deserialize)]
pub struct CampaignName {
    #[serde(default)]
    pub name: Option<String>,
}

impl CampaignJoin {
    fn name(&self) -> Option<&str> {
        match self {
            CampaignJoin::One(c) => c.name.as_deref(),
            CampaignJoin::Many(cs) => cs.first().and_then(|c| c.name.as_deref()),
        }
    }
}

/// An ad record exactly as fetched
#[derive(Debug, Clone, Deserialize)]
pub struct RawAdRecord {
    pub id: String,
    #[serde(default)]
    pub campaign_id: Option<String>,
    #[serde(default, alias = "campaignName")]
    pub campaign_name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "adSize")]
    pub ad_size: Option<String>,
    #[serde(default)]
    pub files: Option<Vec<String>>,
    #[serde(default)]
    pub campaigns: Option<CampaignJoin>,
}

/// A normalized ad
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ad {
    pub id: String,
    pub campaign_id: String,
    pub campaign_name: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub ad_size: String,
    pub files: Vec<String>,
}

impl From<RawAdRecord> for Ad {
    fn from(raw: RawAdRecord) -> Self {
        let campaign_name = raw
            .campaigns
            .as_ref()
            .and_then(CampaignJoin::name)
            .map(str::to_string)
            .or(raw.campaign_name);
        Ad {
            id: raw.id,
            campaign_id: raw.campaign_id.unwrap_or_default(),
            campaign_name,
            title: raw.title.filter(|t| !t.trim().is_empty()),
            description: raw.description.filter(|d| !d.trim().is_empty()),
            ad_size: raw.ad_size.unwrap_or_default(),
            files: raw.files.unwrap_or_default(),
        }
    }
}

impl Ad {
    /// The file to preview: the first HTML entry point, else the first file.
    pub fn primary_file(&self) -> Option<&str> {
        self.files
            .iter()
            .find(|f| f.to_ascii_lowercase().ends_with(".html"))
            .or_else(|| self.files.first())
            .map(String::as_str)
    }

    /// `None` when the ad has no files ("No preview available")
    pub fn creative_ref(&self) -> Option<CreativeRef> {
        self.primary_file()
            .map(|f| CreativeRef::new(f, self.ad_size.clone()))
    }

    pub fn layout_item(&self) -> LayoutItem {
        LayoutItem::new(self.id.clone(), self.ad_size.clone())
    }

    pub fn size(&self) -> AdSize {
        AdSize::parse_or_default(&self.ad_size)
    }

    /// Move the ad into `campaign`.
    ///
    /// Returns `false`, leaving the ad untouched, when the campaign has no id
    /// or is the one the ad already belongs to; the host skips the write then.
    pub fn reassign(&mut self, campaign: &Campaign) -> bool {
        if campaign.id.is_empty() || campaign.id == self.campaign_id {
            return false;
        }
        log::debug!(
            "moving ad {} from campaign {} to {}",
            self.id,
            self.campaign_id,
            campaign.id
        );
        self.campaign_id = campaign.id.clone();
        self.campaign_name = Some(campaign.name.clone());
        true
    }
}

pub fn normalize_ads(raw: Vec<RawAdRecord>) -> Vec<Ad> {
    raw.into_iter().map(Ad::from).collect()
}

/// Decode a JSON array of ad records and normalize them.
pub fn parse_ads_json(json: &str) -> Result<Vec<Ad>> {
    let raw: Vec<RawAdRecord> = serde_json::from_str(json)?;
    Ok(normalize_ads(raw))
}

/// A campaign and its optional share token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub share_token: Option<String>,
}

/// Find the campaign a share link points at
pub fn campaign_for_token<'a>(campaigns: &'a [Campaign], token: &str) -> Option<&'a Campaign> {
    campaigns
        .iter()
        .find(|c| c.share_token.as_deref() == Some(token))
}

/// Which campaigns the dashboard shows
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CampaignFilter {
    #[default]
    All,
    Campaign(String),
}

impl CampaignFilter {
    pub fn matches(&self, ad: &Ad) -> bool {
        match self {
            CampaignFilter::All => true,
            CampaignFilter::Campaign(id) => ad.campaign_id == *id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CampaignGroup<'a> {
    pub campaign: &'a Campaign,
    pub ads: Vec<&'a Ad>,
}

/// Group ads under their campaigns, in campaign order.
///
/// With [`CampaignFilter::All`] campaigns without ads are skipped; a specific
/// campaign is returned even when empty, and nothing when it is unknown.
pub fn group_by_campaign<'a>(
    campaigns: &'a [Campaign],
    ads: &'a [Ad],
    filter: &CampaignFilter,
) -> Vec<CampaignGroup<'a>> {
    let ads_of = |campaign: &Campaign| -> Vec<&'a Ad> {
        ads.iter().filter(|ad| ad.campaign_id == campaign.id).collect()
    };
    match filter {
        CampaignFilter::All => campaigns
            .iter()
            .map(|campaign| CampaignGroup {
                campaign,
                ads: ads_of(campaign),
            })
            .filter(|group| !group.ads.is_empty())
            .collect(),
        CampaignFilter::Campaign(id) => campaigns
            .iter()
            .find(|c| c.id == *id)
            .map(|campaign| CampaignGroup {
                campaign,
                ads: ads_of(campaign),
            })
            .into_iter()
            .collect(),
    }
}

/// Size checkboxes on the shared campaign view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SizeFilter {
    available: BTreeSet<String>,
    selected: BTreeSet<String>,
}

impl SizeFilter {
    /// Every distinct size in `ads`, all selected
    pub fn from_ads<'a>(ads: impl IntoIterator<Item = &'a Ad>) -> Self {
        let available: BTreeSet<String> = ads.into_iter().map(|ad| ad.ad_size.clone()).collect();
        Self {
            selected: available.clone(),
            available,
        }
    }

    /// Sorted, deduplicated
    pub fn available(&self) -> impl Iterator<Item = &str> {
        self.available.iter().map(String::as_str)
    }

    pub fn is_selected(&self, size: &str) -> bool {
        self.selected.contains(size)
    }

    pub fn toggle(&mut self, size: &str) {
        if !self.selected.remove(size) && self.available.contains(size) {
            self.selected.insert(size.to_string());
        }
    }

    pub fn select_all(&mut self) {
        self.selected = self.available.clone();
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn apply<'a>(&self, ads: &'a [Ad]) -> Vec<&'a Ad> {
        ads.iter().filter(|ad| self.is_selected(&ad.ad_size)).collect()
    }
}

/// Replay presses per ad. Bumping the count changes the ad's render key,
/// which tells the host to remount its preview.
#[derive(Debug, Clone, Default)]
pub struct ReplayCounters {
    counts: HashMap<String, u32>,
}

impl ReplayCounters {
    pub fn bump(&mut self, ad_id: &str) -> u32 {
        let count = self.counts.entry(ad_id.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    pub fn get(&self, ad_id: &str) -> u32 {
        self.counts.get(ad_id).copied().unwrap_or(0)
    }

    pub fn render_key(&self, ad_id: &str) -> String {
        format!("{}-{}", ad_id, self.get(ad_id))
    }
}

/// Ads whose description panel is open
#[derive(Debug, Clone, Default)]
pub struct ExpandedSet {
    open: HashSet<String>,
}

impl ExpandedSet {
    /// Returns whether the panel is now open
    pub fn toggle(&mut self, ad_id: &str) -> bool {
        if self.open.remove(ad_id) {
            false
        } else {
            self.open.insert(ad_id.to_string());
            true
        }
    }

    pub fn is_open(&self, ad_id: &str) -> bool {
        self.open.contains(ad_id)
    }
}

/// A fresh share token: 24 random bytes, hex encoded
pub fn generate_share_token() -> String {
    hex::encode(rand::random::<[u8; 24]>())
}

/// Give `campaign` a share token if it has none, returning the token.
pub fn ensure_share_token(campaign: &mut Campaign) -> &str {
    campaign
        .share_token
        .get_or_insert_with(generate_share_token)
        .as_str()
}

pub fn share_url(origin: &str, token: &str) -> String {
    format!("{}/campaign/{}", origin.trim_end_matches('/'), token)
}

/// Fields of the upload form
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    pub campaign_name: String,
    pub ad_size: String,
    pub files: Vec<String>,
}

impl UploadForm {
    /// Check the form before anything is uploaded; returns the parsed size.
    pub fn validate(&self) -> Result<AdSize> {
        if self.campaign_name.trim().is_empty()
            || self.ad_size.trim().is_empty()
            || self.files.is_empty()
        {
            return Err(Error::Validation(
                "Please fill in all fields and select files to upload.".into(),
            ));
        }
        self.ad_size.parse::<AdSize>().map_err(|_| {
            Error::Validation(format!(
                "Ad size must look like 300x250, got {:?}",
                self.ad_size
            ))
        })
    }

    /// Object keys the files are uploaded under
    pub fn storage_keys(&self) -> Vec<String> {
        self.files
            .iter()
            .map(|file| format!("{}/{}", self.campaign_name, file))
            .collect()
    }
}

/// Object key of a public file URL inside `bucket`, used when deleting.
pub fn storage_path<'a>(file_url: &'a str, bucket: &str) -> Option<&'a str> {
    let marker = format!("/{}/", bucket);
    file_url
        .split_once(marker.as_str())
        .map(|(_, path)| path)
        .filter(|path| !path.is_empty())
}
