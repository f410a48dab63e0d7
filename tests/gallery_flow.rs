//! Fetched records through normalization, filtering and layout

use adgallery::gallery::{self, Campaign, CampaignFilter, ReplayCounters, SizeFilter};
use adgallery::masonry::{pack, LayoutItem};
use adgallery::renderer::CreativeKind;

const ADS_JSON: &str = r#"[
  {"id":"a1","campaign_id":"c1","title":"Hero","ad_size":"300x250",
   "files":["https://cdn.test/ad-files/Spring/hero/index.html","https://cdn.test/ad-files/Spring/hero/backup.jpg"],
   "campaigns":{"name":"Spring"}},
  {"id":"a2","campaign_id":"c1","ad_size":"728x90",
   "files":["https://cdn.test/ad-files/Spring/leader.png"],
   "campaigns":[{"name":"Spring"}]},
  {"id":"a3","campaign_id":"c2","ad_size":"160x600","files":[],"campaigns":null},
  {"id":"a4","campaign_id":"c1","ad_size":"custom","files":["https://cdn.test/ad-files/Spring/odd.gif"]}
]"#;

fn campaigns() -> Vec<Campaign> {
    vec![
        Campaign {
            id: "c1".into(),
            name: "Spring".into(),
            share_token: Some("feedface".into()),
        },
        Campaign {
            id: "c2".into(),
            name: "Summer".into(),
            share_token: None,
        },
    ]
}

#[test]
fn dashboard_groups_and_previews() {
    let ads = gallery::parse_ads_json(ADS_JSON).unwrap();
    let campaigns = campaigns();

    let groups = gallery::group_by_campaign(&campaigns, &ads, &CampaignFilter::All);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].ads.len(), 3);

    let previews: Vec<_> = groups[0].ads.iter().filter_map(|ad| ad.creative_ref()).collect();
    assert_eq!(previews.len(), 3);
    assert_eq!(previews[0].kind(), CreativeKind::Document);
    assert_eq!(previews[1].kind(), CreativeKind::Image);

    // the summer ad has nothing to preview
    assert!(groups[1].ads[0].creative_ref().is_none());
}

#[test]
fn shared_view_filters_by_size_then_lays_out() {
    let ads = gallery::parse_ads_json(ADS_JSON).unwrap();
    let campaigns = campaigns();
    let shared = gallery::campaign_for_token(&campaigns, "feedface").unwrap();
    let campaign_ads: Vec<_> = ads.iter().filter(|a| a.campaign_id == shared.id).cloned().collect();

    let mut sizes = SizeFilter::from_ads(&campaign_ads);
    assert_eq!(sizes.available().collect::<Vec<_>>(), vec!["300x250", "728x90", "custom"]);
    sizes.toggle("728x90");

    let visible = sizes.apply(&campaign_ads);
    let items: Vec<LayoutItem> = visible.iter().map(|ad| ad.layout_item()).collect();
    let layout = pack(&items, 700, 10);

    // "custom" becomes a bare 300x250 card; 342 + 310 fits in 700
    assert_eq!(layout.ids(), vec![vec!["a1"], vec!["a4"]]);
}

#[test]
fn replay_changes_only_that_ads_key() {
    let ads = gallery::parse_ads_json(ADS_JSON).unwrap();
    let mut counters = ReplayCounters::default();
    let before: Vec<String> = ads.iter().map(|a| counters.render_key(&a.id)).collect();
    counters.bump("a2");
    let after: Vec<String> = ads.iter().map(|a| counters.render_key(&a.id)).collect();
    let changed: Vec<_> = before.iter().zip(&after).filter(|(b, a)| b != a).collect();
    assert_eq!(changed.len(), 1);
    assert_eq!(after[1], "a2-1");
}

#[test]
fn deletion_paths_come_from_public_urls() {
    let ads = gallery::parse_ads_json(ADS_JSON).unwrap();
    let paths: Vec<_> = ads[0]
        .files
        .iter()
        .filter_map(|f| gallery::storage_path(f, gallery::DEFAULT_BUCKET))
        .collect();
    assert_eq!(paths, vec!["Spring/hero/index.html", "Spring/hero/backup.jpg"]);
}
