//! Event discovery from the public HTML listing.
//!
//! The listing is not an API; it is scraped for anchors that look like
//! links to a single event, and the upstream event id is recovered from
//! the link's query string.

use std::{collections::HashSet, sync::LazyLock};

use pitboard_core::source::DiscoveredEvent;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{ClientError, Result};

/// Substrings that mark an href as pointing at one event.
const EVENT_HREF_MARKERS: &[&str] =
  &["view_event", "?id=", "&id=", "tournament=", "/events/"];

static ANCHOR: LazyLock<Selector> =
  LazyLock::new(|| Selector::parse("a[href]").expect("anchor selector is valid"));

static ID_IN_URL: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"(?:id|tournament)=([0-9]{4,})").expect("id pattern is valid")
});

struct Anchor {
  href: String,
  text: String,
}

/// Every anchor with a non-blank href, entities already decoded.
fn anchors(document: &Html) -> Vec<Anchor> {
  document
    .select(&ANCHOR)
    .filter_map(|el| {
      let href = el.value().attr("href")?.trim();
      (!href.is_empty()).then(|| Anchor { href: href.to_owned(), text: anchor_text(el) })
    })
    .collect()
}

/// Text content of an anchor with whitespace collapsed.
fn anchor_text(el: ElementRef<'_>) -> String {
  el.text()
    .flat_map(str::split_whitespace)
    .collect::<Vec<_>>()
    .join(" ")
}

/// The upstream event id carried by an event URL.
///
/// The `tournament` query parameter wins over `id`; a URL whose parameters
/// do not parse falls back to a plain pattern match.
pub fn event_id_from_url(url: &Url) -> Option<i64> {
  let param = |name: &str| {
    url
      .query_pairs()
      .find(|(k, _)| k == name)
      .and_then(|(_, v)| v.trim().parse::<i64>().ok())
  };
  param("tournament")
    .or_else(|| param("id"))
    .or_else(|| {
      ID_IN_URL
        .captures(url.as_str())
        .and_then(|caps| caps[1].parse().ok())
    })
}

/// Every event link in `html`, resolved against `listing_url`.
///
/// Links are deduplicated by absolute URL and the listing page itself is
/// dropped. When any link carries an event id, only those are returned;
/// otherwise every anchor on the page is searched for an id, and failing
/// that the id-less links are returned as they are.
pub fn parse_listing(html: &str, listing_url: &str) -> Result<Vec<DiscoveredEvent>> {
  let base = Url::parse(listing_url).map_err(|source| ClientError::Url {
    url: listing_url.to_owned(),
    source,
  })?;
  let listing = base.as_str().trim_end_matches('/').to_owned();
  let anchors = anchors(&Html::parse_document(html));

  let mut seen = HashSet::new();
  let mut candidates = Vec::new();
  for anchor in &anchors {
    if !EVENT_HREF_MARKERS.iter().any(|m| anchor.href.contains(m)) {
      continue;
    }
    let Ok(url) = base.join(&anchor.href) else { continue };
    if url.as_str().trim_end_matches('/') == listing || !seen.insert(url.to_string()) {
      continue;
    }
    candidates.push(discovered(url, &anchor.text));
  }

  if candidates.iter().any(|e| e.id.is_some()) {
    candidates.retain(|e| e.id.is_some());
    return Ok(candidates);
  }

  let mut seen = HashSet::new();
  let fallback: Vec<_> = anchors
    .iter()
    .filter_map(|anchor| {
      let url = base.join(&anchor.href).ok()?;
      seen.insert(url.to_string()).then(|| discovered(url, &anchor.text))
    })
    .filter(|e| e.id.is_some())
    .collect();

  Ok(if fallback.is_empty() { candidates } else { fallback })
}

fn discovered(url: Url, text: &str) -> DiscoveredEvent {
  let id = event_id_from_url(&url);
  let url = url.to_string();
  let title = if text.is_empty() { url.clone() } else { text.to_owned() };
  DiscoveredEvent { title, url, id }
}

#[cfg(test)]
mod tests {
  use super::*;

  const LISTING: &str = "https://results.example.test/events/";

  #[test]
  fn id_prefers_tournament() {
    let url = Url::parse("https://x.test/r?id=11111&tournament=22222").unwrap();
    assert_eq!(event_id_from_url(&url), Some(22222));
  }

  #[test]
  fn id_from_pattern_when_params_unreadable() {
    let url = Url::parse("https://x.test/r?tournament=abc;id=477866").unwrap();
    assert_eq!(event_id_from_url(&url), Some(477866));
    let short = Url::parse("https://x.test/r?ref=id=12").unwrap();
    assert_eq!(event_id_from_url(&short), None);
  }

  #[test]
  fn listing_keeps_linked_events_with_ids() {
    let html = r#"
      <ul>
        <li><a href="/events/">All events</a></li>
        <li><a href="/results/?p=view_event&amp;id=477866"><b>Anaheim 1</b>
            <span>Jan 11</span></a></li>
        <li><a href='https://results.example.test/results/?p=view_event&id=477866'>dup</a></li>
        <li><a href="/events/archive">Archive</a></li>
        <li><a href="/about">About</a></li>
        <li><a href="/results/?tournament=480001"></a></li>
      </ul>"#;
    let events = parse_listing(html, LISTING).unwrap();

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].title, "Anaheim 1 Jan 11");
    assert_eq!(events[0].id, Some(477866));
    assert_eq!(
      events[0].url,
      "https://results.example.test/results/?p=view_event&id=477866"
    );
    assert_eq!(events[1].id, Some(480001));
    assert_eq!(events[1].title, events[1].url);
  }

  #[test]
  fn listing_without_ids_scans_all_anchors() {
    let html = r#"
      <a href="/events/season-2025">Season</a>
      <a href="/r/view?race=1&amp;rid=55555">Hidden</a>"#;
    let events = parse_listing(html, LISTING).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, Some(55555));
  }

  #[test]
  fn listing_without_any_ids_returns_candidates() {
    let html = r#"<a href="/events/season-2025">Season 2025</a>"#;
    let events = parse_listing(html, LISTING).unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, None);
    assert_eq!(events[0].title, "Season 2025");
  }

  #[test]
  fn titles_and_links_decode_every_entity() {
    let html = r#"
      <a href="/results/?p=view_event&amp;id=477866">Anaheim &#8211; 1</a>
      <a href="/results/?p=view_event&#38;id=477867">Rider&#x27;s Cup&nbsp;&amp; Co</a>
      <a href="/results/?id=477868&note=a>b">Arrow</a>"#;
    let events = parse_listing(html, LISTING).unwrap();

    assert_eq!(events.len(), 3);
    assert_eq!(events[0].title, "Anaheim \u{2013} 1");
    assert_eq!(
      events[1].url,
      "https://results.example.test/results/?p=view_event&id=477867"
    );
    assert_eq!(events[1].title, "Rider's Cup & Co");
    assert_eq!(events[2].id, Some(477868));
    assert_eq!(events[2].title, "Arrow");
  }

  #[test]
  fn bad_listing_url_is_an_error() {
    assert!(matches!(parse_listing("", "not a url"), Err(ClientError::Url { .. })));
  }
}
