use url::form_urlencoded;

use crate::{MediaType, SearchParams, DEFAULT_PAGE_SIZE};

const KEY_QUERY: &str = "q";
const KEY_TYPE: &str = "type";
const KEY_PAGE: &str = "page";
const KEY_PAGE_SIZE: &str = "page_size";
const KEY_LICENSE: &str = "license";
const KEY_CREATOR: &str = "creator";
const KEY_TAGS: &str = "tags";
const KEY_SOURCE: &str = "source";

/// Encode params as an address-bar query string (no leading `?`).
///
/// Fields equal to their default are omitted, so the default params encode to
/// the empty string. Key order is fixed.
pub fn encode(params: &SearchParams) -> String {
    let mut out = form_urlencoded::Serializer::new(String::new());
    if !params.query.is_empty() {
        out.append_pair(KEY_QUERY, &params.query);
    }
    if params.media_type != MediaType::default() {
        out.append_pair(KEY_TYPE, params.media_type.as_str());
    }
    if params.page != 1 {
        out.append_pair(KEY_PAGE, &params.page.to_string());
    }
    if params.page_size != DEFAULT_PAGE_SIZE {
        out.append_pair(KEY_PAGE_SIZE, &params.page_size.to_string());
    }
    for (key, value) in [
        (KEY_LICENSE, &params.license_type),
        (KEY_CREATOR, &params.creator),
        (KEY_TAGS, &params.tags),
        (KEY_SOURCE, &params.source),
    ] {
        if !value.is_empty() {
            out.append_pair(key, value);
        }
    }
    out.finish()
}

/// Decode an address-bar query string. A leading `?` is allowed.
/// - Missing keys take their defaults; unknown keys are ignored.
/// - A malformed or zero `page` becomes 1; a malformed `page_size` the default.
/// - An unknown `type` falls back to images.
/// - Repeated keys: the last one wins.
pub fn decode(query: &str) -> SearchParams {
    decode_onto(query, &SearchParams::default())
}

/// [`decode`] with `defaults` standing in for every missing or malformed key.
/// A malformed `page` still becomes 1.
pub fn decode_onto(query: &str, defaults: &SearchParams) -> SearchParams {
    let raw = query.trim().trim_start_matches('?');
    let mut params = defaults.clone().with_page(1);
    for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
        match key.as_ref() {
            KEY_QUERY => params.query = value.into_owned(),
            KEY_TYPE => params.media_type = value.parse().unwrap_or_default(),
            KEY_PAGE => {
                params.page = value
                    .trim()
                    .parse::<u32>()
                    .ok()
                    .filter(|p| *p >= 1)
                    .unwrap_or(1)
            }
            KEY_PAGE_SIZE => {
                params.page_size = value
                    .trim()
                    .parse::<u32>()
                    .ok()
                    .filter(|s| *s > 0)
                    .unwrap_or(defaults.page_size)
            }
            KEY_LICENSE => params.license_type = value.into_owned(),
            KEY_CREATOR => params.creator = value.into_owned(),
            KEY_TAGS => params.tags = value.into_owned(),
            KEY_SOURCE => params.source = value.into_owned(),
            _ => {}
        }
    }
    params
}

/// Query pairs for `GET /search`, using the backend's parameter names.
/// Empty optional filters are left out.
pub fn backend_pairs(params: &SearchParams) -> Vec<(&'static str, String)> {
    let mut pairs = vec![
        ("query", params.query.clone()),
        ("media_type", params.media_type.as_str().to_string()),
        ("page", params.page.max(1).to_string()),
        ("page_size", params.page_size.to_string()),
    ];
    for (key, value) in [
        ("license_type", &params.license_type),
        ("creator", &params.creator),
        ("tags", &params.tags),
        ("source", &params.source),
    ] {
        if !value.is_empty() {
            pairs.push((key, value.clone()));
        }
    }
    pairs
}
