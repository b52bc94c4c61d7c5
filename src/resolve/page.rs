//! Strategies that scrape a web page for the newest version.

use anyhow::{Context, Result};
use regex::Regex;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

use crate::error::CheckError;
use crate::package::PackageSpec;

/// A version and the link it was found in.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct LinkMatch {
    pub version: String,
    pub href: String,
}

/// Apply `selector` to `body`, then `pattern` to the first text child of the
/// first matching node. All capture groups are joined with ".".
pub(super) fn version_from_selector(
    spec: &PackageSpec,
    url: &str,
    body: &str,
    selector: &Selector,
    pattern: &Regex,
) -> Result<String> {
    let document = Html::parse_document(body);

    let node = document
        .select(selector)
        .next()
        .ok_or_else(|| CheckError::Resolution {
            package: spec.name.clone(),
            reason: format!("no element on {} matches the selector", url),
        })?;

    let text = first_text(node).unwrap_or_default();

    let caps = pattern.captures(&text).ok_or_else(|| CheckError::Parse {
        package: spec.name.clone(),
        pattern: pattern.as_str().to_string(),
        output: text.clone(),
    })?;

    let version = caps
        .iter()
        .skip(1)
        .map(|m| m.map_or("", |m| m.as_str()))
        .collect::<Vec<_>>()
        .join(".");

    Ok(version)
}

fn first_text(node: ElementRef<'_>) -> Option<String> {
    node.children()
        .find_map(|child| child.value().as_text().map(|t| t.to_string()))
}

/// Scan hyperlinks in document order and return the first whose href yields
/// a non-empty first capture group. Relative hrefs are resolved against `url`.
pub(super) fn first_matching_link(url: &str, body: &str, pattern: &Regex) -> Result<Option<LinkMatch>> {
    let document = Html::parse_document(body);

    for node in document.root_element().descendants() {
        let Some(element) = ElementRef::wrap(node) else {
            continue;
        };
        if element.value().name() != "a" {
            continue;
        }
        let Some(href) = element.value().attr("href") else {
            continue;
        };

        let version = pattern
            .captures(href)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .filter(|v| !v.is_empty());

        if let Some(version) = version {
            return Ok(Some(LinkMatch {
                version: version.to_string(),
                href: absolute_url(url, href)?,
            }));
        }
    }

    Ok(None)
}

fn absolute_url(base: &str, href: &str) -> Result<String> {
    let base = Url::parse(base).with_context(|| format!("Invalid page URL {}", base))?;
    let joined = base
        .join(href)
        .with_context(|| format!("Invalid link {} on {}", href, base))?;
    Ok(joined.to_string())
}
