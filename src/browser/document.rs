//! Synchronous helpers over parsed documents
//!
//! `scraper::Html` is not `Send`, so every parse happens inside one of these
//! functions and only owned results cross an `.await`.

use crate::browser::ElementSnapshot;
use crate::HarvestError;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use url::Url;

/// A form submission resolved from the current document
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FormRequest {
    pub method: FormMethod,
    pub action: Url,
    pub fields: Vec<(String, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FormMethod {
    Get,
    Post,
}

pub(crate) fn parse_selector(selector: &str) -> Result<Selector, HarvestError> {
    Selector::parse(selector).map_err(|e| HarvestError::InvalidSelector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

/// Returns the element's text with runs of whitespace collapsed to one space
pub fn collapse_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Returns snapshots of every element in `html` matching `selector`
pub fn select_snapshots(html: &str, selector: &str) -> Result<Vec<ElementSnapshot>, HarvestError> {
    let selector = parse_selector(selector)?;
    let document = Html::parse_document(html);
    Ok(document
        .select(&selector)
        .map(ElementSnapshot::from_element)
        .collect())
}

/// Returns true if the document's visible text contains `phrase`
pub fn document_mentions(html: &str, phrase: &str) -> bool {
    let document = Html::parse_document(html);
    let text = collapse_text(&document.root_element());
    text.contains(phrase)
}

/// Resolves where activating the element matching `selector` leads
///
/// The element's own `href` wins, then the first link inside it.
pub(crate) fn link_target(html: &str, selector: &str, base: &Url) -> Result<Url, HarvestError> {
    let parsed = parse_selector(selector)?;
    let link = parse_selector("a[href]")?;
    let document = Html::parse_document(html);

    let element = document
        .select(&parsed)
        .next()
        .ok_or_else(|| HarvestError::ElementTimeout {
            selector: selector.to_string(),
        })?;

    let href = element
        .value()
        .attr("href")
        .or_else(|| {
            element
                .select(&link)
                .next()
                .and_then(|a| a.value().attr("href"))
        })
        .ok_or_else(|| HarvestError::UnsupportedAction {
            selector: selector.to_string(),
            action: "click".to_string(),
        })?;

    Ok(base.join(href.trim())?)
}

/// Returns the form field name of the input matching `selector`
pub(crate) fn input_name(html: &str, selector: &str) -> Result<String, HarvestError> {
    let parsed = parse_selector(selector)?;
    let document = Html::parse_document(html);

    let element = document
        .select(&parsed)
        .next()
        .ok_or_else(|| HarvestError::ElementTimeout {
            selector: selector.to_string(),
        })?;

    let value = element.value();
    if !matches!(value.name(), "input" | "textarea") {
        return Err(HarvestError::UnsupportedAction {
            selector: selector.to_string(),
            action: "fill".to_string(),
        });
    }

    value
        .attr("name")
        .or_else(|| value.attr("id"))
        .map(str::to_string)
        .ok_or_else(|| HarvestError::UnsupportedAction {
            selector: selector.to_string(),
            action: "fill".to_string(),
        })
}

/// Builds the request for submitting the form enclosing `selector`
///
/// Field values come from the document, overridden by `filled`.
pub(crate) fn form_request(
    html: &str,
    selector: &str,
    base: &Url,
    filled: &HashMap<String, String>,
) -> Result<FormRequest, HarvestError> {
    let parsed = parse_selector(selector)?;
    let fields_selector = parse_selector("input[name], textarea[name]")?;
    let document = Html::parse_document(html);

    let element = document
        .select(&parsed)
        .next()
        .ok_or_else(|| HarvestError::ElementTimeout {
            selector: selector.to_string(),
        })?;

    let form = if element.value().name() == "form" {
        element
    } else {
        element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|a| a.value().name() == "form")
            .ok_or_else(|| HarvestError::UnsupportedAction {
                selector: selector.to_string(),
                action: "submit".to_string(),
            })?
    };

    let action = match form.value().attr("action").map(str::trim) {
        Some(action) if !action.is_empty() => base.join(action)?,
        _ => base.clone(),
    };

    let method = match form.value().attr("method") {
        Some(m) if m.eq_ignore_ascii_case("post") => FormMethod::Post,
        _ => FormMethod::Get,
    };

    let mut fields = Vec::new();
    for input in form.select(&fields_selector) {
        let value = input.value();
        let kind = value.attr("type").unwrap_or("text").to_ascii_lowercase();
        if matches!(kind.as_str(), "submit" | "button" | "image" | "reset" | "file") {
            continue;
        }
        if matches!(kind.as_str(), "checkbox" | "radio") && value.attr("checked").is_none() {
            continue;
        }

        let Some(name) = value.attr("name") else {
            continue;
        };
        let current = filled
            .get(name)
            .cloned()
            .unwrap_or_else(|| value.attr("value").unwrap_or_default().to_string());
        fields.push((name.to_string(), current));
    }

    // Inputs filled by id only still need to be sent
    for (name, current) in filled {
        if !fields.iter().any(|(n, _)| n == name) {
            fields.push((name.clone(), current.clone()));
        }
    }

    Ok(FormRequest {
        method,
        action,
        fields,
    })
}
