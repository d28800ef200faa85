//! Structural content scoring
//!
//! A fetched page is scored against two families of weighted signal groups:
//! product signals (purchase controls, variant pickers, prices, product
//! schema...) and collection signals (product grids, filters, pagination and
//! the number of product links on the page). Each group contributes its
//! weight at most once, when its first probe matches. The decision rule then
//! compares the two totals against configurable thresholds.

use crate::config::{ClassifierConfig, SignalWeights};
use crate::crawler::parser::resolve_link;
use crate::url::{same_authority, UrlPatternMatcher};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Product and collection totals for one page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassificationScore {
    pub product: u32,
    pub collection: u32,
}

impl ClassificationScore {
    pub fn new(product: u32, collection: u32) -> Self {
        Self {
            product,
            collection,
        }
    }
}

impl fmt::Display for ClassificationScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "product={} collection={}", self.product, self.collection)
    }
}

/// A single check against a parsed page
enum Probe {
    /// Free page text outside `<script>`, `<style>` and `<noscript>` matches
    Text(Regex),

    /// The text of a selected element matches
    ElementText { selector: Selector, pattern: Regex },

    /// More than `more_than` selected elements have a matching attribute
    Attr {
        selector: Selector,
        attrs: &'static [&'static str],
        pattern: Regex,
        more_than: usize,
    },

    /// At least one element is selected
    Present(Selector),
}

/// A parsed page plus its free text, built once per scoring pass
struct PageView<'a> {
    document: &'a Html,
    text: String,
}

impl Probe {
    fn matches(&self, page: &PageView<'_>) -> bool {
        match self {
            Probe::Text(pattern) => pattern.is_match(&page.text),
            Probe::ElementText { selector, pattern } => page
                .document
                .select(selector)
                .any(|element| pattern.is_match(inner_text(&element).trim())),
            Probe::Attr {
                selector,
                attrs,
                pattern,
                more_than,
            } => {
                page.document
                    .select(selector)
                    .filter(|element| {
                        attrs.iter().any(|name| {
                            element
                                .value()
                                .attr(name)
                                .is_some_and(|value| pattern.is_match(value))
                        })
                    })
                    .take(more_than + 1)
                    .count()
                    > *more_than
            }
            Probe::Present(selector) => page.document.select(selector).next().is_some(),
        }
    }
}

/// A named, weighted set of probes; the first matching probe awards the weight
struct SignalGroup {
    name: &'static str,
    weight: u32,
    probes: Vec<Probe>,
}

impl SignalGroup {
    fn new(name: &'static str, weight: u32, probes: Vec<Probe>) -> Self {
        Self {
            name,
            weight,
            probes,
        }
    }

    fn matches(&self, page: &PageView<'_>) -> bool {
        self.probes.iter().any(|probe| probe.matches(page))
    }
}

const CLASS_ID: &[&str] = &["class", "id"];

const CART_TEXT: &str =
    r"add\s+to\s+(cart|bag|basket)|buy\s+now|purchase\s+now|place\s+order|checkout\s+now";
const CART_ATTR: &str = r"add[\s_-]*to[\s_-]*(cart|bag|basket)|buy[\s_-]*now|purchase[\s_-]*now|place[\s_-]*order|checkout[\s_-]*now";
const VARIANT: &str = r"size|colou?r|variant|quantity";
const PINCODE: &str = r"pincode|zip\s*code|postal\s*code";
const CURRENCY: &str = r"(\$|€|£|₹|\bUSD|\bEUR|\bGBP|\bINR)\s*\d+(\.\d{2})?";

/// Compiles a built-in, case-insensitive signal pattern
fn ci(pattern: &str) -> Regex {
    Regex::new(&format!("(?i){}", pattern)).expect("built-in signal pattern compiles")
}

fn sel(selector: &str) -> Selector {
    Selector::parse(selector).expect("built-in selector parses")
}

fn text(pattern: &str) -> Probe {
    Probe::Text(ci(pattern))
}

fn element_text(selector: &str, pattern: &str) -> Probe {
    Probe::ElementText {
        selector: sel(selector),
        pattern: ci(pattern),
    }
}

fn attr(selector: &str, attrs: &'static [&'static str], pattern: &str) -> Probe {
    attr_count(selector, attrs, pattern, 0)
}

fn attr_count(
    selector: &str,
    attrs: &'static [&'static str],
    pattern: &str,
    more_than: usize,
) -> Probe {
    Probe::Attr {
        selector: sel(selector),
        attrs,
        pattern: ci(pattern),
        more_than,
    }
}

fn product_groups(weights: &SignalWeights) -> Vec<SignalGroup> {
    vec![
        SignalGroup::new(
            "add-to-cart",
            weights.add_to_cart,
            vec![
                element_text("button, a, input", CART_TEXT),
                attr("input[value]", &["value"], CART_TEXT),
                attr("[class], [id]", CLASS_ID, CART_ATTR),
            ],
        ),
        SignalGroup::new(
            "variant-selector",
            weights.variant_selector,
            vec![
                attr("select, div, ul", CLASS_ID, VARIANT),
                attr("select, input, button", &["name"], VARIANT),
                Probe::Present(sel(
                    "select[data-product], div[data-product], ul[data-product]",
                )),
                element_text("label", VARIANT),
            ],
        ),
        SignalGroup::new(
            "delivery-check",
            weights.delivery_check,
            vec![
                text(r"check\s+pincode|check\s+delivery|check\s+availability|delivery\s+to"),
                attr("input, div", &["placeholder", "class", "id"], PINCODE),
                attr("[aria-label]", &["aria-label"], PINCODE),
            ],
        ),
        SignalGroup::new(
            "payment-offers",
            weights.payment_offers,
            vec![
                text(r"bank\s+offer|payment\s+option|\bemi\b|credit\s+card|debit\s+card"),
                attr("div, section", CLASS_ID, r"offer|payment|\bemi\b"),
                attr("img[alt]", &["alt"], r"visa|mastercard|paypal|gpay|upi"),
            ],
        ),
        SignalGroup::new(
            "shipping-info",
            weights.shipping_info,
            vec![
                text(r"shipping|delivery|dispatch"),
                attr("div, section, p", CLASS_ID, r"shipping|delivery"),
            ],
        ),
        SignalGroup::new(
            "product-details",
            weights.product_details,
            vec![
                attr(
                    "div, section",
                    CLASS_ID,
                    r"product[-_]detail|specification|description",
                ),
                element_text(
                    "h2, h3, h4",
                    r"product\s+detail|specification|description|feature",
                ),
            ],
        ),
        SignalGroup::new(
            "price",
            weights.price,
            vec![
                attr("span, div, p", CLASS_ID, r"price|cost|mrp"),
                text(CURRENCY),
            ],
        ),
        SignalGroup::new(
            "reviews",
            weights.reviews,
            vec![
                attr("div, section", CLASS_ID, r"review|rating|star"),
                element_text("h2, h3, h4", r"review|rating|customer"),
            ],
        ),
        SignalGroup::new(
            "gallery",
            weights.gallery,
            vec![
                attr("div, ul", CLASS_ID, r"gallery|slider|product[-_]image"),
                attr_count("img[class]", &["class"], r"product|item", 2),
            ],
        ),
        SignalGroup::new(
            "product-schema",
            weights.product_schema,
            vec![Probe::ElementText {
                selector: sel(r#"script[type="application/ld+json"]"#),
                pattern: Regex::new(r#""@type"\s*:\s*"Product""#)
                    .expect("built-in signal pattern compiles"),
            }],
        ),
        SignalGroup::new(
            "wishlist",
            weights.wishlist,
            vec![
                text(r"wishlist|favou?rite|save\s+for\s+later"),
                attr("button, a", CLASS_ID, r"wishlist|favou?rite|heart"),
            ],
        ),
        SignalGroup::new(
            "stock-status",
            weights.stock_status,
            vec![
                text(r"in\s+stock|out\s+of\s+stock|\bavailable\b|unavailable"),
                attr("div, span", CLASS_ID, r"stock|availability"),
            ],
        ),
    ]
}

fn collection_groups(weights: &SignalWeights) -> Vec<SignalGroup> {
    vec![
        SignalGroup::new(
            "product-grid",
            weights.product_grid,
            vec![attr(
                "div, ul",
                CLASS_ID,
                r"product[-_]grid|product[-_]list|products",
            )],
        ),
        SignalGroup::new(
            "filters",
            weights.filters,
            vec![
                attr("div, form", CLASS_ID, r"filter|sort|facet"),
                attr("select", &["name"], r"sort|filter"),
                text(r"filter\s+by|sort\s+by"),
            ],
        ),
        SignalGroup::new(
            "pagination",
            weights.pagination,
            vec![
                attr("div, ul, nav", CLASS_ID, r"pagination|pager"),
                element_text(r#"a[class*="page"]"#, r"next|prev|previous|\d+"),
            ],
        ),
    ]
}

/// Concatenated text nodes, skipping script, style and noscript content
fn visible_text(document: &Html) -> String {
    let mut text = String::new();

    for node in document.root_element().descendants() {
        let Some(chunk) = node.value().as_text() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|e| matches!(e.name(), "script" | "style" | "noscript"))
        });

        if !hidden {
            text.push_str(chunk);
            text.push(' ');
        }
    }

    text
}

fn inner_text(element: &ElementRef<'_>) -> String {
    element.text().collect()
}

/// Scores pages and decides whether they are product pages
pub struct ContentClassifier {
    config: ClassifierConfig,
    matcher: Arc<UrlPatternMatcher>,
    product: Vec<SignalGroup>,
    collection: Vec<SignalGroup>,
    anchors: Selector,
}

impl ContentClassifier {
    /// Builds a classifier from configuration
    ///
    /// The pattern matcher's product table is used to count product links
    /// on the page.
    pub fn new(config: &ClassifierConfig, matcher: Arc<UrlPatternMatcher>) -> Self {
        Self {
            product: product_groups(&config.weights),
            collection: collection_groups(&config.weights),
            config: config.clone(),
            matcher,
            anchors: sel("a[href]"),
        }
    }

    /// Scores the HTML of `url`
    ///
    /// Malformed markup is parsed leniently; groups with no match add nothing.
    pub fn score(&self, html: &str, url: &Url) -> ClassificationScore {
        let document = Html::parse_document(html);
        self.score_document(&document, url)
    }

    /// Same as [`ContentClassifier::score`], over an already parsed document
    pub fn score_document(&self, document: &Html, url: &Url) -> ClassificationScore {
        let page = PageView {
            document,
            text: visible_text(document),
        };

        let mut score = ClassificationScore::default();
        let mut matched = Vec::new();

        for group in &self.product {
            if group.matches(&page) {
                score.product = score.product.saturating_add(group.weight);
                matched.push(group.name);
            }
        }

        for group in &self.collection {
            if group.matches(&page) {
                score.collection = score.collection.saturating_add(group.weight);
                matched.push(group.name);
            }
        }

        let product_links = self.count_product_links(document, url);
        if product_links > self.config.product_link_threshold as usize {
            let divisor = self.config.product_link_divisor.max(1) as usize;
            let bonus = u32::try_from(product_links / divisor).unwrap_or(u32::MAX);
            score.collection = score.collection.saturating_add(bonus);
        }

        tracing::trace!(
            url = %url,
            product = score.product,
            collection = score.collection,
            product_links,
            signals = ?matched,
            "Scored page"
        );

        score
    }

    /// Counts same-host links whose path matches the product table
    fn count_product_links(&self, document: &Html, url: &Url) -> usize {
        document
            .select(&self.anchors)
            .filter_map(|element| element.value().attr("href"))
            .filter_map(|href| resolve_link(href, url))
            .filter(|link| same_authority(link, url) && self.matcher.matches_product(link))
            .count()
    }

    /// Applies the decision rule; the first satisfied clause wins
    ///
    /// 1. `product >= high` and `product > collection`
    /// 2. `product >= mid` and `product >= 2 * collection`
    /// 3. the URL is a product candidate and `product >= low`
    pub fn decide(&self, score: ClassificationScore, is_product_candidate: bool) -> bool {
        let product = u64::from(score.product);
        let collection = u64::from(score.collection);

        (score.product >= self.config.high_threshold && product > collection)
            || (score.product >= self.config.mid_threshold && product >= 2 * collection)
            || (is_product_candidate && score.product >= self.config.low_threshold)
    }

    /// Scores a page and decides whether it is a product page
    pub fn classify_page(&self, html: &str, url: &Url) -> bool {
        let is_candidate = self.matcher.classify(url).is_product_candidate();
        let score = self.score(html, url);
        let is_product = self.decide(score, is_candidate);

        tracing::debug!(
            url = %url,
            product = score.product,
            collection = score.collection,
            is_product,
            "Classified page"
        );

        is_product
    }
}
